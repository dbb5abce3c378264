//! Token estimation and cost attribution.
//!
//! The token estimator is a deterministic heuristic, not a tokenizer: it
//! only feeds telemetry records and pre-flight window validation, so it
//! favors stability (appending text never lowers the estimate) over
//! per-model accuracy.

use once_cell::sync::Lazy;
use regex::Regex;

use sentinel_core::GatewayError;

/// Per-1k-token pricing for a known model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// USD per 1000 input tokens.
    pub input_per_1k: f64,
    /// USD per 1000 output tokens.
    pub output_per_1k: f64,
    /// Maximum combined input + output tokens the model accepts.
    pub context_window: u32,
}

/// Estimated cost for a single request.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CostEstimate {
    /// Input token count the estimate was computed from.
    pub input_tokens: u32,
    /// Output token count the estimate was computed from.
    pub output_tokens: u32,
    /// USD cost attributed to input tokens, rounded to 6 decimal places.
    pub input_cost: f64,
    /// USD cost attributed to output tokens, rounded to 6 decimal places.
    pub output_cost: f64,
    /// Total USD cost, rounded to 6 decimal places.
    pub total_cost: f64,
}

const GEMINI_15_PRO: ModelPricing = ModelPricing {
    input_per_1k: 0.001_25,
    output_per_1k: 0.002_5,
    context_window: 1_048_576,
};

const GEMINI_15_FLASH: ModelPricing = ModelPricing {
    input_per_1k: 0.000_075,
    output_per_1k: 0.000_3,
    context_window: 1_048_576,
};

const GEMINI_10_PRO: ModelPricing = ModelPricing {
    input_per_1k: 0.000_5,
    output_per_1k: 0.001_5,
    context_window: 30_720,
};

/// Looks up pricing for a model, falling back to the most expensive
/// known tier so unknown models are never under-billed.
#[must_use]
pub fn pricing_for(model: &str) -> ModelPricing {
    match model {
        "gemini-1.5-flash" => GEMINI_15_FLASH,
        "gemini-1.0-pro" => GEMINI_10_PRO,
        _ => GEMINI_15_PRO,
    }
}

// Indicators that the text is code rather than prose. Each one, once
// matched, keeps matching as text is appended, so the code classification
// never flips off and the estimate stays monotone.
static CODE_INDICATORS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"[{}();]",
        r"\b(?:fn|def|function|class|struct|impl)\s",
        r"\b(?:import|use|include|require)\s",
        r"=>|->|::|==|!=",
        r"```|`[^`]+`",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

fn looks_like_code(text: &str) -> bool {
    CODE_INDICATORS
        .iter()
        .filter(|re| re.is_match(text))
        .count()
        >= 2
}

/// Estimates the token count for a piece of text.
///
/// Takes the maximum of a word-based estimate (weighted up for code-like
/// text) and a character-based floor. Empty input estimates to zero, and
/// appending text never lowers the result.
#[must_use]
pub fn estimate_tokens(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    let words = text.split_whitespace().count() as f64;
    let chars = text.chars().count() as f64;

    let word_estimate = (words * 1.2).ceil();
    let char_floor = (chars / 4.0).ceil();
    let mut estimate = word_estimate.max(char_floor);
    if looks_like_code(text) {
        estimate = estimate.max((words * 1.5).ceil());
    }
    estimate as u32
}

fn round_usd(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Computes the USD cost of a request from its token counts.
#[must_use]
pub fn estimate_cost(model: &str, input_tokens: u32, output_tokens: u32) -> CostEstimate {
    let pricing = pricing_for(model);
    let input_cost = round_usd(f64::from(input_tokens) / 1000.0 * pricing.input_per_1k);
    let output_cost = round_usd(f64::from(output_tokens) / 1000.0 * pricing.output_per_1k);
    CostEstimate {
        input_tokens,
        output_tokens,
        input_cost,
        output_cost,
        total_cost: round_usd(input_cost + output_cost),
    }
}

/// Verifies that the estimated input plus the requested output budget
/// fits the model's context window.
pub fn validate_token_limits(
    model: &str,
    input_tokens: u32,
    max_output_tokens: u32,
) -> Result<(), GatewayError> {
    let window = pricing_for(model).context_window;
    let requested = u64::from(input_tokens) + u64::from(max_output_tokens);
    if requested > u64::from(window) {
        return Err(GatewayError::validation(
            format!(
                "request of {requested} tokens exceeds the {window}-token context window of {model}"
            ),
            Some("max_tokens".to_string()),
            "context_window_exceeded",
        ));
    }
    Ok(())
}
