//! The security analyzer.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::patterns::{PatternEntry, INJECTION_PATTERNS, PII_PATTERNS, PATTERN_TABLE_VERSION};
use crate::verdict::{SecurityFinding, SecurityVerdict};

/// Analyzer configuration, supplied by the configuration layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Evaluate injection patterns
    pub security_checks_enabled: bool,
    /// Evaluate PII patterns
    pub pii_detection_enabled: bool,
    /// Risk score at which a verdict is treated as an alert by consumers
    pub injection_threshold: f64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            security_checks_enabled: true,
            pii_detection_enabled: true,
            injection_threshold: 0.5,
        }
    }
}

/// Stateless screening engine over the static pattern tables.
///
/// Safe to share across any number of concurrent requests: the tables are
/// immutable after startup and each `analyze_*` call touches no shared
/// mutable state.
#[derive(Debug, Clone)]
pub struct SecurityAnalyzer {
    config: SecurityConfig,
}

impl SecurityAnalyzer {
    /// Create an analyzer with the given configuration
    #[must_use]
    pub fn new(config: SecurityConfig) -> Self {
        Self { config }
    }

    /// The configured alert threshold
    #[must_use]
    pub fn injection_threshold(&self) -> f64 {
        self.config.injection_threshold
    }

    /// Screen prompt text.
    ///
    /// Always returns a verdict: disabled screening, empty input, and any
    /// internal matching fault all degrade to an empty verdict rather than
    /// an error, because screening must never take down the request path.
    #[must_use]
    pub fn analyze_prompt(&self, text: &str) -> SecurityVerdict {
        self.scan(text, Direction::Prompt)
    }

    /// Screen response text. Same containment guarantees as
    /// [`Self::analyze_prompt`].
    #[must_use]
    pub fn analyze_response(&self, text: &str) -> SecurityVerdict {
        self.scan(text, Direction::Response)
    }

    /// Whether a verdict crosses the configured alert threshold.
    ///
    /// Thresholding is a consumer decision: the verdict itself always
    /// carries full detail.
    #[must_use]
    pub fn exceeds_threshold(&self, verdict: &SecurityVerdict) -> bool {
        verdict.injection_detected && verdict.risk_score >= self.config.injection_threshold
    }

    fn scan(&self, text: &str, direction: Direction) -> SecurityVerdict {
        if text.is_empty() {
            return SecurityVerdict::empty();
        }

        // Every applicable pattern is evaluated: no early exit, so that
        // pii_types is complete even after a high-confidence injection hit.
        let mut findings = Vec::new();

        if self.config.security_checks_enabled {
            Self::scan_table(&INJECTION_PATTERNS, text, direction, &mut findings);
        }
        if self.config.pii_detection_enabled {
            Self::scan_table(&PII_PATTERNS, text, direction, &mut findings);
        }

        let verdict = SecurityVerdict::from_findings(findings);

        if verdict.injection_detected {
            warn!(
                risk_score = verdict.risk_score,
                findings = verdict.findings.len(),
                table_version = PATTERN_TABLE_VERSION,
                "Injection patterns matched"
            );
        }
        if verdict.pii_detected {
            warn!(
                pii_types = verdict.pii_types.len(),
                "PII detected in {} text",
                direction
            );
        }
        if verdict.findings.is_empty() {
            debug!("No security findings");
        }

        verdict
    }

    fn scan_table(
        table: &[PatternEntry],
        text: &str,
        direction: Direction,
        findings: &mut Vec<SecurityFinding>,
    ) {
        for pattern in table {
            let applies = match direction {
                Direction::Prompt => pattern.scope.applies_to_prompt(),
                Direction::Response => pattern.scope.applies_to_response(),
            };
            if applies && pattern.regex.is_match(text) {
                findings.push(SecurityFinding {
                    category: pattern.category,
                    matched_pattern_id: pattern.id.to_string(),
                    confidence: pattern.confidence,
                });
            }
        }
    }
}

impl Default for SecurityAnalyzer {
    fn default() -> Self {
        Self::new(SecurityConfig::default())
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Prompt,
    Response,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prompt => write!(f, "prompt"),
            Self::Response => write!(f, "response"),
        }
    }
}
