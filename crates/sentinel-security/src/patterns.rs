//! The static detection pattern tables.
//!
//! Two families: injection patterns (instruction override, role
//! manipulation, system-prompt extraction, jailbreak, data exfiltration)
//! and PII patterns. Every entry carries a stable id so findings can be
//! traced back to the exact pattern revision that produced them.
//!
//! Pattern scope controls which text a pattern applies to: all injection
//! patterns screen prompts, but only the extraction and jailbreak families
//! are meaningful on model output; PII patterns screen both directions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::verdict::FindingCategory;

/// Version tag of the pattern tables, reported alongside findings in logs.
pub const PATTERN_TABLE_VERSION: &str = "2025.1";

/// Which texts a pattern is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PatternScope {
    /// Prompt text only
    Prompt,
    /// Response text only
    Response,
    /// Both directions
    Both,
}

impl PatternScope {
    pub(crate) fn applies_to_prompt(self) -> bool {
        matches!(self, Self::Prompt | Self::Both)
    }

    pub(crate) fn applies_to_response(self) -> bool {
        matches!(self, Self::Response | Self::Both)
    }
}

/// One entry of a pattern table.
pub(crate) struct PatternEntry {
    pub id: &'static str,
    pub category: FindingCategory,
    pub regex: Regex,
    pub confidence: f64,
    pub scope: PatternScope,
}

fn entry(
    id: &'static str,
    category: FindingCategory,
    pattern: &str,
    confidence: f64,
    scope: PatternScope,
) -> PatternEntry {
    PatternEntry {
        id,
        category,
        // Table patterns are fixed literals validated by tests; a failed
        // compile here is a build defect, not a runtime condition.
        regex: Regex::new(pattern).unwrap_or_else(|e| panic!("invalid pattern {id}: {e}")),
        confidence,
        scope,
    }
}

/// Injection pattern table, evaluated in order.
pub(crate) static INJECTION_PATTERNS: Lazy<Vec<PatternEntry>> = Lazy::new(|| {
    use FindingCategory::{
        DataExfiltration, InstructionOverride, Jailbreak, RoleManipulation,
        SystemPromptExtraction,
    };
    use PatternScope::{Both, Prompt, Response};

    vec![
        // Direct instruction overrides
        entry(
            "inj-override-ignore",
            InstructionOverride,
            r"(?i)ignore\s+(?:all\s+)?(?:previous|above|prior)\s+(?:instructions|prompts)",
            0.8,
            Prompt,
        ),
        entry(
            "inj-override-disregard",
            InstructionOverride,
            r"(?i)disregard\s+(?:all\s+)?(?:previous|above|prior)\s+(?:instructions|prompts)",
            0.8,
            Prompt,
        ),
        entry(
            "inj-override-forget",
            InstructionOverride,
            r"(?i)forget\s+(?:all\s+)?(?:previous|above|prior)\s+(?:instructions|prompts)",
            0.7,
            Prompt,
        ),
        // Role and persona manipulation
        entry(
            "inj-role-identity",
            RoleManipulation,
            r"(?i)you\s+are\s+(?:not|no\s+longer)\s+(?:an?\s+)?(?:assistant|ai|model|bot)",
            0.6,
            Prompt,
        ),
        entry(
            "inj-role-act-as",
            RoleManipulation,
            r"(?i)act\s+as\s+(?:if\s+you\s+(?:are|were)\s+)?(?:a\s+)?different",
            0.6,
            Prompt,
        ),
        entry(
            "inj-role-pretend",
            RoleManipulation,
            r"(?i)pretend\s+(?:to\s+be|you\s+are)\s+",
            0.6,
            Prompt,
        ),
        // System prompt extraction (also meaningful on responses)
        entry(
            "inj-extract-reveal",
            SystemPromptExtraction,
            r"(?i)(?:reveal|show|print|repeat|what\s+(?:is|are))\s+(?:me\s+)?(?:your|the|this)\s+(?:system\s+)?(?:prompt|prompts|instructions|guidelines|rules)",
            0.8,
            Both,
        ),
        entry(
            "inj-extract-verbatim",
            SystemPromptExtraction,
            r"(?i)repeat\s+(?:back|after\s+me|verbatim)\b.*(?:prompt|instructions|guidelines|rules)",
            0.7,
            Both,
        ),
        // Jailbreak attempts (also meaningful on responses)
        entry(
            "inj-jailbreak-bypass",
            Jailbreak,
            r"(?i)(?:bypass|circumvent|disable)\s+(?:your|the|this\s+)?(?:guidelines|restrictions|limitations|safety|content\s+filter)",
            0.9,
            Both,
        ),
        entry(
            "inj-jailbreak-harmful-howto",
            Jailbreak,
            r"(?i)how\s+to\s+(?:build|make|create)\s+(?:a\s+)?(?:bomb|weapon|malware)\b",
            0.9,
            Both,
        ),
        entry(
            "resp-harmful-content",
            Jailbreak,
            r"(?i)(?:violent|harmful|dangerous|illegal)\s+(?:content|instructions|advice)",
            0.8,
            Response,
        ),
        entry(
            "resp-harm-cause",
            Jailbreak,
            r"(?i)how\s+to\s+cause\s+(?:harm|damage|destruction|violence)",
            0.8,
            Response,
        ),
        // Data exfiltration attempts
        entry(
            "inj-exfil-dump",
            DataExfiltration,
            r"(?i)(?:extract|dump|exfiltrate)\s+(?:all\s+)?(?:sensitive|private|confidential)\s+(?:data|information|content)",
            0.8,
            Prompt,
        ),
        entry(
            "inj-exfil-code",
            DataExfiltration,
            r"(?i)(?:execute\s+code|run\s+code|eval\(|system\(|import\s+os|import\s+subprocess)",
            0.7,
            Prompt,
        ),
    ]
});

/// PII pattern table, evaluated in order after the injection table.
pub(crate) static PII_PATTERNS: Lazy<Vec<PatternEntry>> = Lazy::new(|| {
    use FindingCategory::{PiiCreditCard, PiiDob, PiiEmail, PiiIp, PiiPhone, PiiSsn};
    use PatternScope::Both;

    vec![
        entry(
            "pii-email",
            PiiEmail,
            r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            0.95,
            Both,
        ),
        entry(
            "pii-phone",
            PiiPhone,
            r"\b(?:\+?1[-.\s]?)?(?:\([0-9]{3}\)|[0-9]{3})[-.\s][0-9]{3}[-.\s][0-9]{4}\b",
            0.85,
            Both,
        ),
        entry(
            "pii-ssn",
            PiiSsn,
            r"\b[0-9]{3}-[0-9]{2}-[0-9]{4}\b",
            0.9,
            Both,
        ),
        entry(
            "pii-credit-card",
            PiiCreditCard,
            r"\b(?:4[0-9]{3}|5[1-5][0-9]{2}|6(?:011|5[0-9]{2})|3[47][0-9]{2})[-\s]?[0-9]{4}[-\s]?[0-9]{4}[-\s]?[0-9]{4}\b",
            0.9,
            Both,
        ),
        entry(
            "pii-ipv4",
            PiiIp,
            r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
            0.8,
            Both,
        ),
        entry(
            "pii-dob",
            PiiDob,
            r"\b(?:0?[1-9]|1[0-2])[/-](?:0?[1-9]|[12][0-9]|3[01])[/-](?:19|20)[0-9]{2}\b",
            0.7,
            Both,
        ),
    ]
});
