//! Finding and verdict types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Detection category for a single finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCategory {
    /// Attempt to override earlier instructions
    InstructionOverride,
    /// Attempt to change the assistant's role or persona
    RoleManipulation,
    /// Attempt to extract the operator's system prompt
    SystemPromptExtraction,
    /// Attempt to bypass safety restrictions
    Jailbreak,
    /// Attempt to extract sensitive data
    DataExfiltration,
    /// Email address
    PiiEmail,
    /// Phone number
    PiiPhone,
    /// US Social Security Number
    PiiSsn,
    /// Payment card number
    PiiCreditCard,
    /// IPv4 address
    PiiIp,
    /// Date of birth
    PiiDob,
}

impl FindingCategory {
    /// Whether this category describes PII rather than an injection attempt
    #[must_use]
    pub fn is_pii(self) -> bool {
        matches!(
            self,
            Self::PiiEmail
                | Self::PiiPhone
                | Self::PiiSsn
                | Self::PiiCreditCard
                | Self::PiiIp
                | Self::PiiDob
        )
    }

    /// Whether this category describes an injection attempt
    #[must_use]
    pub fn is_injection(self) -> bool {
        !self.is_pii()
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InstructionOverride => "instruction-override",
            Self::RoleManipulation => "role-manipulation",
            Self::SystemPromptExtraction => "system-prompt-extraction",
            Self::Jailbreak => "jailbreak",
            Self::DataExfiltration => "data-exfiltration",
            Self::PiiEmail => "pii-email",
            Self::PiiPhone => "pii-phone",
            Self::PiiSsn => "pii-ssn",
            Self::PiiCreditCard => "pii-credit-card",
            Self::PiiIp => "pii-ip",
            Self::PiiDob => "pii-dob",
        };
        write!(f, "{s}")
    }
}

/// One pattern match within a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityFinding {
    /// Detection category
    pub category: FindingCategory,
    /// Stable identifier of the pattern that matched
    pub matched_pattern_id: String,
    /// Confidence weight of the pattern (0.0 - 1.0)
    pub confidence: f64,
}

/// Aggregated screening result for one text.
///
/// Derived from the ordered finding sequence; never mutated after
/// construction. `risk_score` is the maximum confidence among injection
/// findings only: PII presence raises `pii_detected` but never the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityVerdict {
    /// Any injection-category finding present
    pub injection_detected: bool,
    /// Any PII-category finding present
    pub pii_detected: bool,
    /// Maximum confidence across injection findings, 0.0 if none
    pub risk_score: f64,
    /// Set of PII categories found
    pub pii_types: BTreeSet<FindingCategory>,
    /// All findings, in pattern-table order
    pub findings: Vec<SecurityFinding>,
}

impl SecurityVerdict {
    /// The verdict for a text that matched nothing (or was never screened)
    #[must_use]
    pub fn empty() -> Self {
        Self {
            injection_detected: false,
            pii_detected: false,
            risk_score: 0.0,
            pii_types: BTreeSet::new(),
            findings: Vec::new(),
        }
    }

    /// Derive a verdict from an ordered finding sequence
    #[must_use]
    pub fn from_findings(findings: Vec<SecurityFinding>) -> Self {
        let mut injection_detected = false;
        let mut risk_score: f64 = 0.0;
        let mut pii_types = BTreeSet::new();

        for finding in &findings {
            if finding.category.is_injection() {
                injection_detected = true;
                risk_score = risk_score.max(finding.confidence);
            } else {
                pii_types.insert(finding.category);
            }
        }

        Self {
            injection_detected,
            pii_detected: !pii_types.is_empty(),
            risk_score,
            pii_types,
            findings,
        }
    }
}

impl Default for SecurityVerdict {
    fn default() -> Self {
        Self::empty()
    }
}
