use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

/// Judge decision tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No issues found
    AutoOk,
    /// Issues that can be corrected without human input
    Revise,
    /// At least one hard-policy violation
    HumanReview,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::AutoOk => "auto_ok",
            Decision::Revise => "revise",
            Decision::HumanReview => "human_review",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = String;

    /// Case-insensitive; `-` and spaces are accepted in place of `_`
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "auto_ok" => Ok(Decision::AutoOk),
            "revise" => Ok(Decision::Revise),
            "human_review" => Ok(Decision::HumanReview),
            _ => Err(format!("unknown decision '{}'", raw)),
        }
    }
}

impl Serialize for Decision {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Decision {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Named judge scores
///
/// Missing numeric scores default to 0.0 and missing flags to `true`, so an
/// absent score always triggers revision while an absent flag never does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(default)]
    pub factual_consistency: f64,
    #[serde(default)]
    pub style_match: f64,
    #[serde(default = "flag_default")]
    pub length_ok: bool,
    #[serde(default = "flag_default")]
    pub structure_ok: bool,
    #[serde(default = "flag_default")]
    pub safety_ok: bool,
    /// Any additional scores the judge reports
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn flag_default() -> bool {
    true
}

impl Scores {
    /// The boolean flags in a fixed order
    pub fn flags(&self) -> [(&'static str, bool); 3] {
        [
            ("length_ok", self.length_ok),
            ("structure_ok", self.structure_ok),
            ("safety_ok", self.safety_ok),
        ]
    }
}

/// Support status of a single extracted claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimStatus {
    Supported,
    Unsupported,
    /// Claim is in the source but stated differently
    Deviating,
    /// Any status the judge invents; never counts as supported
    Unknown,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Supported => "supported",
            ClaimStatus::Unsupported => "unsupported",
            ClaimStatus::Deviating => "deviating",
            ClaimStatus::Unknown => "unknown",
        }
    }

    /// Same normalization as `Decision`, but never fails
    pub fn parse_lenient(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "supported" | "confirmed" => ClaimStatus::Supported,
            "unsupported" | "not_supported" => ClaimStatus::Unsupported,
            "deviating" | "partially_supported" | "contradicted" => ClaimStatus::Deviating,
            _ => ClaimStatus::Unknown,
        }
    }
}

impl Serialize for ClaimStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ClaimStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(ClaimStatus::parse_lenient(&raw))
    }
}

/// Evidence record for one factual claim in the article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimEvidence {
    pub claim: String,
    pub status: ClaimStatus,
    /// Supporting quotation from the source text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_quote: Option<String>,
}

/// Fine-grained judge metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QcMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline_length_chars: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_word_count: Option<usize>,
    /// Supported claims / total claims, two decimals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_coverage: Option<f64>,
    #[serde(default)]
    pub claims: Vec<ClaimEvidence>,
}

impl QcMetrics {
    /// Coverage derived from the claim list, rounded to two decimals
    pub fn derived_coverage(&self) -> Option<f64> {
        if self.claims.is_empty() {
            return None;
        }
        let supported = self
            .claims
            .iter()
            .filter(|c| c.status == ClaimStatus::Supported)
            .count();
        let ratio = supported as f64 / self.claims.len() as f64;
        Some((ratio * 100.0).round() / 100.0)
    }
}

/// Judge output for one article (QC result)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub scores: Scores,
    pub violations: Vec<String>,
    pub suggested_fixes: Vec<String>,
    pub decision: Decision,
    /// Optional; a metrics object that does not parse is dropped with a warning
    #[serde(
        default,
        deserialize_with = "lenient_metrics",
        skip_serializing_if = "Option::is_none"
    )]
    pub metrics: Option<QcMetrics>,
}

fn lenient_metrics<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<QcMetrics>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match serde_json::from_value(value) {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            warn!("Ignoring unreadable judge metrics: {}", e);
            None
        }
    }))
}
