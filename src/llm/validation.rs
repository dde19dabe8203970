use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{Article, Attribution, StyleProfile, Verdict};

/// Fields a writer response must carry, in the order they are checked
pub const REQUIRED_ARTICLE_FIELDS: [&str; 7] = [
    "site",
    "headline",
    "teaser_or_lead",
    "body_paragraphs",
    "seo_title",
    "meta_description",
    "attribution",
];

/// Top-level keys a judge response must carry
pub const REQUIRED_VERDICT_KEYS: [&str; 4] = ["scores", "violations", "suggested_fixes", "decision"];

/// Build an article from a coerced writer response
///
/// Required fields are checked in `REQUIRED_ARTICLE_FIELDS` order; the first
/// one that is absent or empty is reported. Strings are trimmed and empty
/// optional values are dropped.
pub fn article_from_output(
    data: &Map<String, Value>,
    profile: &StyleProfile,
) -> PipelineResult<Article> {
    let site = required_string(data, "site")?;
    let headline = required_string(data, "headline")?;
    let lead = required_string(data, "teaser_or_lead")?;
    let body_paragraphs = string_list(data.get("body_paragraphs"));
    if body_paragraphs.is_empty() {
        return Err(PipelineError::incomplete("body_paragraphs"));
    }
    let seo_title = required_string(data, "seo_title")?;
    let meta_description = required_string(data, "meta_description")?;
    let attribution =
        attribution(data.get("attribution")).ok_or_else(|| PipelineError::incomplete("attribution"))?;

    let outlet = if site == profile.outlet {
        site
    } else {
        warn!(
            "Writer returned site '{}' for outlet {}; keeping the profile outlet",
            site, profile.outlet
        );
        profile.outlet.clone()
    };

    let fact_table = match data.get("fact_table") {
        Some(Value::Object(table)) if !table.is_empty() => Some(
            table
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        ),
        Some(Value::Object(_)) | Some(Value::Null) | None => None,
        Some(other) => {
            warn!(
                "Writer returned a non-object fact_table for outlet {}; dropping it: {}",
                profile.outlet, other
            );
            None
        }
    };

    Ok(Article {
        outlet,
        headline,
        lead,
        body_paragraphs,
        callout: optional_string(data.get("callout_optional")),
        seo_title,
        meta_description,
        tags: string_list(data.get("tags")),
        attribution,
        fact_table,
    })
}

fn required_string(data: &Map<String, Value>, field: &str) -> PipelineResult<String> {
    optional_string(data.get(field)).ok_or_else(|| PipelineError::incomplete(field))
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| optional_string(Some(item)))
            .collect(),
        _ => vec![],
    }
}

/// Accepts `{"source": .., "source_url": ..}` or a bare source name
fn attribution(value: Option<&Value>) -> Option<Attribution> {
    match value {
        Some(Value::Object(obj)) => Some(Attribution {
            source: optional_string(obj.get("source"))?,
            source_url: optional_string(obj.get("source_url")),
        }),
        Some(Value::String(_)) => Some(Attribution {
            source: optional_string(value)?,
            source_url: None,
        }),
        _ => None,
    }
}

/// Build a verdict from a coerced judge response
pub fn verdict_from_output(data: &Map<String, Value>) -> PipelineResult<Verdict> {
    let missing: Vec<&str> = REQUIRED_VERDICT_KEYS
        .iter()
        .copied()
        .filter(|key| !data.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::malformed_verdict(format!(
            "missing keys: {}",
            missing.join(", ")
        )));
    }

    let mut verdict: Verdict = serde_json::from_value(Value::Object(data.clone()))
        .map_err(|e| PipelineError::malformed_verdict(e.to_string()))?;

    // Judges sometimes echo the "..." placeholder from the response template
    verdict.violations.retain(|v| !is_placeholder(v));
    verdict.suggested_fixes.retain(|f| !is_placeholder(f));

    if let Some(metrics) = verdict.metrics.as_mut() {
        if metrics.claim_coverage.is_none() {
            metrics.claim_coverage = metrics.derived_coverage();
        }
    }

    Ok(verdict)
}

fn is_placeholder(entry: &str) -> bool {
    entry.trim().trim_matches(|c| c == '.' || c == '\u{2026}').is_empty()
}
