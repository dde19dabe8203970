use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::PipelineResult;
use crate::llm::{
    article_from_output, build_revision_prompt, coerce_object, GenerationRequest, Sampling,
    TextGenerator,
};
use crate::models::{Article, StyleProfile, Verdict};

use super::{judge_article, JudgeConfig};

/// Score thresholds below which a revision is requested
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevisionThresholds {
    pub factual_consistency: f64,
    pub style_match: f64,
}

impl Default for RevisionThresholds {
    fn default() -> Self {
        Self {
            factual_consistency: 0.98,
            style_match: 0.90,
        }
    }
}

/// Configuration for the revision stage
#[derive(Debug, Clone)]
pub struct RevisionConfig {
    /// Model used for the correction call (the writer model)
    pub model: String,
    pub sampling: Sampling,
    pub thresholds: RevisionThresholds,
}

impl RevisionConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            sampling: Sampling::with_temperature(0.2),
            thresholds: RevisionThresholds::default(),
        }
    }
}

/// What the revision stage did for one outlet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RevisionOutcome {
    /// Scores met the thresholds; nothing was sent
    NotNeeded,
    /// A corrected article was produced and judged again
    Revised { reasons: Vec<String> },
    /// The correction response was unusable; the original was kept
    Abandoned { reasons: Vec<String>, error: String },
    /// Revision was switched off for the run
    Disabled,
}

/// Result of the revision stage
#[derive(Debug, Clone)]
pub struct RevisionResult {
    pub article: Article,
    pub verdict: Verdict,
    pub outcome: RevisionOutcome,
}

impl RevisionResult {
    pub fn into_pair(self) -> (Article, Verdict) {
        (self.article, self.verdict)
    }
}

/// Reasons for revising, derived from the raw scores independently of the
/// judge's decision tag, followed by the judge's violations and fixes verbatim
pub fn revision_reasons(verdict: &Verdict, thresholds: &RevisionThresholds) -> Vec<String> {
    let mut reasons = Vec::new();
    let scores = &verdict.scores;

    if scores.factual_consistency < thresholds.factual_consistency {
        reasons.push(
            "Improve factual consistency: use only confirmed content from the source.".to_string(),
        );
    }
    if scores.style_match < thresholds.style_match {
        reasons.push(
            "Improve style match: follow the style profile consistently (tone, length, structure, headline rules)."
                .to_string(),
        );
    }
    for (flag, ok) in scores.flags() {
        if !ok {
            reasons.push(format!("Correct {} == false.", flag));
        }
    }
    reasons.extend(verdict.violations.iter().cloned());
    reasons.extend(verdict.suggested_fixes.iter().cloned());

    reasons
}

/// Revision stage: at most one correction and one re-judge per outlet
///
/// With no reasons, the inputs are returned untouched and nothing is sent.
/// An unusable correction response keeps the original article and verdict;
/// transport errors and re-judge failures propagate.
pub async fn maybe_revise(
    generator: &dyn TextGenerator,
    config: &RevisionConfig,
    judge: &JudgeConfig,
    profile: &StyleProfile,
    article: Article,
    verdict: Verdict,
    source_text: &str,
) -> PipelineResult<RevisionResult> {
    let reasons = revision_reasons(&verdict, &config.thresholds);

    if reasons.is_empty() {
        debug!(outlet = %profile.outlet, "No revision needed");
        return Ok(RevisionResult {
            article,
            verdict,
            outcome: RevisionOutcome::NotNeeded,
        });
    }

    info!(
        outlet = %profile.outlet,
        "Requesting revision for {} reasons (judge decision: {})",
        reasons.len(),
        verdict.decision
    );

    let prompt = build_revision_prompt(profile, &article, source_text, &reasons);
    let request = GenerationRequest {
        model: config.model.clone(),
        system: prompt.system,
        user: prompt.user,
        sampling: config.sampling,
        structured: true,
    };

    let raw = generator.generate(&request).await?;
    debug!(outlet = %profile.outlet, "Revision response: {}", raw);

    let corrected = coerce_object(&raw).and_then(|data| article_from_output(&data, profile));
    let corrected = match corrected {
        Ok(corrected) => corrected,
        Err(e) => {
            warn!(outlet = %profile.outlet, "Revision discarded, keeping original: {}", e);
            return Ok(RevisionResult {
                article,
                verdict,
                outcome: RevisionOutcome::Abandoned {
                    reasons,
                    error: e.to_string(),
                },
            });
        }
    };

    let new_verdict = judge_article(generator, judge, profile, &corrected, source_text).await?;

    Ok(RevisionResult {
        article: corrected,
        verdict: new_verdict,
        outcome: RevisionOutcome::Revised { reasons },
    })
}
