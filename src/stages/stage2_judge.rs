use tracing::{debug, info};

use crate::error::PipelineResult;
use crate::llm::{
    build_judge_prompt, coerce_object, verdict_from_output, GenerationRequest, Sampling,
    TextGenerator,
};
use crate::models::{Article, StyleProfile, Verdict};

/// Configuration for the judge stage
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Model identifier for the judge
    pub model: String,
    pub sampling: Sampling,
}

impl JudgeConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            sampling: Sampling::with_temperature(0.0),
        }
    }
}

/// Judge stage: evaluate one article against its profile and the source
///
/// The decision tag is taken as the judge reports it; no consistency with
/// the scores is enforced here.
pub async fn judge_article(
    generator: &dyn TextGenerator,
    config: &JudgeConfig,
    profile: &StyleProfile,
    article: &Article,
    source_text: &str,
) -> PipelineResult<Verdict> {
    let prompt = build_judge_prompt(profile, article, source_text);

    let request = GenerationRequest {
        model: config.model.clone(),
        system: prompt.system,
        user: prompt.user,
        sampling: config.sampling,
        structured: true,
    };

    info!(outlet = %profile.outlet, model = %config.model, "Judging article");
    let raw = generator.generate(&request).await?;
    debug!(outlet = %profile.outlet, "Judge response: {}", raw);

    let verdict = verdict_from_output(&coerce_object(&raw)?)?;

    info!(
        outlet = %profile.outlet,
        "Verdict: {} (factual {:.2}, style {:.2}, {} violations)",
        verdict.decision,
        verdict.scores.factual_consistency,
        verdict.scores.style_match,
        verdict.violations.len()
    );
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::llm::ScriptedGenerator;
    use crate::models::{Attribution, Decision};
    use crate::profiles::builtin;

    const SOURCE: &str = "Polizisten nahmen in Köln-Kalk einen 34-jährigen Mann wegen des Verdachts der Körperverletzung fest.";

    fn article(body: &str) -> Article {
        Article {
            outlet: "express.de".to_string(),
            headline: "Festnahme in Kalk".to_string(),
            lead: "Polizei nimmt 34-Jährigen fest.".to_string(),
            body_paragraphs: vec![body.to_string(), "Die Ermittlungen dauern an.".to_string()],
            callout: None,
            seo_title: "Festnahme in Köln-Kalk".to_string(),
            meta_description: "34-Jähriger festgenommen.".to_string(),
            tags: vec![],
            attribution: Attribution {
                source: "Polizei Köln".to_string(),
                source_url: None,
            },
            fact_table: None,
        }
    }

    #[tokio::test]
    async fn test_judge_flags_named_suspect_for_human_review() {
        let generator = ScriptedGenerator::with_responses([r#"{
            "metrics": {"headline_length_chars": 17, "body_word_count": 40, "claim_coverage": 0.5, "claims": []},
            "scores": {"factual_consistency": 0.6, "style_match": 0.9, "length_ok": true, "structure_ok": true, "safety_ok": false},
            "violations": ["Der Tatverdächtige wird mit vollem Namen genannt"],
            "suggested_fixes": ["Namen entfernen"],
            "decision": "human_review"
        }"#]);
        let profile = builtin::express().profile;
        let config = JudgeConfig::new("judge-model");

        let verdict = judge_article(
            &generator,
            &config,
            &profile,
            &article("Der 34-jährige Max Mustermann wurde festgenommen."),
            SOURCE,
        )
        .await
        .unwrap();

        assert_eq!(verdict.decision, Decision::HumanReview);
        assert!(!verdict.scores.safety_ok);
        assert_eq!(verdict.violations.len(), 1);

        let requests = generator.requests();
        assert_eq!(requests[0].sampling.temperature, Some(0.0));
        assert!(requests[0].structured);
        assert!(requests[0].user.contains("Max Mustermann"));
    }

    #[tokio::test]
    async fn test_judge_clean_article_is_auto_ok_eligible() {
        let generator = ScriptedGenerator::with_responses([r#"{
            "scores": {"factual_consistency": 1.0, "style_match": 0.95, "length_ok": true, "structure_ok": true, "safety_ok": true},
            "violations": [],
            "suggested_fixes": [],
            "decision": "auto_ok"
        }"#]);
        let profile = builtin::express().profile;
        let config = JudgeConfig::new("judge-model");

        let verdict = judge_article(
            &generator,
            &config,
            &profile,
            &article("Ein 34-Jähriger wurde laut Polizei festgenommen."),
            SOURCE,
        )
        .await
        .unwrap();

        assert_eq!(verdict.decision, Decision::AutoOk);
        assert!(verdict.metrics.is_none());
    }

    #[tokio::test]
    async fn test_missing_decision_is_malformed_verdict() {
        let generator = ScriptedGenerator::with_responses([
            r#"{"scores": {"factual_consistency": 1.0}, "violations": [], "suggested_fixes": []}"#,
        ]);
        let profile = builtin::express().profile;
        let config = JudgeConfig::new("judge-model");

        let err = judge_article(&generator, &config, &profile, &article("Text."), SOURCE)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::MalformedVerdict { .. }));
    }
}
