use tracing::{info, info_span, warn, Instrument};

use crate::error::{PipelineError, PipelineResult};
use crate::io::SourceDocument;
use crate::llm::TextGenerator;
use crate::models::{Article, Verdict};
use crate::profiles::{OutletProfile, StyleRegistry};
use crate::stages::{
    generate_article, judge_article, maybe_revise, JudgeConfig, RevisionConfig, RevisionOutcome,
    WriterConfig,
};

/// Run-level configuration, passed in explicitly by the caller
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub writer: WriterConfig,
    pub judge: JudgeConfig,
    pub revision: RevisionConfig,
    /// Whether the single revision round runs at all
    pub revise: bool,
}

impl PipelineConfig {
    /// Corrections use the writer model
    pub fn new(writer_model: impl Into<String>, judge_model: impl Into<String>) -> Self {
        let writer_model = writer_model.into();
        Self {
            revision: RevisionConfig::new(writer_model.clone()),
            writer: WriterConfig::new(writer_model),
            judge: JudgeConfig::new(judge_model),
            revise: true,
        }
    }

    pub fn with_revision(mut self, revise: bool) -> Self {
        self.revise = revise;
        self
    }
}

/// Final article and verdict for one outlet
#[derive(Debug, Clone)]
pub struct OutletResult {
    pub article: Article,
    pub verdict: Verdict,
    pub revision: RevisionOutcome,
}

/// Per-outlet entry of a run
#[derive(Debug)]
pub struct OutletReport {
    pub outlet: String,
    pub result: PipelineResult<OutletResult>,
}

impl OutletReport {
    pub fn error(&self) -> Option<&PipelineError> {
        self.result.as_ref().err()
    }
}

/// Aggregated results of one run, in registry order
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub outlets: Vec<OutletReport>,
}

impl PipelineReport {
    pub fn get(&self, outlet: &str) -> Option<&OutletReport> {
        self.outlets.iter().find(|r| r.outlet == outlet)
    }

    pub fn succeeded(&self) -> usize {
        self.outlets.iter().filter(|r| r.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outlets.len() - self.succeeded()
    }
}

/// Run writer, judge and (if enabled) revision for a single outlet
pub async fn run_outlet(
    generator: &dyn TextGenerator,
    config: &PipelineConfig,
    outlet: &OutletProfile,
    source: &SourceDocument,
) -> PipelineResult<OutletResult> {
    let profile = &outlet.profile;

    let article = generate_article(
        generator,
        &config.writer,
        profile,
        &outlet.examples,
        &source.text,
        source.url.as_deref(),
    )
    .await?;

    let verdict = judge_article(generator, &config.judge, profile, &article, &source.text).await?;

    if !config.revise {
        return Ok(OutletResult {
            article,
            verdict,
            revision: RevisionOutcome::Disabled,
        });
    }

    let revised = maybe_revise(
        generator,
        &config.revision,
        &config.judge,
        profile,
        article,
        verdict,
        &source.text,
    )
    .await?;

    Ok(OutletResult {
        article: revised.article,
        verdict: revised.verdict,
        revision: revised.outcome,
    })
}

/// Run writer -> judge -> optional revision for every outlet in the registry
///
/// An error in one outlet is recorded in its report entry and never prevents
/// the others from completing.
pub async fn run_pipeline(
    generator: &dyn TextGenerator,
    config: &PipelineConfig,
    registry: &StyleRegistry,
    source: &SourceDocument,
) -> PipelineReport {
    let mut report = PipelineReport::default();

    for outlet in registry.outlets() {
        let span = info_span!("outlet", outlet = %outlet.outlet());
        let result = run_outlet(generator, config, outlet, source)
            .instrument(span)
            .await;

        match &result {
            Ok(done) => info!(
                "Outlet {} complete: decision {}",
                outlet.outlet(),
                done.verdict.decision
            ),
            Err(e) => warn!("Outlet {} failed: {}", outlet.outlet(), e),
        }

        report.outlets.push(OutletReport {
            outlet: outlet.outlet().to_string(),
            result,
        });
    }

    info!(
        "Pipeline finished: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedGenerator;
    use crate::models::Decision;

    fn source() -> SourceDocument {
        SourceDocument::new(
            "Polizisten nahmen in Köln-Kalk einen 34-jährigen Mann wegen des Verdachts der Körperverletzung fest.",
            Some("https://presseportal.de/1".to_string()),
        )
        .unwrap()
    }

    fn writer_json(site: &str) -> String {
        serde_json::json!({
            "site": site,
            "headline": "Festnahme nach Streit in Kalk",
            "teaser_or_lead": "Die Polizei nahm einen 34-Jährigen fest.",
            "body_paragraphs": ["Absatz eins.", "Absatz zwei."],
            "seo_title": "Festnahme in Köln-Kalk",
            "meta_description": "Polizei nimmt 34-Jährigen fest.",
            "tags": ["Köln"],
            "attribution": {"source": "Polizei Köln", "source_url": "https://presseportal.de/1"}
        })
        .to_string()
    }

    fn verdict_json(factual: f64, decision: &str) -> String {
        serde_json::json!({
            "scores": {"factual_consistency": factual, "style_match": 0.95, "length_ok": true, "structure_ok": true, "safety_ok": true},
            "violations": [],
            "suggested_fixes": [],
            "decision": decision
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_two_outlets_without_revision_needed() {
        let generator = ScriptedGenerator::with_responses([
            writer_json("express.de"),
            verdict_json(1.0, "auto_ok"),
            writer_json("ksta.de"),
            verdict_json(0.99, "auto_ok"),
        ]);
        let config = PipelineConfig::new("writer", "judge");

        let report = run_pipeline(&generator, &config, &StyleRegistry::builtin(), &source()).await;

        assert_eq!(report.outlets.len(), 2);
        assert_eq!(report.succeeded(), 2);
        let express = report.get("express.de").unwrap().result.as_ref().unwrap();
        assert_eq!(express.revision, RevisionOutcome::NotNeeded);
        assert_eq!(
            express.article.attribution.source_url.as_deref(),
            Some("https://presseportal.de/1")
        );
        assert_eq!(generator.call_count(), 4);
    }

    #[tokio::test]
    async fn test_failure_in_one_outlet_does_not_block_the_other() {
        let generator = ScriptedGenerator::with_responses([
            "no json here".to_string(),
            writer_json("ksta.de"),
            verdict_json(1.0, "auto_ok"),
        ]);
        let config = PipelineConfig::new("writer", "judge");

        let report = run_pipeline(&generator, &config, &StyleRegistry::builtin(), &source()).await;

        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.get("express.de").unwrap().error(),
            Some(PipelineError::MalformedGenerationOutput { .. })
        ));
        let ksta = report.get("ksta.de").unwrap().result.as_ref().unwrap();
        assert_eq!(ksta.verdict.decision, Decision::AutoOk);
    }

    #[tokio::test]
    async fn test_revision_toggle_off_skips_revision() {
        let generator = ScriptedGenerator::with_responses([
            writer_json("express.de"),
            verdict_json(0.5, "revise"),
        ]);
        let config = PipelineConfig::new("writer", "judge").with_revision(false);
        let registry = StyleRegistry::builtin()
            .select(&["express.de".to_string()])
            .unwrap();

        let report = run_pipeline(&generator, &config, &registry, &source()).await;

        let express = report.get("express.de").unwrap().result.as_ref().unwrap();
        assert_eq!(express.revision, RevisionOutcome::Disabled);
        assert_eq!(express.verdict.decision, Decision::Revise);
        assert_eq!(generator.call_count(), 2);
    }

    #[tokio::test]
    async fn test_revision_runs_when_scores_are_low() {
        let generator = ScriptedGenerator::with_responses([
            writer_json("ksta.de"),
            verdict_json(0.8, "revise"),
            writer_json("ksta.de"),
            verdict_json(1.0, "auto_ok"),
        ]);
        let config = PipelineConfig::new("writer", "judge");
        let registry = StyleRegistry::builtin().select(&["ksta.de".to_string()]).unwrap();

        let report = run_pipeline(&generator, &config, &registry, &source()).await;

        let ksta = report.get("ksta.de").unwrap().result.as_ref().unwrap();
        assert!(matches!(ksta.revision, RevisionOutcome::Revised { .. }));
        assert_eq!(ksta.verdict.decision, Decision::AutoOk);
        assert_eq!(generator.call_count(), 4);
    }
}
