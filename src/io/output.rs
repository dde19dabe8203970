use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::PipelineResult;
use crate::models::{Article, StyleProfile, Verdict};
use crate::pipeline::PipelineReport;
use crate::stages::RevisionOutcome;

/// Serialize an article to its persisted JSON document
pub fn article_to_json(article: &Article) -> PipelineResult<String> {
    Ok(serde_json::to_string_pretty(article)?)
}

/// Parse a persisted article document
pub fn article_from_json(json: &str) -> PipelineResult<Article> {
    Ok(serde_json::from_str(json)?)
}

/// File name for an outlet's article, e.g. `article_express_de.json`
pub fn article_file_name(outlet: &str) -> String {
    format!("article_{}.json", outlet.replace('.', "_"))
}

/// Write the article document into `dir`, returning the file path
pub fn write_article(dir: &Path, article: &Article) -> PipelineResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(article_file_name(&article.outlet));
    std::fs::write(&path, article_to_json(article)?)?;
    Ok(path)
}

/// Human-readable view of one article with its judge verdict
pub fn render_text(profile: &StyleProfile, article: &Article, verdict: &Verdict) -> String {
    let mut output = String::new();

    output.push_str(&format!("== {} ==\n\n", article.outlet));
    output.push_str(&format!("{}\n\n", article.headline));
    output.push_str(&wrap_text(
        &format!("{}: {}", profile.lead_label(), article.lead),
        80,
    ));
    output.push_str("\n\n");

    for paragraph in &article.body_paragraphs {
        output.push_str(&wrap_text(paragraph, 80));
        output.push_str("\n\n");
    }

    if let Some(callout) = &article.callout {
        output.push_str(&wrap_text(&format!("> {}", callout), 80));
        output.push_str("\n\n");
    }

    output.push_str(&format!("Source: {}", article.attribution.source));
    if let Some(url) = &article.attribution.source_url {
        output.push_str(&format!(" ({})", url));
    }
    output.push('\n');

    let scores = &verdict.scores;
    output.push_str("\n-- Judge --\n");
    output.push_str(&format!(
        "factual_consistency: {:.2}  style_match: {:.2}\n",
        scores.factual_consistency, scores.style_match
    ));
    output.push_str(&format!(
        "length_ok: {}  structure_ok: {}  safety_ok: {}\n",
        scores.length_ok, scores.structure_ok, scores.safety_ok
    ));
    if let Some(coverage) = verdict.metrics.as_ref().and_then(|m| m.claim_coverage) {
        output.push_str(&format!("claim_coverage: {:.2}\n", coverage));
    }
    if !verdict.violations.is_empty() {
        output.push_str(&format!("Violations: {}\n", verdict.violations.join(", ")));
    }
    if !verdict.suggested_fixes.is_empty() {
        output.push_str(&format!(
            "Suggested fixes: {}\n",
            verdict.suggested_fixes.join(", ")
        ));
    }
    output.push_str(&format!("Decision: {}\n", verdict.decision));

    output
}

/// Wrap text at approximately the given width
fn wrap_text(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if line_len + word_len + 1 > width && line_len > 0 {
            result.push('\n');
            line_len = 0;
        }
        if line_len > 0 {
            result.push(' ');
            line_len += 1;
        }
        result.push_str(word);
        line_len += word_len;
    }

    result
}

/// Machine-readable summary of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    /// RFC 3339 timestamp
    pub generated_at: String,
    pub writer_model: String,
    pub judge_model: String,
    pub outlets: Vec<OutletEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutletEntry {
    pub outlet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article: Option<Article>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<RevisionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    pub fn from_pipeline(report: &PipelineReport, writer_model: &str, judge_model: &str) -> Self {
        let outlets = report
            .outlets
            .iter()
            .map(|entry| match &entry.result {
                Ok(done) => OutletEntry {
                    outlet: entry.outlet.clone(),
                    article: Some(done.article.clone()),
                    verdict: Some(done.verdict.clone()),
                    revision: Some(done.revision.clone()),
                    error: None,
                },
                Err(e) => OutletEntry {
                    outlet: entry.outlet.clone(),
                    article: None,
                    verdict: None,
                    revision: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();

        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            writer_model: writer_model.to_string(),
            judge_model: judge_model.to_string(),
            outlets,
        }
    }

    pub fn write_json(&self, path: &Path) -> PipelineResult<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
