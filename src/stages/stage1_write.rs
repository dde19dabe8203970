use tracing::{debug, info};

use crate::error::PipelineResult;
use crate::llm::{
    article_from_output, build_writer_prompt, coerce_object, GenerationRequest, Sampling,
    TextGenerator,
};
use crate::models::{Article, FewShotExample, StyleProfile};

/// Configuration for the writer stage
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Model identifier for the writer
    pub model: String,
    /// Low but nonzero temperature
    pub sampling: Sampling,
}

impl WriterConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            sampling: Sampling::with_temperature(0.35),
        }
    }
}

/// Writer stage: generate one article for one outlet
///
/// 1. Build the writer prompt from profile, examples and source
/// 2. Call the generator in structured mode
/// 3. Coerce the response into a JSON object
/// 4. Validate required fields and build the article
pub async fn generate_article(
    generator: &dyn TextGenerator,
    config: &WriterConfig,
    profile: &StyleProfile,
    examples: &[FewShotExample],
    source_text: &str,
    source_url: Option<&str>,
) -> PipelineResult<Article> {
    let prompt = build_writer_prompt(profile, examples, source_text, source_url);

    let request = GenerationRequest {
        model: config.model.clone(),
        system: prompt.system,
        user: prompt.user,
        sampling: config.sampling,
        structured: true,
    };

    info!(outlet = %profile.outlet, model = %config.model, "Writing article");
    let raw = generator.generate(&request).await?;
    debug!(outlet = %profile.outlet, "Writer response: {}", raw);

    let data = coerce_object(&raw)?;
    let article = article_from_output(&data, profile)?;

    info!(
        outlet = %profile.outlet,
        "Article written: {} headline chars, {} words",
        article.headline_chars(),
        article.word_count()
    );
    Ok(article)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::llm::ScriptedGenerator;
    use crate::profiles::builtin;

    const SOURCE: &str = "Polizisten nahmen am Montagabend in Köln-Kalk einen 34-jährigen Mann \
        vorläufig fest. Er steht im Verdacht, einen 41-Jährigen nach einem Streit geschlagen zu haben.";

    fn writer_response(with_attribution: bool) -> String {
        let mut value = serde_json::json!({
            "site": "express.de",
            "headline": "Faust-Attacke in Kalk: 34-Jähriger festgenommen",
            "teaser_or_lead": "Nach einem Streit in Köln-Kalk klickten am Montagabend die Handschellen.",
            "body_paragraphs": [
                "Die Polizei nahm am Montagabend in Köln-Kalk einen 34-jährigen Mann vorläufig fest. Er steht im Verdacht, einen 41-Jährigen geschlagen zu haben.",
                "Vorausgegangen war laut Polizei ein Streit zwischen den beiden Männern. Die Ermittlungen wegen Körperverletzung dauern an.",
                "Weitere Angaben zu den Hintergründen machte die Polizei zunächst nicht. Der Tatverdächtige muss sich nun verantworten."
            ],
            "callout_optional": null,
            "seo_title": "Köln-Kalk: 34-Jähriger nach Streit festgenommen",
            "meta_description": "Polizei nimmt in Köln-Kalk einen 34-Jährigen nach einem Streit fest.",
            "tags": ["Köln", "Kalk", "Polizei"],
            "attribution": {"source": "Polizei Köln", "source_url": ""},
            "fact_table": null
        });
        if !with_attribution {
            value.as_object_mut().unwrap().remove("attribution");
        }
        format!("Hier der Artikel:\n{}", value)
    }

    #[tokio::test]
    async fn test_generate_article_within_profile_limits() {
        let outlet = builtin::express();
        let generator = ScriptedGenerator::with_responses([writer_response(true)]);
        let config = WriterConfig::new("writer-model");

        let article = generate_article(
            &generator,
            &config,
            &outlet.profile,
            &outlet.examples,
            SOURCE,
            None,
        )
        .await
        .unwrap();

        assert_eq!(article.outlet, "express.de");
        assert!(outlet.profile.headline_conforms(&article.headline));
        assert!(article.headline_chars() <= 60);
        assert!(outlet.profile.length_conforms(article.word_count()));

        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].structured);
        assert_eq!(requests[0].model, "writer-model");
        assert_eq!(requests[0].sampling.temperature, Some(0.35));
        assert!(requests[0].user.contains(SOURCE));
    }

    #[tokio::test]
    async fn test_missing_attribution_fails() {
        let outlet = builtin::express();
        let generator = ScriptedGenerator::with_responses([writer_response(false)]);
        let config = WriterConfig::new("writer-model");

        let err = generate_article(&generator, &config, &outlet.profile, &outlet.examples, SOURCE, None)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::IncompleteArticle { field } if field == "attribution"));
    }

    #[tokio::test]
    async fn test_prose_only_response_is_malformed() {
        let outlet = builtin::ksta();
        let generator = ScriptedGenerator::with_responses(["I cannot write this article."]);
        let config = WriterConfig::new("writer-model");

        let err = generate_article(&generator, &config, &outlet.profile, &outlet.examples, SOURCE, None)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::MalformedGenerationOutput { .. }));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let outlet = builtin::ksta();
        let generator = ScriptedGenerator::new();
        generator.push_error(PipelineError::Transport("timeout".to_string()));
        let config = WriterConfig::new("writer-model");

        let err = generate_article(&generator, &config, &outlet.profile, &outlet.examples, SOURCE, None)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Transport(_)));
        assert_eq!(generator.call_count(), 1);
    }
}
