use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The generation capability call itself failed
    #[error("transport error: {0}")]
    Transport(String),

    /// No parseable structured block in a generation response
    #[error("generation output is not a parseable JSON object")]
    MalformedGenerationOutput { raw: String },

    /// Judge response missing required keys or carrying invalid values
    #[error("malformed verdict: {reason}")]
    MalformedVerdict { reason: String },

    /// Writer response missing a required field
    #[error("incomplete article: field '{field}' is missing or empty")]
    IncompleteArticle { field: String },

    #[error("source text is empty")]
    EmptySource,

    #[error("invalid style profile: {0}")]
    Profile(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn incomplete(field: impl Into<String>) -> Self {
        Self::IncompleteArticle {
            field: field.into(),
        }
    }

    pub fn malformed_verdict(reason: impl Into<String>) -> Self {
        Self::MalformedVerdict {
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
