use std::io::Read;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};

/// The police report the articles are written from
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// Verbatim report text
    pub text: String,
    /// Optional URL of the original report, carried into the attribution
    pub url: Option<String>,
}

impl SourceDocument {
    /// Blank text is rejected; a blank URL counts as absent
    pub fn new(text: impl Into<String>, url: Option<String>) -> PipelineResult<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(PipelineError::EmptySource);
        }
        Ok(Self {
            text: text.trim().to_string(),
            url: url
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
        })
    }
}

/// Read report text from a file, or from stdin when the path is `-`
pub fn read_source_text(path: &Path) -> PipelineResult<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Read and validate a source document
pub fn load_source(path: &Path, url: Option<String>) -> PipelineResult<SourceDocument> {
    SourceDocument::new(read_source_text(path)?, url)
}
