pub mod builtin;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::models::{FewShotExample, StyleProfile};

/// One outlet: its style profile plus the examples shown to the writer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutletProfile {
    pub profile: StyleProfile,
    #[serde(default)]
    pub examples: Vec<FewShotExample>,
}

impl OutletProfile {
    pub fn outlet(&self) -> &str {
        &self.profile.outlet
    }
}

/// Read-only lookup of outlet profiles, in registration order
///
/// Everything outlet-specific in the pipeline is read from these values;
/// nothing branches on an outlet name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRegistry {
    outlets: Vec<OutletProfile>,
}

impl StyleRegistry {
    /// The two built-in outlets
    pub fn builtin() -> Self {
        Self {
            outlets: vec![builtin::express(), builtin::ksta()],
        }
    }

    pub fn new(outlets: Vec<OutletProfile>) -> PipelineResult<Self> {
        for (i, outlet) in outlets.iter().enumerate() {
            outlet.profile.validate().map_err(PipelineError::Profile)?;
            if outlets[..i].iter().any(|o| o.outlet() == outlet.outlet()) {
                return Err(PipelineError::Profile(format!(
                    "duplicate outlet: {}",
                    outlet.outlet()
                )));
            }
        }
        Ok(Self { outlets })
    }

    /// Load a registry from a JSON file of the form `{"outlets": [...]}`
    pub fn from_json_file(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> PipelineResult<Self> {
        let raw: StyleRegistry = serde_json::from_str(json)
            .map_err(|e| PipelineError::Profile(format!("cannot parse profiles: {}", e)))?;
        Self::new(raw.outlets)
    }

    pub fn get(&self, outlet: &str) -> Option<&OutletProfile> {
        self.outlets.iter().find(|o| o.outlet() == outlet)
    }

    pub fn outlets(&self) -> &[OutletProfile] {
        &self.outlets
    }

    /// Restrict the registry to the named outlets, keeping registration order
    pub fn select(&self, names: &[String]) -> PipelineResult<Self> {
        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(PipelineError::Profile(format!("unknown outlet: {}", unknown)));
        }
        Ok(Self {
            outlets: self
                .outlets
                .iter()
                .filter(|o| names.iter().any(|n| n == o.outlet()))
                .cloned()
                .collect(),
        })
    }
}
