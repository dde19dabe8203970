pub mod error;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod profiles;
pub mod stages;

pub use error::{PipelineError, PipelineResult};
pub use io::{load_source, render_text, write_article, RunReport, SourceDocument};
pub use llm::{ClientConfig, GenerationRequest, Provider, Sampling, ScriptedGenerator, TextGenerator};
pub use models::{Article, Decision, FewShotExample, StyleProfile, Verdict};
pub use pipeline::{run_pipeline, PipelineConfig, PipelineReport};
pub use profiles::{OutletProfile, StyleRegistry};
pub use stages::{generate_article, judge_article, maybe_revise, RevisionOutcome};
