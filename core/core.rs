pub mod config;
pub mod error;
pub mod gather;
pub mod generation;
pub mod rules;

pub use config::{Config, GeneralConfig, GenerationConfig, read_prompt_file};
pub use error::{AppError, Result};
pub use gather::{
    AggregateDocument, CollectOptions, CollectOutcome, FileRecord, PathStyle, ReadOutcome, collect,
    collect_with_rules,
};
pub use generation::{
    GenerationChunk, GenerationClient, GenerationRequest, StreamState, StreamSummary, Termination,
    consume_stream,
};
pub use rules::{IgnoreRules, is_ignored, load_rules};

/// Joins the prompt text and the aggregate document into the text sent
/// to the model.
pub fn compose_prompt(prompt: &str, document: &str) -> String {
    let mut out = String::with_capacity(prompt.len() + 1 + document.len());
    out.push_str(prompt);
    out.push('\n');
    out.push_str(document);
    out
}
