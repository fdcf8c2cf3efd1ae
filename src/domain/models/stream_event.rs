use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub filename: String,
    pub score: f64,
}

/// Retrieval diagnostics for one query: which documents matched and the
/// redacted context the model was given.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugSnapshot {
    #[serde(default)]
    pub vector_matches: Vec<VectorMatch>,
    #[serde(default)]
    pub context_sent_to_llm: String,
}

/// A single record of the chat response body, discriminated by its `type`
/// field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Token { content: String },
    Debug { data: DebugSnapshot },
    Error { content: String },
}

impl StreamEvent {
    pub const KINDS: [&'static str; 3] = ["token", "debug", "error"];
}
