use serde::{Deserialize, Serialize};

/// Body substituted whenever nothing recoverable survives extraction.
/// Keeps every downstream compile attempt syntactically valid.
pub const PLACEHOLDER_BODY: &str = "    return None\n";

/// One HumanEval benchmark record. The core pipeline reads only `prompt`
/// and `entry_point`; the remaining fields ride along for the external
/// functional-correctness scorer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HumanEvalRecord {
    pub task_id: String,
    pub prompt: String,
    pub entry_point: String,
    pub canonical_solution: String,
    pub test: String,
}

/// A scored task as persisted to the combined JSONL artifact: the source
/// record plus the raw model text and the normalized completion body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub task_id: String,
    pub prompt: String,
    pub entry_point: String,
    pub canonical_solution: String,
    pub test: String,
    pub raw_text: String,
    pub completion: String,
    #[serde(default)]
    pub compiled: bool,
}

/// Signature plus docstring of a target function, extracted from a
/// benchmark prompt. Always ends with a newline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptStub(String);

impl PromptStub {
    pub fn new(source: String) -> Self {
        PromptStub(source)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Extracted, whitespace-normalized function body text. Never empty: blank
/// input collapses to [`PLACEHOLDER_BODY`] at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedBody(String);

impl NormalizedBody {
    pub fn new(candidate: String) -> Self {
        if candidate.trim().is_empty() {
            NormalizedBody(PLACEHOLDER_BODY.to_string())
        } else {
            NormalizedBody(candidate)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == PLACEHOLDER_BODY
    }
}

/// One normalized completion plus its provenance, as fed to the reducer.
/// Candidates from independent samples of the same task form a pool.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub body: NormalizedBody,
    pub raw_text: String,
    pub compiled: bool,
}

impl Candidate {
    pub fn new(body: NormalizedBody, raw_text: String, compiled: bool) -> Self {
        Self {
            body,
            raw_text,
            compiled,
        }
    }
}

fn default_temperature() -> f32 {
    0.2
}

fn default_top_p() -> f32 {
    1.0
}

fn default_max_tokens() -> u32 {
    512
}

/// Generation parameters forwarded verbatim to the completion endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenParams {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub stop: Option<Vec<String>>,
}

impl Default for GenParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            stop: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_body_collapses_to_placeholder() {
        assert_eq!(NormalizedBody::new(String::new()).as_str(), PLACEHOLDER_BODY);
        assert_eq!(NormalizedBody::new("  \n ".into()).as_str(), PLACEHOLDER_BODY);
        assert!(NormalizedBody::new(String::new()).is_placeholder());
    }

    #[test]
    fn non_blank_body_is_kept_verbatim() {
        let body = NormalizedBody::new("    return a + b".into());
        assert_eq!(body.as_str(), "    return a + b");
        assert!(!body.is_placeholder());
    }
}
