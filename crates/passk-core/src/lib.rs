// Domain modules
pub mod config;
pub mod error;
pub mod policy;
pub mod types;

pub use config::EvalConfig;
pub use error::{PasskError, Result};
pub use policy::NormalizePolicy;
pub use types::{
    Candidate, CompletionRecord, GenParams, HumanEvalRecord, NormalizedBody, PromptStub,
    PLACEHOLDER_BODY,
};
