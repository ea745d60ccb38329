pub mod openai;

use async_trait::async_trait;
use passk_core::{GenParams, Result};

pub use openai::{Choice, CompletionResponse, OpenAiClient};

/// Transport seam between the evaluation runner and any completion backend:
/// instruction string in, raw model text out.
#[async_trait]
pub trait TextCompleter: Send + Sync {
    async fn complete_text(&self, instruction: &str, params: &GenParams) -> Result<String>;
}

#[async_trait]
impl TextCompleter for OpenAiClient {
    async fn complete_text(&self, instruction: &str, params: &GenParams) -> Result<String> {
        self.complete(instruction, params).await
    }
}
