use passk_core::{GenParams, PasskError, Result};
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = "You are a precise Python coding assistant. Reply with code only.";

/// Client for an OpenAI-compatible completion endpoint (`/v1` style).
/// Speaks either `/completions` or `/chat/completions` depending on
/// `use_chat`; the rest of the system only sees "string in, string out".
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_base: String,
    api_key: String,
    model: String,
    use_chat: bool,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub role: String,
    pub content: Option<String>,
}

impl Choice {
    /// Resolved text of this choice, whichever endpoint produced it.
    pub fn resolved_text(&self) -> String {
        if let Some(message) = &self.message {
            if let Some(content) = &message.content {
                return content.clone();
            }
        }
        self.text.clone().unwrap_or_default()
    }
}

/// Char-safe prefix for error messages carrying response bodies.
fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

impl OpenAiClient {
    pub fn new(api_base: &str, api_key: &str, model: &str, use_chat: bool) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            use_chat,
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Probe `/models` for connectivity.
    pub async fn health(&self) -> Result<u16> {
        let url = format!("{}/models", self.api_base);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| PasskError::Http(e.to_string()))?;
        Ok(resp.status().as_u16())
    }

    /// Send one instruction and return the first choice's text.
    pub async fn complete(&self, instruction: &str, params: &GenParams) -> Result<String> {
        let body = if self.use_chat {
            self.post_json(
                "chat/completions",
                &ChatRequest {
                    model: &self.model,
                    messages: vec![
                        ChatMessage {
                            role: "system",
                            content: SYSTEM_PROMPT,
                        },
                        ChatMessage {
                            role: "user",
                            content: instruction,
                        },
                    ],
                    max_tokens: params.max_tokens,
                    temperature: params.temperature,
                    top_p: params.top_p,
                    stop: params.stop.as_deref(),
                },
            )
            .await?
        } else {
            self.post_json(
                "completions",
                &CompletionRequest {
                    model: &self.model,
                    prompt: instruction,
                    max_tokens: params.max_tokens,
                    temperature: params.temperature,
                    top_p: params.top_p,
                    stop: params.stop.as_deref(),
                },
            )
            .await?
        };

        let resp: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            PasskError::Http(format!(
                "Failed to parse response: {} - Body: {}",
                e,
                truncate(&body, 500)
            ))
        })?;

        let choice = resp
            .choices
            .first()
            .ok_or_else(|| PasskError::Api("Response carried no choices".to_string()))?;
        Ok(choice.resolved_text())
    }

    async fn post_json<T: Serialize>(&self, path: &str, request: &T) -> Result<String> {
        let url = format!("{}/{}", self.api_base, path);
        tracing::debug!(%url, model = %self.model, "sending completion request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| PasskError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(PasskError::Api(format!(
                "Completion failed: {} - {}",
                status,
                truncate(&text, 400)
            )));
        }

        resp.text().await.map_err(|e| PasskError::Http(e.to_string()))
    }
}
