use crate::config::LlmConfig;
use crate::ports::{GenerativeModelPort, StructuredRequest};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// Longest slice of an error body kept in [`Error::Llm`]
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u64,
}

/// OpenAI-compatible chat completion client
///
/// Works against any endpoint speaking the `/chat/completions` dialect,
/// including Gemini's OpenAI compatibility layer and local servers.
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    client: Client,
    config: LlmConfig,
}

impl ChatCompletionClient {
    /// Create a client with its own connection pool and the configured timeout
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("arxiv-digest/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    /// Whether an API key is configured
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::InvalidInput {
                field: "llm.api_key".to_string(),
                reason: "no API key configured (set GOOGLE_API_KEY or OPENAI_API_KEY)".to_string(),
            })
    }
}

fn shorten(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        body.to_string()
    } else {
        let mut short: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        short.push_str("...");
        short
    }
}

#[async_trait]
impl GenerativeModelPort for ChatCompletionClient {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete_structured(&self, request: &StructuredRequest) -> Result<String> {
        let api_key = self.api_key()?;
        let start_time = Instant::now();

        let body = ChatRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: &request.schema_name,
                    strict: true,
                    schema: &request.schema,
                },
            },
        };

        debug!(
            "Calling chat completions at {} ({} prompt chars)",
            self.endpoint(),
            request.user_prompt.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Model request failed: {}", e);
                if e.is_timeout() {
                    Error::Timeout {
                        timeout: self.config.timeout(),
                    }
                } else {
                    Error::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Model endpoint returned HTTP {}", status);
            return Err(Error::Llm {
                status: status.as_u16(),
                message: shorten(&body),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| Error::ModelContract {
            message: format!("unreadable chat completion response: {e}"),
        })?;

        if let Some(usage) = &parsed.usage {
            debug!("Model call used {} tokens", usage.total_tokens);
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| Error::ModelContract {
                message: "response contained no message content".to_string(),
            })?;

        info!("Model call completed in {:?}", start_time.elapsed());
        Ok(content)
    }
}
