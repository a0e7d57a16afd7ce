//! # Generative Model Port

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

/// One structured-output completion request
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    /// Model name understood by the endpoint
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Name the endpoint reports the schema under
    pub schema_name: String,
    /// JSON schema the response content must satisfy
    pub schema: Value,
}

/// Language model able to answer with JSON matching a schema
#[async_trait]
pub trait GenerativeModelPort: Send + Sync {
    /// Issue exactly one completion and return the raw message content
    ///
    /// The content is not parsed here; callers validate it against their own
    /// output type.
    async fn complete_structured(&self, request: &StructuredRequest) -> Result<String>;
}
