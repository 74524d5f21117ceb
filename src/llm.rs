//! LLM provider abstraction
//!
//! The chat proxy only needs one operation: stream the reply to a prompt.

mod error;
mod gemini;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use gemini::{GeminiService, DEFAULT_GEMINI_MODEL};
pub use types::*;

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Start a generation and stream the reply text as it arrives
    async fn stream(&self, request: &LlmRequest) -> Result<TextStream, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Configuration for the LLM provider
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub gemini_api_key: Option<String>,
    /// Gateway URL; when set the gateway handles authentication
    pub gateway: Option<String>,
    pub model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            gateway: std::env::var("LLM_GATEWAY").ok(),
            model: std::env::var("GEMINI_MODEL").ok(),
        }
    }

    /// Build the configured service, wrapped with logging.
    /// Returns `None` when no credentials are available.
    pub fn build_service(&self) -> Option<Arc<dyn LlmService>> {
        // In gateway mode, use "implicit" as the API key
        let api_key = if self.gateway.is_some() {
            "implicit".to_string()
        } else {
            self.gemini_api_key.clone().filter(|k| !k.is_empty())?
        };

        let model = self.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
        match GeminiService::new(api_key, model, self.gateway.as_deref()) {
            Ok(service) => Some(Arc::new(LoggingService::new(Arc::new(service)))),
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize Gemini service");
                None
            }
        }
    }
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn stream(&self, request: &LlmRequest) -> Result<TextStream, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.stream(request).await;

        match result {
            Ok(stream) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %start.elapsed().as_millis(),
                    prompt_chars = request.prompt.len(),
                    "LLM stream opened"
                );
                let model_id = self.model_id.clone();
                let mut chunks = 0usize;
                let logged = stream.inspect(move |item| match item {
                    Ok(_) => chunks += 1,
                    Err(e) => tracing::error!(
                        model = %model_id,
                        chunks_before_error = chunks,
                        error = %e.message,
                        "LLM stream failed mid-reply"
                    ),
                });
                Ok(logged.boxed())
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %start.elapsed().as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "LLM request failed"
                );
                Err(e)
            }
        }
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_key_no_service() {
        assert!(LlmConfig::default().build_service().is_none());
        let empty = LlmConfig {
            gemini_api_key: Some(String::new()),
            ..LlmConfig::default()
        };
        assert!(empty.build_service().is_none());
    }

    #[test]
    fn test_gateway_needs_no_key() {
        let config = LlmConfig {
            gateway: Some("http://localhost:9/gateway".to_string()),
            ..LlmConfig::default()
        };
        let service = config.build_service().unwrap();
        assert_eq!(service.model_id(), DEFAULT_GEMINI_MODEL);
    }
}
