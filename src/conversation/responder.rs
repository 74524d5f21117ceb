//! External responder used once the script is exhausted

use super::script::AnswerRecord;
use crate::api::ChatRequest;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;

/// Why a responder call produced no reply
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResponderError {
    #[error("responder unreachable: {0}")]
    Network(String),
    #[error("responder returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Produces a free-text reply to a student message
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, message: &str, context: &AnswerRecord)
        -> Result<String, ResponderError>;
}

#[async_trait]
impl<T: Responder + ?Sized> Responder for Arc<T> {
    async fn respond(
        &self,
        message: &str,
        context: &AnswerRecord,
    ) -> Result<String, ResponderError> {
        (**self).respond(message, context).await
    }
}

/// Calls the server's chat endpoint and collects the streamed reply
#[derive(Debug, Clone)]
pub struct HttpResponder {
    client: Client,
    url: String,
}

impl HttpResponder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Responder for HttpResponder {
    async fn respond(
        &self,
        message: &str,
        context: &AnswerRecord,
    ) -> Result<String, ResponderError> {
        let request = ChatRequest {
            message: message.to_string(),
            context: Some(context.clone()),
            is_personalized: true,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ResponderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResponderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // The reply is plain text streamed in arbitrary chunks
        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ResponderError::Network(e.to_string()))?;
            bytes.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
