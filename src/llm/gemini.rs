//! Google Gemini provider implementation (streaming)

use super::types::{LlmRequest, TextStream};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model used when none is configured
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    api_key: String,
    url: String,
    model_id: String,
}

impl GeminiService {
    pub fn new(api_key: String, model: &str, gateway: Option<&str>) -> Result<Self, LlmError> {
        let url = match gateway {
            Some(gw) => format!(
                "{}/gemini/v1beta/models/{model}:streamGenerateContent?alt=sse",
                gw.trim_end_matches('/'),
            ),
            None => format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{model}:streamGenerateContent?alt=sse"
            ),
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            url,
            model_id: model.to_string(),
        })
    }

    fn translate_request(request: &LlmRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: Some(GeminiGenerationConfig {
                max_output_tokens: request.max_output_tokens,
                temperature: request.temperature,
            }),
        }
    }

    fn request_url(&self) -> String {
        if self.api_key.starts_with("implicit") {
            // Gateway mode - key in URL not needed
            self.url.clone()
        } else {
            format!("{}&key={}", self.url, self.api_key)
        }
    }
}

#[async_trait]
impl LlmService for GeminiService {
    async fn stream(&self, request: &LlmRequest) -> Result<TextStream, LlmError> {
        let gemini_request = Self::translate_request(request);

        let response = self
            .client
            .post(self.request_url())
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map_or(body, |resp| resp.error.message);
            return Err(LlmError::from_status(status.as_u16(), &message));
        }

        let mut decoder = SseDecoder::default();
        let stream = response
            .bytes_stream()
            .map(move |chunk| match chunk {
                Ok(bytes) => decoder.push(&bytes),
                Err(e) => vec![Err(LlmError::network(format!("Stream interrupted: {e}")))],
            })
            .flat_map(futures::stream::iter);

        Ok(stream.boxed())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Incremental decoder for the `alt=sse` response framing.
///
/// Network chunks may split lines (and UTF-8 sequences) anywhere, so bytes
/// are buffered until a full line is available.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<Result<String, LlmError>> {
        self.buffer.extend_from_slice(bytes);

        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            let Some(data) = line.trim_end().strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() {
                continue;
            }

            match serde_json::from_str::<GeminiStreamChunk>(data) {
                Ok(chunk) => {
                    if let Some(error) = chunk.error {
                        out.push(Err(LlmError::server_error(error.message)));
                        continue;
                    }
                    let text = chunk.text();
                    if !text.is_empty() {
                        out.push(Ok(text));
                    }
                }
                Err(e) => out.push(Err(LlmError::unknown(format!(
                    "Failed to parse stream chunk: {e}"
                )))),
            }
        }
        out
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiStreamChunk {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    error: Option<GeminiError>,
}

impl GeminiStreamChunk {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(results: Vec<Result<String, LlmError>>) -> Vec<String> {
        results.into_iter().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_decoder_handles_split_lines() {
        let mut decoder = SseDecoder::default();
        let event = "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Hello\"}]}}]}\r\n\r\n";
        let (head, tail) = event.as_bytes().split_at(20);

        assert!(decoder.push(head).is_empty());
        assert_eq!(texts(decoder.push(tail)), vec!["Hello".to_string()]);
    }

    #[test]
    fn test_decoder_multiple_events_in_one_chunk() {
        let mut decoder = SseDecoder::default();
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Stanford \"}]}}]}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"sounds\"},{\"text\":\" great\"}]}}]}\n\n",
            "data: {\"candidates\":[{\"finishReason\":\"STOP\"}]}\n\n",
        );
        assert_eq!(
            texts(decoder.push(body.as_bytes())),
            vec!["Stanford ".to_string(), "sounds great".to_string()]
        );
    }

    #[test]
    fn test_decoder_reports_inline_errors() {
        let mut decoder = SseDecoder::default();
        let results = decoder.push(b"data: {\"error\":{\"message\":\"quota\"}}\n");
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
    }

    #[test]
    fn test_translate_request_carries_generation_config() {
        let request = LlmRequest::new("hi")
            .with_max_output_tokens(200)
            .with_temperature(0.5);
        let json = serde_json::to_value(GeminiService::translate_request(&request)).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 200);
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
    }

    #[test]
    fn test_gateway_url() {
        let service =
            GeminiService::new("implicit".to_string(), "gemini-x", Some("http://gw/llm/")).unwrap();
        assert_eq!(
            service.request_url(),
            "http://gw/llm/gemini/v1beta/models/gemini-x:streamGenerateContent?alt=sse"
        );
    }
}
