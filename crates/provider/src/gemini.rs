//! Gemini provider: Google Generative Language API over reqwest.
//!
//! Non-streaming calls POST to `models/{model}:generateContent`; streaming
//! calls POST to `models/{model}:streamGenerateContent?alt=sse` and decode the
//! server-sent events line by line. The API key travels in the
//! `x-goog-api-key` header, never in the URL, so it cannot leak into logs.

use std::future::Future;
use std::pin::Pin;

use futures_util::StreamExt;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::classify::classify_status;
use crate::{ApiKey, CallError, ChunkStream, GenerationRequest, Result, TextProvider};

/// Public API host.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when a request carries no override.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Text-generation provider backed by the Gemini REST API.
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn endpoint(&self, request: &GenerationRequest, streaming: bool) -> String {
        let model = request.config.model.as_deref().unwrap_or(&self.model);
        if streaming {
            format!(
                "{}/v1beta/models/{model}:streamGenerateContent?alt=sse",
                self.base_url
            )
        } else {
            format!("{}/v1beta/models/{model}:generateContent", self.base_url)
        }
    }

    /// Send the request and turn any non-2xx answer into a classified error.
    async fn send(
        &self,
        key: &ApiKey,
        request: &GenerationRequest,
        streaming: bool,
    ) -> Result<reqwest::Response> {
        let url = self.endpoint(request, streaming);
        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, key.expose().as_str())
            .json(&build_body(request))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            let error = classify_status(status.as_u16(), &body);
            debug!(status = status.as_u16(), error = %error, "provider returned error status");
            return Err(error);
        }
        Ok(response)
    }
}

impl TextProvider for GeminiProvider {
    fn id(&self) -> &str {
        "gemini"
    }

    fn generate<'a>(
        &'a self,
        key: &'a ApiKey,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            let response = self.send(key, request, false).await?;
            let body = response.text().await.map_err(transport_error)?;
            let parsed: GenerateResponse =
                serde_json::from_str(&body).map_err(|e| CallError::Server {
                    status: None,
                    message: format!("invalid response body: {e}"),
                })?;
            let text = parsed.text()?;
            if text.trim().is_empty() {
                return Err(CallError::Server {
                    status: None,
                    message: "empty response".into(),
                });
            }
            Ok(text)
        })
    }

    fn generate_stream<'a>(
        &'a self,
        key: &'a ApiKey,
        request: &'a GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChunkStream>> + Send + 'a>> {
        Box::pin(async move {
            let response = self.send(key, request, true).await?;
            Ok(sse_chunks(response))
        })
    }
}

/// Build the `generateContent` request body.
///
/// Search grounding and JSON response mode cannot be combined on this API, so
/// when retrieval is enabled the JSON MIME type is left out and the caller is
/// expected to repair the free-form answer.
pub fn build_body(request: &GenerationRequest) -> serde_json::Value {
    let config = &request.config;
    let mut generation_config = serde_json::json!({
        "maxOutputTokens": config.max_output_tokens,
    });
    if let Some(temperature) = config.temperature {
        generation_config["temperature"] = serde_json::json!(temperature);
    }
    if config.json_mode && !config.use_external_retrieval {
        generation_config["responseMimeType"] = serde_json::json!("application/json");
    }

    let mut body = serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.prompt }],
        }],
        "generationConfig": generation_config,
    });
    if !request.system_instruction.is_empty() {
        body["systemInstruction"] = serde_json::json!({
            "parts": [{ "text": request.system_instruction }],
        });
    }
    if config.use_external_retrieval {
        body["tools"] = serde_json::json!([{ "googleSearch": {} }]);
    }
    body
}

fn transport_error(e: reqwest::Error) -> CallError {
    if e.is_timeout() {
        CallError::Timeout(e.to_string())
    } else {
        CallError::Server {
            status: e.status().map(|s| s.as_u16()),
            message: format!("transport error: {e}"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
    /// Reasoning summaries from thinking models; never part of the answer.
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
}

impl GenerateResponse {
    /// Concatenate the answer text of the first candidate.
    fn text(&self) -> Result<String> {
        if let Some(error) = &self.error {
            let body = serde_json::json!({ "error": { "message": error.message } }).to_string();
            return Err(classify_status(error.code.unwrap_or(500), &body));
        }
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(CallError::Server {
                status: None,
                message: format!("prompt blocked: {reason}"),
            });
        }
        let text = self
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default();
        Ok(text)
    }
}

/// Splits a byte stream into complete lines, holding partial lines (and
/// partial UTF-8 sequences) until the rest arrives.
#[derive(Debug, Default)]
pub struct SseLineDecoder {
    buffer: Vec<u8>,
}

impl SseLineDecoder {
    /// Feed bytes, returning every line completed by them (without `\r\n`).
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            lines.push(decode_line(&line));
        }
        lines
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        Some(decode_line(&rest))
    }
}

fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\r', '\n'])
        .to_string()
}

/// Interpret one SSE line. Returns the text carried by a `data:` event, an
/// error for an in-band error event, or `None` for comments, blank lines and
/// events without text.
pub fn parse_sse_line(line: &str) -> Option<Result<String>> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }
    let event: GenerateResponse = match serde_json::from_str(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "skipping undecodable stream event");
            return None;
        }
    };
    match event.text() {
        Ok(text) if text.is_empty() => None,
        Ok(text) => Some(Ok(text)),
        Err(e) => Some(Err(e)),
    }
}

fn sse_chunks(response: reqwest::Response) -> ChunkStream {
    Box::pin(async_stream::stream! {
        let mut bytes = response.bytes_stream();
        let mut decoder = SseLineDecoder::default();
        while let Some(item) = bytes.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(transport_error(e));
                    return;
                }
            };
            for line in decoder.push(&chunk) {
                match parse_sse_line(&line) {
                    Some(Ok(text)) => yield Ok(text),
                    Some(Err(e)) => {
                        yield Err(e);
                        return;
                    }
                    None => {}
                }
            }
        }
        if let Some(line) = decoder.finish()
            && let Some(event) = parse_sse_line(&line)
        {
            yield event;
        }
    })
}
