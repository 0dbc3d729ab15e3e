//! Gemini provider implementation for Antelito
//!
//! Talks to the Gemini `streamGenerateContent` endpoint with `alt=sse`
//! and turns the event stream into incremental text fragments.

use crate::error::{AntelitoError, Result};
use crate::providers::base::{ChunkStream, ContentPart, Message, ModelProvider, Role};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, warn};

/// Default Gemini API base URL
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Streaming Gemini client
pub struct GeminiProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    contents: Vec<WireContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<WireInlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireInlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<WireContent>,
}

impl GeminiProvider {
    /// Creates a new Gemini provider
    ///
    /// # Arguments
    ///
    /// * `api_key` - Gemini API key
    /// * `model` - Model name (e.g. "gemini-2.5-flash")
    /// * `api_base` - Override for the API base URL, mainly for tests
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: String, model: String, api_base: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            api_key,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse&key={}",
            self.api_base, self.model, self.api_key
        )
    }

    fn build_request(
        instruction: &str,
        history: &[Message],
        parts: Vec<ContentPart>,
    ) -> GenerateRequest {
        let mut contents: Vec<WireContent> = history.iter().map(message_to_content).collect();
        contents.push(WireContent {
            role: Some("user".to_string()),
            parts: parts.into_iter().map(part_to_wire).collect(),
        });

        let system_instruction = if instruction.is_empty() {
            None
        } else {
            Some(WireContent {
                role: None,
                parts: vec![WirePart {
                    text: Some(instruction.to_string()),
                    inline_data: None,
                }],
            })
        };

        GenerateRequest {
            system_instruction,
            contents,
        }
    }
}

fn message_to_content(message: &Message) -> WireContent {
    let role = match message.role {
        Role::User => "user",
        Role::Model => "model",
    };
    let mut parts: Vec<WirePart> = message
        .attachments
        .iter()
        .map(|att| WirePart {
            text: None,
            inline_data: Some(WireInlineData {
                mime_type: att.mime_type.clone(),
                data: att.data.clone(),
            }),
        })
        .collect();
    if !message.text.is_empty() || parts.is_empty() {
        parts.push(WirePart {
            text: Some(message.text.clone()),
            inline_data: None,
        });
    }
    WireContent {
        role: Some(role.to_string()),
        parts,
    }
}

fn part_to_wire(part: ContentPart) -> WirePart {
    match part {
        ContentPart::InlineData { mime_type, data } => WirePart {
            text: None,
            inline_data: Some(WireInlineData { mime_type, data }),
        },
        ContentPart::Text { text } => WirePart {
            text: Some(text),
            inline_data: None,
        },
    }
}

/// Extracts the text fragment from one SSE event block
///
/// Concatenates the `data:` lines of the block, parses the payload as a
/// streaming response chunk, and returns the first candidate's text.
/// Returns `None` for keep-alives, `[DONE]` markers, and chunks without
/// text parts.
fn extract_chunk_text(event_block: &str) -> Option<String> {
    let payload: String = event_block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.trim_start())
        .collect::<Vec<_>>()
        .join("\n");

    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }

    let response: GenerateResponse = match serde_json::from_str(&payload) {
        Ok(r) => r,
        Err(e) => {
            warn!("Skipping malformed stream chunk: {}", e);
            return None;
        }
    };

    let text: String = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Parses an SSE byte stream into text fragments on a channel
///
/// Events are separated by blank lines; partial events are buffered
/// across chunks. A transport error ends the stream with one `Err` item.
async fn parse_sse_stream(
    byte_stream: impl Stream<Item = reqwest::Result<Bytes>>,
    tx: mpsc::UnboundedSender<Result<String>>,
) {
    let mut buffer = String::new();

    tokio::pin!(byte_stream);

    while let Some(chunk_result) = byte_stream.next().await {
        let chunk = match chunk_result {
            Ok(c) => c,
            Err(e) => {
                let _ = tx.send(Err(AntelitoError::Provider(format!("stream error: {}", e)).into()));
                return;
            }
        };

        let text = match std::str::from_utf8(&chunk) {
            Ok(s) => s.to_string(),
            Err(_) => continue,
        };

        buffer.push_str(&text);

        while let Some(pos) = buffer.find("\n\n") {
            let event_block = buffer[..pos].to_string();
            buffer = buffer[pos + 2..].to_string();
            if let Some(fragment) = extract_chunk_text(&event_block) {
                if tx.send(Ok(fragment)).is_err() {
                    return;
                }
            }
        }
    }

    // Flush a trailing partial event.
    if !buffer.is_empty() {
        if let Some(fragment) = extract_chunk_text(&buffer) {
            let _ = tx.send(Ok(fragment));
        }
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn stream_message(
        &self,
        instruction: &str,
        history: &[Message],
        parts: Vec<ContentPart>,
    ) -> Result<ChunkStream> {
        let request = Self::build_request(instruction, history, parts);
        debug!(
            "Streaming request to model {} ({} turns)",
            self.model,
            request.contents.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AntelitoError::Provider(format!("HTTP {}: {}", status, body)).into());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let byte_stream = response.bytes_stream();
        tokio::spawn(async move {
            parse_sse_stream(byte_stream, tx).await;
        });

        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}
