//! Base provider trait and common types for Antelito
//!
//! This module defines the ModelProvider trait that all model endpoints must
//! implement, along with the transcript message types and the content-part
//! payload shape used for multimodal turns.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use uuid::Uuid;

/// Role of a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message authored by the user
    User,
    /// Message authored by (or on behalf of) the model
    Model,
}

/// An image attachment on an outgoing user message
///
/// Attachments live only in the in-memory transcript; they are never
/// persisted. The payload is base64-encoded binary data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    /// MIME type of the image (e.g. "image/png")
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Base64-encoded binary payload
    pub data: String,
}

/// A message in the chat transcript
///
/// `is_thinking` marks a model message whose text is still empty or partial,
/// pending the first stream chunk. At most one thinking message exists at a
/// time, and it is always the most recently appended model message during an
/// in-flight request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique message id
    pub id: String,
    /// Author role
    pub role: Role,
    /// Message text (accumulates during streaming)
    pub text: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Image attachments (user messages only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// True while the model reply placeholder awaits its first chunk
    #[serde(rename = "isThinking", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_thinking: bool,
}

impl Message {
    /// Creates a user message with optional attachments
    ///
    /// # Examples
    ///
    /// ```
    /// use antelito::providers::{Message, Role};
    ///
    /// let msg = Message::user("Hola", vec![]);
    /// assert_eq!(msg.role, Role::User);
    /// assert!(!msg.is_thinking);
    /// ```
    pub fn user(text: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
            attachments,
            is_thinking: false,
        }
    }

    /// Creates a completed model message
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Model,
            text: text.into(),
            timestamp: Utc::now(),
            attachments: Vec::new(),
            is_thinking: false,
        }
    }

    /// Creates the placeholder model message for an in-flight request
    ///
    /// # Examples
    ///
    /// ```
    /// use antelito::providers::Message;
    ///
    /// let msg = Message::thinking();
    /// assert!(msg.is_thinking);
    /// assert!(msg.text.is_empty());
    /// ```
    pub fn thinking() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Model,
            text: String::new(),
            timestamp: Utc::now(),
            attachments: Vec::new(),
            is_thinking: true,
        }
    }
}

/// One part of an outgoing multimodal payload
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    /// Inline binary data (base64) with its MIME type
    InlineData { mime_type: String, data: String },
    /// Plain text
    Text { text: String },
}

/// Builds the ordered outbound payload for a user turn
///
/// With attachments present the payload is all inline-data parts first (in
/// attachment order), then the text part only if the text is non-empty.
/// Without attachments the payload is a single text part.
///
/// # Examples
///
/// ```
/// use antelito::providers::{build_parts, ContentPart};
///
/// let parts = build_parts("hola", &[]);
/// assert_eq!(parts, vec![ContentPart::Text { text: "hola".to_string() }]);
/// ```
pub fn build_parts(text: &str, attachments: &[Attachment]) -> Vec<ContentPart> {
    if attachments.is_empty() {
        return vec![ContentPart::Text {
            text: text.to_string(),
        }];
    }

    let mut parts: Vec<ContentPart> = attachments
        .iter()
        .map(|att| ContentPart::InlineData {
            mime_type: att.mime_type.clone(),
            data: att.data.clone(),
        })
        .collect();

    if !text.is_empty() {
        parts.push(ContentPart::Text {
            text: text.to_string(),
        });
    }

    parts
}

/// Stream of incremental response text fragments
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Provider trait for streaming model endpoints
///
/// A provider accepts the session's system instruction, the conversation so
/// far, and the current turn's payload parts, and returns a stream of text
/// fragments that the dispatcher accumulates into the placeholder message.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Sends one turn and returns the incremental response stream
    ///
    /// # Arguments
    ///
    /// * `instruction` - System instruction the session was created with
    /// * `history` - Prior transcript messages (excluding the current turn)
    /// * `parts` - Ordered payload parts for the current user turn
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be issued; stream-level
    /// failures surface as `Err` items on the returned stream.
    async fn stream_message(
        &self,
        instruction: &str,
        history: &[Message],
        parts: Vec<ContentPart>,
    ) -> Result<ChunkStream>;
}
