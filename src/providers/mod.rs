//! Model providers for Antelito
//!
//! The provider layer hides the wire protocol behind [`ModelProvider`];
//! the rest of the application only sees messages in and text fragments
//! out.

pub mod base;
pub mod gemini;

pub use base::{build_parts, Attachment, ChunkStream, ContentPart, Message, ModelProvider, Role};
pub use gemini::GeminiProvider;
