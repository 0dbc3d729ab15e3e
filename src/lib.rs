//! Antelito - Document-grounded AI research assistant library
//!
//! This library provides the core functionality for Antelito: a chat
//! client whose answers are grounded in a two-tier document library.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `library`: Document model, ingestion, persistence, and the manager
//! - `context`: Rendering the selected documents into a grounding blob
//! - `session`: Chat session lifecycle and the transcript
//! - `providers`: Model provider abstraction and the Gemini implementation
//! - `app`: Application core wiring library, session, and provider
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use antelito::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     // Application setup would go here
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod library;
pub mod providers;
pub mod session;

// Re-export commonly used types
pub use app::App;
pub use config::Config;
pub use error::{AntelitoError, Result};
pub use library::{Capability, Document, Library, LibraryManager};
pub use session::{ChatSession, SessionController};
