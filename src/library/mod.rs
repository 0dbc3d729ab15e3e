//! Document library for Antelito
//!
//! The library is the source of truth for grounding: an ordered list of
//! documents split into a read-only global tier (fetched from a remote
//! catalog) and a writable user tier (persisted locally). Submodules
//! cover the data model, file ingestion, persistence, and the manager
//! that keeps them in sync.

pub mod document;
pub mod ingest;
pub mod manager;
pub mod store;

pub use document::{Capability, Document, Library};
pub use manager::LibraryManager;
pub use store::DocumentStore;
