//! Document and library types for Antelito
//!
//! This module defines the source document data model and the ordered
//! library that holds it, along with the capability type that gates
//! administrator-only mutations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A source document in the library
///
/// Documents hold decoded text content only; binary formats (PDF) are
/// extracted to text before a `Document` is created. The serialized wire
/// names match the remote catalog and export/backup JSON format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Opaque unique token, assigned at ingestion time, never reused
    pub id: String,
    /// Original file name
    pub name: String,
    /// Type tag inferred from the file extension (e.g. "pdf", "txt", "md")
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Full decoded text content
    pub content: String,
    /// Whether this document is included in the next assembled context
    #[serde(rename = "isSelected", default)]
    pub is_selected: bool,
    /// True for administrator/global documents sourced from the remote catalog
    #[serde(rename = "readOnly", default)]
    pub read_only: bool,
}

impl Document {
    /// Creates a new user document with a fresh id
    ///
    /// User documents start selected and writable.
    ///
    /// # Examples
    ///
    /// ```
    /// use antelito::library::Document;
    ///
    /// let doc = Document::new("notes.md", "md", "# Notes");
    /// assert!(doc.is_selected);
    /// assert!(!doc.read_only);
    /// ```
    pub fn new(
        name: impl Into<String>,
        doc_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            doc_type: doc_type.into(),
            content: content.into(),
            is_selected: true,
            read_only: false,
        }
    }

    /// Marks this document as a global catalog entry
    ///
    /// Catalog records arrive without selection/lock flags; the store tags
    /// every fetched record as read-only and selected by default.
    pub fn into_global(mut self) -> Self {
        self.read_only = true;
        self.is_selected = true;
        self
    }
}

/// Caller capability for library mutations
///
/// Administrator-only operations (removing or unlocking global documents)
/// take the capability as an explicit parameter rather than reading ambient
/// role state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Regular user: may mutate only non-read-only documents
    User,
    /// Administrator: may remove and lock/unlock any document
    Admin,
}

impl Capability {
    /// Returns true for the administrator capability
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Ordered document library
///
/// Holds global (read-only) documents first, then user documents, with
/// insertion order preserved within each tier. Document ids are unique
/// within the library at any instant: appending a document whose id is
/// already present assigns it a fresh id instead of overwriting.
#[derive(Debug, Clone, Default)]
pub struct Library {
    documents: Vec<Document>,
}

impl Library {
    /// Creates an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a library from a sequence of documents, applying the id
    /// uniqueness policy in order
    pub fn from_documents(documents: Vec<Document>) -> Self {
        let mut library = Self::new();
        library.append_all(documents);
        library
    }

    /// All documents in library order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Number of documents in the library
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when the library holds no documents
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of currently selected documents
    pub fn selected_count(&self) -> usize {
        self.documents.iter().filter(|d| d.is_selected).count()
    }

    /// Looks up a document by id
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// The non-read-only (user) subset, in order
    ///
    /// This is the slice that gets persisted locally; global documents are
    /// re-fetched from the catalog on every load.
    pub fn user_documents(&self) -> Vec<Document> {
        self.documents
            .iter()
            .filter(|d| !d.read_only)
            .cloned()
            .collect()
    }

    /// The selected subset, in order
    pub fn selected_documents(&self) -> Vec<&Document> {
        self.documents.iter().filter(|d| d.is_selected).collect()
    }

    /// Appends a document, regenerating its id on collision
    ///
    /// Ids must stay unique across both tiers. A colliding incoming id is
    /// replaced with a fresh one rather than silently overwriting an
    /// existing document (which could drop a read-only global).
    pub fn append(&mut self, mut document: Document) {
        if self.get(&document.id).is_some() {
            let fresh = Uuid::new_v4().to_string();
            tracing::warn!(
                "Document id collision for '{}' ({}); assigned fresh id {}",
                document.name,
                document.id,
                fresh
            );
            document.id = fresh;
        }
        self.documents.push(document);
    }

    /// Appends a batch of documents in order
    pub fn append_all(&mut self, documents: Vec<Document>) {
        for document in documents {
            self.append(document);
        }
    }

    /// Removes the document with the given id
    ///
    /// Read-only documents are only removable with the administrator
    /// capability; otherwise the call is a no-op. Returns true when a
    /// document was removed.
    pub fn remove(&mut self, id: &str, capability: Capability) -> bool {
        let Some(pos) = self.documents.iter().position(|d| d.id == id) else {
            return false;
        };
        if self.documents[pos].read_only && !capability.is_admin() {
            tracing::warn!("Refusing to remove read-only document {} without admin", id);
            return false;
        }
        self.documents.remove(pos);
        true
    }

    /// Flips the selection flag of the document with the given id
    ///
    /// Always permitted regardless of capability or lock state. Returns
    /// true when a document was found.
    pub fn toggle_selected(&mut self, id: &str) -> bool {
        match self.documents.iter_mut().find(|d| d.id == id) {
            Some(doc) => {
                doc.is_selected = !doc.is_selected;
                true
            }
            None => false,
        }
    }

    /// Flips the read-only flag of the document with the given id
    ///
    /// Administrator-only; a no-op without the capability. Returns true
    /// when the flag was flipped.
    pub fn toggle_locked(&mut self, id: &str, capability: Capability) -> bool {
        if !capability.is_admin() {
            tracing::warn!("Refusing to toggle lock on {} without admin", id);
            return false;
        }
        match self.documents.iter_mut().find(|d| d.id == id) {
            Some(doc) => {
                doc.read_only = !doc.read_only;
                true
            }
            None => false,
        }
    }
}
