//! Library manager for Antelito
//!
//! Owns the in-memory library and keeps it consistent with the document
//! store: the global tier comes from the remote catalog, the user tier
//! from local persistence, and every user-tier mutation is written back.

use crate::error::Result;
use crate::library::ingest::{ingest_file, PdfExtractor, UnsupportedPdfExtractor};
use crate::library::store::{fetch_catalog, DocumentStore};
use crate::library::{Capability, Document, Library};
use futures::future::join_all;
use std::path::PathBuf;
use tracing::{info, warn};

/// Manager over the two-tier document library
///
/// All mutations go through this type so persistence can never drift from
/// the in-memory state. Mutating methods return whether the library
/// actually changed; callers use that to decide whether the chat session
/// needs to be rebuilt.
pub struct LibraryManager {
    library: Library,
    store: DocumentStore,
    pdf: Box<dyn PdfExtractor>,
}

impl LibraryManager {
    /// Initializes the library from the catalog and local persistence
    ///
    /// Global documents are fetched first (degrading to an empty tier if
    /// the catalog is unavailable), then persisted user documents are
    /// appended after them.
    ///
    /// # Arguments
    ///
    /// * `store` - Opened document store
    /// * `catalog_url` - Global catalog endpoint, if configured
    pub async fn init(store: DocumentStore, catalog_url: Option<&str>) -> Result<Self> {
        let mut library = Library::new();

        if let Some(url) = catalog_url {
            library.append_all(fetch_catalog(url).await);
        }

        match store.load() {
            Ok(Some(user_docs)) => {
                info!("Restored {} user documents", user_docs.len());
                library.append_all(user_docs);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Ignoring unreadable persisted library: {}", e);
            }
        }

        Ok(Self {
            library,
            store,
            pdf: Box::new(UnsupportedPdfExtractor),
        })
    }

    /// Replaces the PDF extractor used for ingestion
    pub fn with_pdf_extractor(mut self, pdf: Box<dyn PdfExtractor>) -> Self {
        self.pdf = pdf;
        self
    }

    /// Returns the current library
    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Ingests a batch of files concurrently
    ///
    /// Files are read and extracted in parallel. Files that fail are
    /// logged and dropped; the successful ones are committed to the
    /// library in input order as a single batch, then persisted. Returns
    /// the number of documents added.
    ///
    /// # Errors
    ///
    /// Returns an error only if persisting the updated library fails.
    pub async fn add_files(&mut self, paths: &[PathBuf]) -> Result<usize> {
        let ingestions = paths.iter().map(|path| ingest_file(path, self.pdf.as_ref()));
        let results = join_all(ingestions).await;

        let mut added = Vec::new();
        for (path, result) in paths.iter().zip(results) {
            match result {
                Ok(doc) => added.push(doc),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        if added.is_empty() {
            return Ok(0);
        }

        let count = added.len();
        self.library.append_all(added);
        self.store.save(&self.library)?;
        info!("Added {} documents to the library", count);
        Ok(count)
    }

    /// Removes a document by id, honoring the lock rules
    ///
    /// Returns true if a document was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the updated library fails.
    pub fn remove(&mut self, id: &str, capability: Capability) -> Result<bool> {
        if !self.library.remove(id, capability) {
            return Ok(false);
        }
        self.store.save(&self.library)?;
        Ok(true)
    }

    /// Flips a document's selection flag
    ///
    /// Returns true if the document exists and was toggled.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the updated library fails.
    pub fn toggle_selected(&mut self, id: &str) -> Result<bool> {
        if !self.library.toggle_selected(id) {
            return Ok(false);
        }
        self.store.save(&self.library)?;
        Ok(true)
    }

    /// Flips a document's lock flag (admin only)
    ///
    /// Returns true if the document exists and was toggled.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the updated library fails.
    pub fn toggle_locked(&mut self, id: &str, capability: Capability) -> Result<bool> {
        if !self.library.toggle_locked(id, capability) {
            return Ok(false);
        }
        self.store.save(&self.library)?;
        Ok(true)
    }

    /// Appends an imported document list to the library
    ///
    /// Existing documents stay in place; colliding ids in the payload get
    /// regenerated on append. The payload must already be validated by
    /// [`import_library`](crate::library::store::import_library). Returns
    /// the number of documents appended.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the updated library fails.
    pub fn append_imported(&mut self, documents: Vec<Document>) -> Result<usize> {
        let count = documents.len();
        self.library.append_all(documents);
        self.store.save(&self.library)?;
        info!("Imported {} documents into the library", count);
        Ok(count)
    }
}
