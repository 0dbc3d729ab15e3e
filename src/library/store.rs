//! Document store for Antelito
//!
//! Two-tier document sourcing: a remote catalog of global documents fetched
//! over HTTP, and a local sled database that persists the user's own
//! documents between sessions. Also hosts the JSON export/import surface
//! for the whole library.

use crate::error::{AntelitoError, Result};
use crate::library::{Document, Library};
use chrono::Utc;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const LIBRARY_TREE: &str = "antelito_library";
const DOCUMENTS_KEY: &str = "documents";

/// Environment variable overriding the library database location
pub const LIBRARY_DB_ENV: &str = "ANTELITO_LIBRARY_DB";

/// Persistent store for the user tier of the document library
///
/// Backed by a sled database. Only user documents are persisted; the
/// global tier is re-fetched from the catalog at startup.
pub struct DocumentStore {
    db: sled::Db,
}

impl DocumentStore {
    /// Creates a store at the default location
    ///
    /// The location is the `ANTELITO_LIBRARY_DB` environment variable if
    /// set, otherwise the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn new() -> Result<Self> {
        let path = match std::env::var(LIBRARY_DB_ENV) {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_db_path()?,
        };
        Self::new_with_path(&path)
    }

    /// Creates a store at an explicit path
    ///
    /// # Arguments
    ///
    /// * `path` - Directory for the sled database
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn new_with_path(path: &Path) -> Result<Self> {
        debug!("Opening library database at {}", path.display());
        let db = sled::open(path)
            .map_err(|e| AntelitoError::Storage(format!("cannot open database: {}", e)))?;
        Ok(Self { db })
    }

    /// Persists the user tier of the library
    ///
    /// Global documents are filtered out before writing. An empty user
    /// tier clears the stored entry instead of writing an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, library: &Library) -> Result<()> {
        let user_docs = library.user_documents();
        if user_docs.is_empty() {
            return self.clear();
        }

        let tree = self.tree()?;
        let json = serde_json::to_vec(&user_docs)?;
        tree.insert(DOCUMENTS_KEY, json)
            .map_err(|e| AntelitoError::Storage(format!("cannot write documents: {}", e)))?;
        tree.flush()
            .map_err(|e| AntelitoError::Storage(format!("cannot flush database: {}", e)))?;
        debug!("Persisted {} user documents", user_docs.len());
        Ok(())
    }

    /// Loads the persisted user documents, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the stored payload is not
    /// valid JSON.
    pub fn load(&self) -> Result<Option<Vec<Document>>> {
        let tree = self.tree()?;
        let bytes = tree
            .get(DOCUMENTS_KEY)
            .map_err(|e| AntelitoError::Storage(format!("cannot read documents: {}", e)))?;
        match bytes {
            Some(bytes) => {
                let docs: Vec<Document> = serde_json::from_slice(&bytes)?;
                debug!("Loaded {} persisted user documents", docs.len());
                Ok(Some(docs))
            }
            None => Ok(None),
        }
    }

    /// Removes the persisted user documents
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn clear(&self) -> Result<()> {
        let tree = self.tree()?;
        tree.remove(DOCUMENTS_KEY)
            .map_err(|e| AntelitoError::Storage(format!("cannot clear documents: {}", e)))?;
        tree.flush()
            .map_err(|e| AntelitoError::Storage(format!("cannot flush database: {}", e)))?;
        Ok(())
    }

    fn tree(&self) -> Result<sled::Tree> {
        let tree = self
            .db
            .open_tree(LIBRARY_TREE)
            .map_err(|e| AntelitoError::Storage(format!("cannot open tree: {}", e)))?;
        Ok(tree)
    }
}

fn default_db_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "antelito", "antelito")
        .ok_or_else(|| AntelitoError::Storage("cannot determine data directory".to_string()))?;
    Ok(dirs.data_dir().join("library"))
}

/// Fetches the global document catalog
///
/// The catalog is a JSON array of documents. Any failure (unreachable
/// host, non-success status, malformed body) degrades to an empty global
/// tier with a warning rather than blocking startup. Fetched documents
/// come back locked and selected.
///
/// # Arguments
///
/// * `url` - Catalog endpoint
pub async fn fetch_catalog(url: &str) -> Vec<Document> {
    match try_fetch_catalog(url).await {
        Ok(docs) => {
            info!("Fetched {} global documents from catalog", docs.len());
            docs
        }
        Err(e) => {
            warn!("Catalog unavailable, continuing without global documents: {}", e);
            Vec::new()
        }
    }
}

async fn try_fetch_catalog(url: &str) -> Result<Vec<Document>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(AntelitoError::Catalog(format!("HTTP {}", response.status())).into());
    }
    let docs: Vec<Document> = response.json().await?;
    Ok(docs.into_iter().map(Document::into_global).collect())
}

/// Writes the full library to a dated JSON backup file
///
/// The file lands in `dir` as `antelito-backup-<date>.json` and contains
/// every document, both tiers, with their selection and lock flags.
///
/// # Arguments
///
/// * `library` - Library to export
/// * `dir` - Destination directory
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn export_library(library: &Library, dir: &Path) -> Result<PathBuf> {
    let file_name = format!("antelito-backup-{}.json", Utc::now().format("%Y-%m-%d"));
    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(library.documents())?;
    std::fs::write(&path, json)?;
    info!("Exported {} documents to {}", library.len(), path.display());
    Ok(path)
}

/// Parses and validates a library backup payload
///
/// Every element must carry a non-empty id and non-empty content; a
/// single bad element rejects the whole payload.
///
/// # Arguments
///
/// * `json` - Backup file contents
///
/// # Errors
///
/// Returns an error if the payload is not a JSON document array or any
/// element fails validation.
pub fn import_library(json: &str) -> Result<Vec<Document>> {
    let docs: Vec<Document> = serde_json::from_str(json)?;
    for (index, doc) in docs.iter().enumerate() {
        if doc.id.is_empty() {
            return Err(
                AntelitoError::ImportValidation(format!("document {} has an empty id", index))
                    .into(),
            );
        }
        if doc.content.is_empty() {
            return Err(AntelitoError::ImportValidation(format!(
                "document {} ({}) has empty content",
                index, doc.name
            ))
            .into());
        }
    }
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn user_doc(id: &str, name: &str) -> Document {
        Document {
            id: id.to_string(),
            name: name.to_string(),
            doc_type: "txt".to_string(),
            content: "contenido".to_string(),
            is_selected: true,
            read_only: false,
        }
    }

    fn global_doc(id: &str, name: &str) -> Document {
        Document {
            id: id.to_string(),
            name: name.to_string(),
            doc_type: "md".to_string(),
            content: "global".to_string(),
            is_selected: true,
            read_only: true,
        }
    }

    #[test]
    fn test_save_and_load_user_documents() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new_with_path(dir.path()).unwrap();

        let mut library = Library::new();
        library.append(global_doc("g1", "guia.md"));
        library.append(user_doc("u1", "notas.txt"));
        store.save(&library).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "u1");
    }

    #[test]
    fn test_load_without_saved_state_is_none() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new_with_path(dir.path()).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_empty_user_tier_clears_entry() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new_with_path(dir.path()).unwrap();

        let mut library = Library::new();
        library.append(user_doc("u1", "notas.txt"));
        store.save(&library).unwrap();
        assert!(store.load().unwrap().is_some());

        let mut library = Library::new();
        library.append(global_doc("g1", "guia.md"));
        store.save(&library).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_clear_removes_saved_documents() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new_with_path(dir.path()).unwrap();

        let mut library = Library::new();
        library.append(user_doc("u1", "notas.txt"));
        store.save(&library).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_preserves_flags() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::new_with_path(dir.path()).unwrap();

        let mut doc = user_doc("u1", "notas.txt");
        doc.is_selected = false;
        let mut library = Library::new();
        library.append(doc);
        store.save(&library).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert!(!loaded[0].is_selected);
    }

    #[tokio::test]
    async fn test_fetch_catalog_unreachable_degrades_to_empty() {
        let docs = fetch_catalog("http://127.0.0.1:1/catalog.json").await;
        assert!(docs.is_empty());
    }

    #[test]
    fn test_export_library_writes_dated_file() {
        let dir = TempDir::new().unwrap();
        let mut library = Library::new();
        library.append(user_doc("u1", "notas.txt"));

        let path = export_library(&library, dir.path()).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("antelito-backup-"));
        assert!(name.ends_with(".json"));

        let json = std::fs::read_to_string(&path).unwrap();
        let docs: Vec<Document> = serde_json::from_str(&json).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_export_includes_both_tiers() {
        let dir = TempDir::new().unwrap();
        let mut library = Library::new();
        library.append(global_doc("g1", "guia.md"));
        library.append(user_doc("u1", "notas.txt"));

        let path = export_library(&library, dir.path()).unwrap();
        let json = std::fs::read_to_string(&path).unwrap();
        let docs: Vec<Document> = serde_json::from_str(&json).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[0].read_only);
    }

    #[test]
    fn test_export_import_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut library = Library::new();
        library.append(global_doc("g1", "guia.md"));
        let mut unselected = user_doc("u1", "notas.txt");
        unselected.is_selected = false;
        library.append(unselected);

        let path = export_library(&library, dir.path()).unwrap();
        let json = std::fs::read_to_string(&path).unwrap();
        let imported = import_library(&json).unwrap();

        // Importing an export reproduces every document field-for-field
        // (ids may be regenerated on append, so they are not compared)
        assert_eq!(imported.len(), library.len());
        for (original, copy) in library.documents().iter().zip(&imported) {
            assert_eq!(copy.name, original.name);
            assert_eq!(copy.doc_type, original.doc_type);
            assert_eq!(copy.content, original.content);
            assert_eq!(copy.is_selected, original.is_selected);
            assert_eq!(copy.read_only, original.read_only);
        }
    }

    #[test]
    fn test_import_valid_payload() {
        let json = r#"[{"id":"a","name":"n.txt","type":"txt","content":"hola","isSelected":true,"readOnly":false}]"#;
        let docs = import_library(json).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "a");
    }

    #[test]
    fn test_import_rejects_empty_id() {
        let json = r#"[{"id":"","name":"n.txt","type":"txt","content":"hola"}]"#;
        assert!(import_library(json).is_err());
    }

    #[test]
    fn test_import_rejects_empty_content() {
        let json = r#"[{"id":"a","name":"n.txt","type":"txt","content":""}]"#;
        assert!(import_library(json).is_err());
    }

    #[test]
    fn test_import_rejects_non_array() {
        assert!(import_library(r#"{"id":"a"}"#).is_err());
        assert!(import_library("not json").is_err());
    }

    #[test]
    fn test_import_one_bad_element_rejects_all() {
        let json = r#"[
            {"id":"a","name":"n.txt","type":"txt","content":"hola"},
            {"id":"b","name":"m.txt","type":"txt","content":""}
        ]"#;
        assert!(import_library(json).is_err());
    }
}
