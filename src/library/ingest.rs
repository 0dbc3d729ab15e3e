//! Document ingestion for Antelito
//!
//! Turns local files into library documents: extension-based type
//! inference, lossy UTF-8 text extraction, and a pluggable PDF text
//! extractor port.

use crate::error::{AntelitoError, Result};
use crate::library::Document;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Infers a document type label from a file name
///
/// The label is the lowercased file extension; files with no extension
/// are labeled `txt`.
///
/// # Examples
///
/// ```
/// use antelito::library::ingest::infer_doc_type;
///
/// assert_eq!(infer_doc_type("notas.MD"), "md");
/// assert_eq!(infer_doc_type("README"), "txt");
/// ```
pub fn infer_doc_type(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_else(|| "txt".to_string())
}

/// Extracts plain text from PDF bytes
///
/// Implementations return the concatenated text of every page, each page
/// preceded by a `--- Página N ---` marker line (1-based). This is a port:
/// the library manager only cares about getting text back, not about how
/// the PDF was decoded.
#[async_trait]
pub trait PdfExtractor: Send + Sync {
    /// Extracts text from raw PDF bytes
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a readable PDF.
    async fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}

/// Default extractor for builds without PDF support
///
/// Always fails with an ingestion error, so PDF files are dropped from a
/// batch the same way any other unreadable file is.
#[derive(Debug, Default)]
pub struct UnsupportedPdfExtractor;

#[async_trait]
impl PdfExtractor for UnsupportedPdfExtractor {
    async fn extract_text(&self, _bytes: &[u8]) -> Result<String> {
        Err(AntelitoError::Ingestion("PDF extraction is not available in this build".to_string()).into())
    }
}

/// Reads one file from disk and turns it into a document
///
/// PDF files go through the extractor; everything else is read as text
/// with invalid UTF-8 sequences replaced. The resulting document is
/// selected and writable.
///
/// # Arguments
///
/// * `path` - File to ingest
/// * `pdf` - Extractor used for files with a `pdf` extension
///
/// # Errors
///
/// Returns an error if the file cannot be read or, for PDFs, if
/// extraction fails.
pub async fn ingest_file(path: &Path, pdf: &dyn PdfExtractor) -> Result<Document> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AntelitoError::Ingestion(format!("invalid file name: {}", path.display())))?
        .to_string();
    let doc_type = infer_doc_type(&name);

    let content = if doc_type == "pdf" {
        let bytes = fs::read(path).await?;
        pdf.extract_text(&bytes).await?
    } else {
        let bytes = fs::read(path).await?;
        String::from_utf8_lossy(&bytes).into_owned()
    };

    debug!("Ingested {} ({} bytes of text)", name, content.len());
    Ok(Document::new(name, doc_type, content))
}
