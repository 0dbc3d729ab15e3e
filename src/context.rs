//! Context assembly for grounded chat sessions
//!
//! Renders the selected subset of the library into a single text blob that
//! gets injected as the model's system instruction. The rendering is pure
//! and deterministic, which is what makes session-recreation decisions
//! well-defined: identical libraries always produce byte-identical context.

use crate::library::Library;

/// Renders the selected documents into one grounding context blob
///
/// Each selected document contributes, in library order, a block of the form
/// `--- Documento: {name} ({type}) ---\n{content}\n\n`. An empty selection
/// yields an empty string, which the session controller treats as its own
/// context state.
///
/// # Examples
///
/// ```
/// use antelito::context::assemble_context;
/// use antelito::library::{Document, Library};
///
/// let mut library = Library::new();
/// library.append(Document::new("notas.txt", "txt", "hola"));
/// let context = assemble_context(&library);
/// assert_eq!(context, "--- Documento: notas.txt (txt) ---\nhola\n\n");
/// ```
pub fn assemble_context(library: &Library) -> String {
    let mut context = String::new();
    for doc in library.selected_documents() {
        context.push_str("--- Documento: ");
        context.push_str(&doc.name);
        context.push_str(" (");
        context.push_str(&doc.doc_type);
        context.push_str(") ---\n");
        context.push_str(&doc.content);
        context.push_str("\n\n");
    }
    context
}
