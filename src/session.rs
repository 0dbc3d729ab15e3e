//! Chat session lifecycle for Antelito
//!
//! A session binds a system instruction (built from the current library
//! context) to a growing transcript. The controller rebuilds the session
//! whenever the library changes and guards stale streams with a
//! generation counter.

use crate::context::assemble_context;
use crate::library::Library;
use crate::providers::Message;
use tracing::{debug, info};
use uuid::Uuid;

/// Canned reply shown when a model request fails
pub const REQUEST_ERROR_MESSAGE: &str =
    "Lo siento, hubo un error al procesar tu solicitud. Asegúrate de que tu API Key sea válida.";

const PERSONA: &str = "Eres Antelito, un asistente de investigación inteligente y útil. ";

const NO_DOCUMENTS_INSTRUCTION: &str = "Actualmente no hay documentos en la biblioteca. Pide amablemente al usuario que suba documentos (.txt, .md, .csv) para comenzar a analizarlos.";

/// Builds the system instruction for a given context blob
///
/// With a non-blank context the instruction grounds the assistant
/// exclusively in the document library; with a blank one it degrades to
/// asking the user to upload documents.
pub fn build_instruction(context: &str) -> String {
    if context.trim().is_empty() {
        return format!("{}{}", PERSONA, NO_DOCUMENTS_INSTRUCTION);
    }

    format!(
        "{persona}\n\nTU OBJETIVO PRINCIPAL:\n\
         Responder a las preguntas del usuario basándote EXCLUSIVAMENTE en la información proporcionada en la \"Biblioteca de Documentos\" a continuación.\n\n\
         REGLAS:\n\
         1. Si la respuesta se encuentra en los documentos, cítala o parafraséala con precisión.\n\
         2. Si la respuesta NO está en los documentos, di claramente: \"No encontré información sobre eso en tus documentos cargados.\"\n\
         3. No inventes información.\n\
         4. Utiliza formato Markdown para estructurar tus respuestas.\n\n\
         --- INICIO DE BIBLIOTECA DE DOCUMENTOS ---\n\
         {context}\n\
         --- FIN DE BIBLIOTECA DE DOCUMENTOS ---",
        persona = PERSONA,
        context = context
    )
}

/// One bound chat session
///
/// The session's history is what the model sees; it starts empty at every
/// rebind. The transcript shown to the user lives on the controller and
/// survives rebinds.
#[derive(Debug, Clone)]
pub struct ChatSession {
    /// Session id
    pub id: String,
    /// System instruction the session was created with
    pub instruction: String,
    /// Turns exchanged under this session
    pub history: Vec<Message>,
}

impl ChatSession {
    fn new(instruction: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            instruction,
            history: Vec::new(),
        }
    }
}

/// Owns the session and the transcript, and decides when to rebuild
///
/// Rebuilding is unconditional on library change: even if the rendered
/// context is byte-identical, a fresh session is bound. The transcript
/// survives rebuilds; only an explicit reset clears it.
pub struct SessionController {
    session: Option<ChatSession>,
    transcript: Vec<Message>,
    generation: u64,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    /// Creates a controller with no bound session
    pub fn new() -> Self {
        Self {
            session: None,
            transcript: Vec::new(),
            generation: 0,
        }
    }

    /// Returns the bound session, if any
    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    /// Returns the transcript
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Returns the current stream generation
    ///
    /// Streams started under an older generation must drop their output.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rebuilds the session from the current library
    ///
    /// Appends a context-update notice to the transcript when a
    /// conversation is already underway.
    pub fn rebuild(&mut self, library: &Library) {
        let context = assemble_context(library);
        let instruction = build_instruction(&context);
        let session = ChatSession::new(instruction);
        debug!("Bound session {} ({} context bytes)", session.id, context.len());
        self.session = Some(session);

        if !self.transcript.is_empty() {
            let notice = format!(
                "_Contexto actualizado. {} documentos activos._",
                library.selected_count()
            );
            self.transcript.push(Message::model(notice));
        }
    }

    /// Clears the transcript and binds a fresh session
    ///
    /// Bumps the generation so any in-flight stream is orphaned.
    pub fn reset(&mut self, library: &Library) {
        info!("Resetting conversation");
        self.transcript.clear();
        self.generation += 1;
        self.rebuild(library);
    }

    /// Drops the session and transcript entirely
    ///
    /// Bumps the generation so any in-flight stream is orphaned.
    pub fn unbind(&mut self) {
        self.session = None;
        self.transcript.clear();
        self.generation += 1;
    }

    /// Appends a message to the transcript and returns its id
    pub fn append(&mut self, message: Message) -> String {
        let id = message.id.clone();
        self.transcript.push(message);
        id
    }

    /// Appends a stream fragment to the message with the given id
    ///
    /// The first fragment clears the thinking flag. Unknown ids are
    /// ignored, which is what orphans a stale stream's output.
    pub fn append_fragment(&mut self, message_id: &str, fragment: &str) {
        if let Some(message) = self.transcript.iter_mut().find(|m| m.id == message_id) {
            message.is_thinking = false;
            message.text.push_str(fragment);
        }
    }

    /// Appends a fresh model message carrying the canned error reply
    ///
    /// The failed turn's placeholder keeps whatever it accumulated.
    pub fn append_error_reply(&mut self) {
        self.transcript.push(Message::model(REQUEST_ERROR_MESSAGE));
    }

    /// Records a completed exchange in the bound session's history
    pub fn record_exchange(&mut self, user: Message, reply: Message) {
        if let Some(session) = self.session.as_mut() {
            session.history.push(user);
            session.history.push(reply);
        }
    }

    /// Clears a message's thinking flag without touching its text
    pub fn finish_message(&mut self, message_id: &str) {
        if let Some(message) = self.transcript.iter_mut().find(|m| m.id == message_id) {
            message.is_thinking = false;
        }
    }
}
