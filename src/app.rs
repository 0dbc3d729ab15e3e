//! Application core for Antelito
//!
//! Wires the library manager, the session controller, and the model
//! provider together. Every library mutation flows through here so the
//! chat session is rebuilt whenever the grounding context may have
//! changed.

use crate::error::{AntelitoError, Result};
use crate::library::{store, Capability, LibraryManager};
use crate::providers::{build_parts, Attachment, Message, ModelProvider};
use crate::session::SessionController;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The application core behind the CLI
pub struct App {
    manager: LibraryManager,
    controller: SessionController,
    provider: Box<dyn ModelProvider>,
    capability: Capability,
    in_flight: bool,
}

impl App {
    /// Creates the application and binds the initial session
    ///
    /// # Arguments
    ///
    /// * `manager` - Initialized library manager
    /// * `provider` - Model provider to stream against
    /// * `capability` - Capability of the signed-in user
    pub fn new(
        manager: LibraryManager,
        provider: Box<dyn ModelProvider>,
        capability: Capability,
    ) -> Self {
        let mut controller = SessionController::new();
        controller.rebuild(manager.library());
        Self {
            manager,
            controller,
            provider,
            capability,
            in_flight: false,
        }
    }

    /// Returns the library manager
    pub fn library(&self) -> &crate::library::Library {
        self.manager.library()
    }

    /// Returns the transcript shown to the user
    pub fn transcript(&self) -> &[Message] {
        self.controller.transcript()
    }

    /// Returns the capability of the signed-in user
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Returns the bound session, if any
    pub fn session(&self) -> Option<&crate::session::ChatSession> {
        self.controller.session()
    }

    /// Sends one user turn and streams the reply into the transcript
    ///
    /// The turn is appended to the transcript together with a thinking
    /// placeholder, then the placeholder accumulates stream fragments.
    /// Provider failures never surface as errors: the placeholder is
    /// replaced with a canned apology instead. Fragments are also handed
    /// to `on_fragment` for live display.
    ///
    /// # Errors
    ///
    /// Returns an error if no session is bound or another request is
    /// already in flight.
    pub async fn send_turn<F>(
        &mut self,
        text: &str,
        attachments: Vec<Attachment>,
        mut on_fragment: F,
    ) -> Result<()>
    where
        F: FnMut(&str),
    {
        if self.in_flight {
            return Err(AntelitoError::RequestInFlight.into());
        }
        let session = self.controller.session().ok_or(AntelitoError::NoSession)?;
        let instruction = session.instruction.clone();
        let history = session.history.clone();

        self.in_flight = true;

        let user = Message::user(text, attachments.clone());
        let user_for_history = user.clone();
        self.controller.append(user);
        let placeholder_id = self.controller.append(Message::thinking());
        let generation = self.controller.generation();
        let parts = build_parts(text, &attachments);

        let mut completed = false;
        match self.provider.stream_message(&instruction, &history, parts).await {
            Ok(mut stream) => {
                completed = true;
                while let Some(item) = stream.next().await {
                    if self.controller.generation() != generation {
                        debug!("Dropping stream output from a stale generation");
                        completed = false;
                        break;
                    }
                    match item {
                        Ok(fragment) => {
                            self.controller.append_fragment(&placeholder_id, &fragment);
                            on_fragment(&fragment);
                        }
                        Err(e) => {
                            warn!("Stream failed: {}", e);
                            self.controller.append_error_reply();
                            completed = false;
                            break;
                        }
                    }
                }
            }
            Err(e) => {
                warn!("Model request failed: {}", e);
                self.controller.append_error_reply();
            }
        }

        if completed {
            self.controller.finish_message(&placeholder_id);
            let reply_text = self
                .controller
                .transcript()
                .iter()
                .find(|m| m.id == placeholder_id)
                .map(|m| m.text.clone())
                .unwrap_or_default();
            self.controller
                .record_exchange(user_for_history, Message::model(reply_text));
        }

        self.in_flight = false;
        Ok(())
    }

    /// Ingests files into the library and rebuilds the session
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub async fn add_documents(&mut self, paths: &[PathBuf]) -> Result<usize> {
        let added = self.manager.add_files(paths).await?;
        if added > 0 {
            self.controller.rebuild(self.manager.library());
        }
        Ok(added)
    }

    /// Removes a document and rebuilds the session
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn remove_document(&mut self, id: &str) -> Result<bool> {
        let removed = self.manager.remove(id, self.capability)?;
        if removed {
            self.controller.rebuild(self.manager.library());
        }
        Ok(removed)
    }

    /// Toggles a document's selection and rebuilds the session
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn toggle_document(&mut self, id: &str) -> Result<bool> {
        let toggled = self.manager.toggle_selected(id)?;
        if toggled {
            self.controller.rebuild(self.manager.library());
        }
        Ok(toggled)
    }

    /// Toggles a document's lock flag (admin only)
    ///
    /// The lock flag does not affect the grounding context, so the
    /// session is left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn toggle_lock(&mut self, id: &str) -> Result<bool> {
        self.manager.toggle_locked(id, self.capability)
    }

    /// Exports the library to a dated backup file
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn export_library(&self, dir: &Path) -> Result<PathBuf> {
        store::export_library(self.manager.library(), dir)
    }

    /// Imports a library backup, appending to the live library
    ///
    /// # Errors
    ///
    /// Returns an error if the payload fails validation or persistence
    /// fails.
    pub fn import_library(&mut self, json: &str) -> Result<usize> {
        let documents = store::import_library(json)?;
        let count = self.manager.append_imported(documents)?;
        self.controller.rebuild(self.manager.library());
        Ok(count)
    }

    /// Clears the conversation and starts over
    pub fn reset(&mut self) {
        self.controller.reset(self.manager.library());
    }

    /// Signs in with a capability and binds a fresh session
    pub fn login(&mut self, capability: Capability) {
        info!("Signed in with capability {:?}", capability);
        self.capability = capability;
        self.controller.rebuild(self.manager.library());
    }

    /// Signs out, dropping the session and transcript
    pub fn logout(&mut self) {
        info!("Signed out");
        self.capability = Capability::User;
        self.controller.unbind();
    }
}
