//! Command handlers for Antelito
//!
//! Hosts the interactive grounded chat loop and the non-interactive
//! library management commands.

use crate::app::App;
use crate::config::Config;
use crate::error::{AntelitoError, Result};
use crate::library::{Capability, DocumentStore, Library, LibraryManager};
use crate::providers::{Attachment, GeminiProvider};
use base64::Engine as _;
use colored::Colorize;
use prettytable::{format, Table};
use std::path::{Path, PathBuf};

/// Builds the application core from configuration
///
/// # Arguments
///
/// * `config` - Validated configuration
/// * `capability` - Capability of the signed-in user
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the API key is
/// missing, or the provider cannot be built.
pub async fn build_app(config: &Config, capability: Capability) -> Result<App> {
    let store = match config.library.storage_path {
        Some(ref path) => DocumentStore::new_with_path(path)?,
        None => DocumentStore::new()?,
    };
    let manager = LibraryManager::init(store, config.library.catalog_url.as_deref()).await?;

    let provider = GeminiProvider::new(
        config.api_key()?,
        config.provider.model.clone(),
        config.provider.api_base.clone(),
    )?;

    Ok(App::new(manager, Box::new(provider), capability))
}

/// Resolves the requested role into a capability
///
/// The admin role requires the password from the configured environment
/// variable; `password` is what the user typed.
///
/// # Errors
///
/// Returns an error for unknown roles, a missing admin password
/// variable, or a wrong password.
pub fn resolve_capability(role: &str, password: Option<&str>, config: &Config) -> Result<Capability> {
    match role {
        "user" => Ok(Capability::User),
        "admin" => {
            let expected = std::env::var(&config.chat.admin_password_env).map_err(|_| {
                AntelitoError::Config(format!(
                    "Admin role requires the {} environment variable",
                    config.chat.admin_password_env
                ))
            })?;
            match password {
                Some(p) if p == expected => Ok(Capability::Admin),
                _ => Err(AntelitoError::Config("Invalid admin password".to_string()).into()),
            }
        }
        other => Err(AntelitoError::Config(format!("Unknown role: {}", other)).into()),
    }
}

/// Resolves the CLI `--role` flag into a capability
///
/// The admin role prompts for the password on the terminal and checks it
/// against the configured environment variable.
///
/// # Errors
///
/// Returns an error for unknown roles or a failed admin check.
pub fn capability_for_cli(role: &str, config: &Config) -> Result<Capability> {
    if role == "admin" {
        let mut rl = rustyline::DefaultEditor::new()?;
        let password = rl.readline("Admin password: ")?;
        resolve_capability(role, Some(password.trim()), config)
    } else {
        resolve_capability(role, None, config)
    }
}

/// Reads an image file into an attachment
///
/// The MIME type is detected from the image bytes, not the extension.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a recognized
/// image format.
pub fn load_attachment(path: &Path) -> Result<Attachment> {
    let bytes = std::fs::read(path)
        .map_err(|e| AntelitoError::Attachment(format!("cannot read {}: {}", path.display(), e)))?;
    let mime_type = image::guess_format(&bytes)
        .map_err(|e| {
            AntelitoError::Attachment(format!("{} is not an image: {}", path.display(), e))
        })?
        .to_mime_type()
        .to_string();
    Ok(Attachment {
        mime_type,
        data: base64::engine::general_purpose::STANDARD.encode(&bytes),
    })
}

/// Renders the library as a table
pub fn format_library_table(library: &Library) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(prettytable::row!["ID", "NAME", "TYPE", "TIER", "ACTIVE"]);
    for doc in library.documents() {
        table.add_row(prettytable::row![
            doc.id,
            doc.name,
            doc.doc_type,
            if doc.read_only { "global" } else { "user" },
            if doc.is_selected { "yes" } else { "no" }
        ]);
    }
    table
}

/// A parsed slash command from the chat loop
#[derive(Debug, Clone, PartialEq)]
pub enum SlashCommand {
    /// Show command help
    Help,
    /// List the library
    Library,
    /// Ingest files
    Add(Vec<PathBuf>),
    /// Toggle a document's selection
    Toggle(String),
    /// Remove a document
    Remove(String),
    /// Toggle a document's lock flag
    Lock(String),
    /// Export the library
    Export(PathBuf),
    /// Import a library backup
    Import(PathBuf),
    /// Send a turn with an image attachment
    Attach { file: PathBuf, text: String },
    /// Clear the conversation
    Reset,
    /// Leave the chat
    Quit,
    /// Unrecognized slash command
    Unknown(String),
}

/// Parses a chat line into a slash command, if it is one
///
/// Lines not starting with `/` are regular chat turns and yield `None`.
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let input = input.trim();
    if !input.starts_with('/') {
        return None;
    }

    let mut words = input.split_whitespace();
    let command = words.next().unwrap_or("/");
    let rest: Vec<&str> = words.collect();

    let parsed = match command {
        "/help" => SlashCommand::Help,
        "/library" => SlashCommand::Library,
        "/add" if !rest.is_empty() => {
            SlashCommand::Add(rest.iter().map(|s| PathBuf::from(*s)).collect())
        }
        "/toggle" if rest.len() == 1 => SlashCommand::Toggle(rest[0].to_string()),
        "/remove" if rest.len() == 1 => SlashCommand::Remove(rest[0].to_string()),
        "/lock" if rest.len() == 1 => SlashCommand::Lock(rest[0].to_string()),
        "/export" => SlashCommand::Export(
            rest.first()
                .map(|s| PathBuf::from(*s))
                .unwrap_or_else(|| PathBuf::from(".")),
        ),
        "/import" if rest.len() == 1 => SlashCommand::Import(PathBuf::from(rest[0])),
        "/attach" if !rest.is_empty() => SlashCommand::Attach {
            file: PathBuf::from(rest[0]),
            text: rest[1..].join(" "),
        },
        "/reset" => SlashCommand::Reset,
        "/quit" | "/exit" => SlashCommand::Quit,
        other => SlashCommand::Unknown(other.to_string()),
    };
    Some(parsed)
}

// Chat command handler
pub mod chat {
    //! Interactive grounded chat loop.
    //!
    //! Builds the application core and runs a readline loop that routes
    //! slash commands to the library and everything else to the model,
    //! streaming reply fragments as they arrive.

    use super::*;
    use crate::session::REQUEST_ERROR_MESSAGE;
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use std::io::Write as _;

    /// Starts the interactive chat
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `role` - Requested role ("user" or "admin")
    ///
    /// # Errors
    ///
    /// Returns an error if setup fails; in-chat failures are shown to
    /// the user and the loop continues.
    pub async fn run_chat(config: Config, role: &str) -> Result<()> {
        tracing::info!("Starting grounded chat");

        let capability = capability_for_cli(role, &config)?;
        let mut rl = DefaultEditor::new()?;

        let mut app = build_app(&config, capability).await?;

        print_welcome(&app);

        loop {
            match rl.readline(&format!("{} ", ">".cyan())) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(trimmed)?;

                    match parse_slash_command(trimmed) {
                        Some(SlashCommand::Quit) => break,
                        Some(command) => {
                            if let Err(e) = handle_slash_command(&mut app, command).await {
                                eprintln!("{}", format!("Error: {}", e).red());
                            }
                        }
                        None => {
                            stream_turn(&mut app, trimmed, Vec::new()).await;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        println!("Hasta luego.");
        Ok(())
    }

    fn print_welcome(app: &App) {
        println!("{}", "Antelito".green().bold());
        println!(
            "Biblioteca: {} documentos ({} activos). Escribe /help para ver los comandos.\n",
            app.library().len(),
            app.library().selected_count()
        );
    }

    async fn stream_turn(app: &mut App, text: &str, attachments: Vec<Attachment>) {
        print!("{} ", "Antelito:".green());
        let _ = std::io::stdout().flush();

        let result = app
            .send_turn(text, attachments, |fragment| {
                print!("{}", fragment);
                let _ = std::io::stdout().flush();
            })
            .await;

        match result {
            Ok(()) => {
                // A failed stream leaves the canned reply in the transcript
                // without ever printing a fragment.
                if let Some(last) = app.transcript().last() {
                    if last.text == REQUEST_ERROR_MESSAGE {
                        print!("{}", last.text.yellow());
                    }
                }
                println!("\n");
            }
            Err(e) => {
                eprintln!("{}", format!("Error: {}", e).red());
            }
        }
    }

    async fn handle_slash_command(app: &mut App, command: SlashCommand) -> Result<()> {
        match command {
            SlashCommand::Help => print_help(),
            SlashCommand::Library => format_library_table(app.library()).printstd(),
            SlashCommand::Add(files) => {
                let added = app.add_documents(&files).await?;
                println!("{} documentos añadidos.", added);
            }
            SlashCommand::Toggle(id) => {
                if app.toggle_document(&id)? {
                    println!("Selección actualizada.");
                } else {
                    println!("No existe un documento con id {}.", id);
                }
            }
            SlashCommand::Remove(id) => {
                if app.remove_document(&id)? {
                    println!("Documento eliminado.");
                } else {
                    println!("No se pudo eliminar {} (¿bloqueado o inexistente?).", id);
                }
            }
            SlashCommand::Lock(id) => {
                if app.toggle_lock(&id)? {
                    println!("Bloqueo actualizado.");
                } else {
                    println!("No se pudo cambiar el bloqueo de {} (requiere admin).", id);
                }
            }
            SlashCommand::Export(dir) => {
                let path = app.export_library(&dir)?;
                println!("Biblioteca exportada a {}.", path.display());
            }
            SlashCommand::Import(file) => {
                let json = std::fs::read_to_string(&file)?;
                let count = app.import_library(&json)?;
                println!("{} documentos importados.", count);
            }
            SlashCommand::Attach { file, text } => {
                let attachment = load_attachment(&file)?;
                stream_turn(app, &text, vec![attachment]).await;
            }
            SlashCommand::Reset => {
                app.reset();
                println!("Conversación reiniciada.");
            }
            SlashCommand::Unknown(name) => {
                println!("Comando desconocido: {}. Escribe /help.", name);
            }
            SlashCommand::Quit => {}
        }
        Ok(())
    }

    fn print_help() {
        println!("Comandos disponibles:");
        println!("  /library              Lista los documentos de la biblioteca");
        println!("  /add <files...>       Añade archivos a la biblioteca");
        println!("  /toggle <id>          Activa o desactiva un documento");
        println!("  /remove <id>          Elimina un documento");
        println!("  /lock <id>            Bloquea o desbloquea un documento (admin)");
        println!("  /export [dir]         Exporta la biblioteca a un archivo JSON");
        println!("  /import <file>        Importa una biblioteca desde un archivo JSON");
        println!("  /attach <file> [text] Envía una imagen con un mensaje opcional");
        println!("  /reset                Reinicia la conversación");
        println!("  /quit                 Salir\n");
    }
}

// Library management commands
pub mod library {
    //! Non-interactive library management.
    //!
    //! These commands operate on the persisted library directly, without
    //! starting a chat session or touching the provider.

    use super::*;
    use crate::cli::LibraryCommand;
    use crate::library::store;

    /// Runs a library subcommand
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration
    /// * `command` - Subcommand to run
    /// * `capability` - Capability of the signed-in user
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the operation
    /// fails.
    pub async fn run_library(
        config: &Config,
        command: LibraryCommand,
        capability: Capability,
    ) -> Result<()> {
        let store = match config.library.storage_path {
            Some(ref path) => DocumentStore::new_with_path(path)?,
            None => DocumentStore::new()?,
        };
        let mut manager =
            LibraryManager::init(store, config.library.catalog_url.as_deref()).await?;

        match command {
            LibraryCommand::List => {
                format_library_table(manager.library()).printstd();
            }
            LibraryCommand::Add { files } => {
                let added = manager.add_files(&files).await?;
                println!("{} documentos añadidos.", added);
            }
            LibraryCommand::Remove { id } => {
                if manager.remove(&id, capability)? {
                    println!("Documento eliminado.");
                } else {
                    println!("No se pudo eliminar {} (¿bloqueado o inexistente?).", id);
                }
            }
            LibraryCommand::Export { dir } => {
                let path = store::export_library(manager.library(), &dir)?;
                println!("Biblioteca exportada a {}.", path.display());
            }
            LibraryCommand::Import { file } => {
                let json = std::fs::read_to_string(&file)?;
                let documents = store::import_library(&json)?;
                let count = manager.append_imported(documents)?;
                println!("{} documentos importados.", count);
            }
        }

        Ok(())
    }
}
