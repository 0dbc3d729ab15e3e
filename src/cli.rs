//! Command-line interface definition for Antelito
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the interactive chat command and library management
//! commands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Antelito - Document-grounded AI research assistant
///
/// Chat with a model that answers exclusively from your document
/// library: a read-only global tier plus your own uploaded files.
#[derive(Parser, Debug, Clone)]
#[command(name = "antelito")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the model from config
    #[arg(short, long)]
    pub model: Option<String>,

    /// Override the global catalog URL from config
    #[arg(long)]
    pub catalog_url: Option<String>,

    /// Override the library database directory from config
    #[arg(long)]
    pub storage_path: Option<PathBuf>,

    /// Role to start with (user, admin)
    #[arg(short, long, default_value = "user")]
    pub role: String,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Antelito
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive grounded chat
    Chat,

    /// Manage the document library
    Library {
        /// Library management subcommand
        #[command(subcommand)]
        command: LibraryCommand,
    },
}

/// Library management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum LibraryCommand {
    /// List the documents in the library
    List,

    /// Add files to the library
    Add {
        /// Files to ingest
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Remove a document by id
    Remove {
        /// Document id
        id: String,
    },

    /// Export the library to a JSON backup file
    Export {
        /// Destination directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },

    /// Import a library from a JSON backup file
    Import {
        /// Backup file to import
        file: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_command() {
        let cli = Cli::parse_from(["antelito", "chat"]);
        assert!(matches!(cli.command, Commands::Chat));
        assert_eq!(cli.role, "user");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_parse_role_override() {
        let cli = Cli::parse_from(["antelito", "--role", "admin", "chat"]);
        assert_eq!(cli.role, "admin");
    }

    #[test]
    fn test_parse_model_override() {
        let cli = Cli::parse_from(["antelito", "--model", "gemini-2.0-pro", "chat"]);
        assert_eq!(cli.model.as_deref(), Some("gemini-2.0-pro"));
    }

    #[test]
    fn test_parse_library_add() {
        let cli = Cli::parse_from(["antelito", "library", "add", "a.txt", "b.md"]);
        match cli.command {
            Commands::Library {
                command: LibraryCommand::Add { files },
            } => assert_eq!(files.len(), 2),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_library_add_requires_files() {
        assert!(Cli::try_parse_from(["antelito", "library", "add"]).is_err());
    }

    #[test]
    fn test_parse_library_export_default_dir() {
        let cli = Cli::parse_from(["antelito", "library", "export"]);
        match cli.command {
            Commands::Library {
                command: LibraryCommand::Export { dir },
            } => assert_eq!(dir, PathBuf::from(".")),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
