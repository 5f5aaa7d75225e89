//! src/cli.rs
//! ============================================================================
//! # Command line surface
//!
//! `storage list [FOLDER_ID]` prints one line per entry; `storage tui` (the
//! default) starts the interactive browser.

use std::{io::Write, path::PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use crate::{
    backend::ROOT_FOLDER_ID, error::AppError, model::entry::Entry, service::ListingService,
    view::icons,
};

#[derive(Debug, Parser)]
#[command(name = "storage", version, about = "Browse cloud storage from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Storage provider to browse
    #[arg(long, value_enum, default_value_t = BackendKind::Drive, global = true)]
    pub backend: BackendKind,

    /// Root directory for the local backend
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the contents of a folder
    List {
        /// Folder id; the root folder when omitted
        #[arg(default_value = ROOT_FOLDER_ID)]
        folder_id: String,
    },

    /// Launch the interactive browser
    Tui,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Google Drive
    Drive,

    /// Local filesystem
    Local,
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Tui)
    }
}

/// `📁 Docs` or `   notes.txt`.
#[must_use]
pub fn format_list_line(entry: &Entry) -> String {
    format!("{}{}", icons::icon_for(entry.is_folder()), entry.name())
}

/// List `folder_id` and write one line per entry to `out`.
pub async fn run_list<W: Write>(
    service: &ListingService,
    folder_id: &str,
    out: &mut W,
) -> Result<usize, AppError> {
    let entries = service.list_folder(folder_id).await?;

    for entry in &entries {
        writeln!(out, "{}", format_list_line(entry))?;
    }
    out.flush()?;

    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_defaults_to_root() {
        let cli = Cli::parse_from(["storage", "list"]);
        match cli.command() {
            Command::List { folder_id } => assert_eq!(folder_id, "root"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(cli.backend, BackendKind::Drive);
    }

    #[test]
    fn tui_is_the_default_command() {
        let cli = Cli::parse_from(["storage", "--backend", "local", "--root", "/tmp"]);
        assert!(matches!(cli.command(), Command::Tui));
        assert_eq!(cli.backend, BackendKind::Local);
        assert_eq!(cli.root.as_deref(), Some(std::path::Path::new("/tmp")));
    }

    #[test]
    fn list_line_format() {
        assert_eq!(format_list_line(&Entry::drive_folder("f1", "Docs")), "📁 Docs");
        assert_eq!(
            format_list_line(&Entry::drive_file("n1", "notes.txt", "text/plain", 120)),
            "   notes.txt"
        );
    }
}
