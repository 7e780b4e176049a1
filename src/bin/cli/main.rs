mod app;
mod commands;
mod render;

use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "notevault-cli", about = "Notes with password protection", version)]
struct Cli {
    /// Directory holding note records (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Owner of the notes
    #[arg(long, global = true, default_value = "local")]
    user: String,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Create a note
    New {
        /// Note title
        title: String,
        /// Note text (use "-" to read from stdin)
        #[arg(long)]
        content: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Card color
        #[arg(long)]
        color: Option<String>,
    },

    /// List notes, pinned first
    List {
        /// Show archived notes instead of active ones
        #[arg(long)]
        archived: bool,
    },

    /// Show a note. Encrypted notes show a locked placeholder.
    Show {
        /// Note id (or unique prefix) or title
        note: String,
    },

    /// Protect a note with a password
    Encrypt {
        note: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Print the decrypted text of an encrypted note
    Unlock {
        note: String,
        #[arg(long)]
        password: Option<String>,
    },

    /// Permanently remove password protection from a note
    Decrypt {
        note: String,
        #[arg(long)]
        password: Option<String>,
    },

    /// Generate a random password
    GenPassword {
        #[arg(long, default_value_t = notevault::encryption::DEFAULT_PASSWORD_LENGTH)]
        length: usize,
    },

    /// Toggle the pinned flag
    Pin { note: String },

    /// Toggle the archived flag
    Archive { note: String },

    /// Change the card color
    Color { note: String, color: String },

    /// Delete a note
    Delete { note: String },

    /// Summarize a note with the AI assistant
    Summarize {
        note: String,
        /// Store the summary on the note
        #[arg(long)]
        save: bool,
    },

    /// Improve the grammar and clarity of a note
    Enhance {
        note: String,
        /// Replace the note text with the result
        #[arg(long)]
        apply: bool,
    },

    /// Define a word
    Define { word: String },
}

/// Read content from stdin when given as "-"
fn resolve_content(content: Option<String>) -> anyhow::Result<Option<String>> {
    match content.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buf)
                .context("Failed to read content from stdin")?;
            Ok(Some(buf))
        }
        _ => Ok(content),
    }
}

/// The `--password` value, or one line from stdin
fn resolve_password(password: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
        std::io::stderr().flush().ok();
    }

    let mut line = String::new();
    if stdin.lock().read_line(&mut line).context("Failed to read password")? == 0 {
        bail!("No password given");
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let format = &cli.format;

    if let Command::GenPassword { length } = cli.command {
        return commands::encryption::run_gen_password(length, format);
    }

    let app = app::App::new(cli.config.as_deref(), cli.data_dir, cli.user).await?;

    match cli.command {
        Command::New { title, content, tags, color } => {
            let content = resolve_content(content)?;
            commands::notes::run_new(&app, title, content, tags.as_deref(), color.as_deref(), format)
                .await?;
        }
        Command::List { archived } => {
            commands::notes::run_list(&app, archived, format, use_color).await?;
        }
        Command::Show { note } => {
            commands::notes::run_show(&app, &note, format, use_color).await?;
        }
        Command::Pin { note } => commands::notes::run_pin(&app, &note, format).await?,
        Command::Archive { note } => commands::notes::run_archive(&app, &note, format).await?,
        Command::Color { note, color } => {
            commands::notes::run_color(&app, &note, &color, format).await?;
        }
        Command::Delete { note } => commands::notes::run_delete(&app, &note, format).await?,
        Command::Encrypt { note, password } => {
            let password = resolve_password(password)?;
            commands::encryption::run_encrypt(&app, &note, &password, format).await?;
        }
        Command::Unlock { note, password } => {
            let password = resolve_password(password)?;
            commands::encryption::run_unlock(&app, &note, &password, format).await?;
        }
        Command::Decrypt { note, password } => {
            let password = resolve_password(password)?;
            commands::encryption::run_decrypt(&app, &note, &password, format).await?;
        }
        Command::Summarize { note, save } => {
            commands::ai::run_summarize(&app, &note, save, format).await?;
        }
        Command::Enhance { note, apply } => {
            commands::ai::run_enhance(&app, &note, apply, format).await?;
        }
        Command::Define { word } => commands::ai::run_define(&app, &word, format).await?,
        Command::GenPassword { .. } => unreachable!("handled before loading the store"),
    }

    Ok(())
}
