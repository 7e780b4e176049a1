use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use notevault::ai::AiService;
use notevault::config::AppConfig;
use notevault::notes::{FileNoteStore, Note, NoteLifecycleManager, NoteLists};

/// Shared application state for CLI commands
pub struct App {
    pub user_id: String,
    pub notes: NoteLifecycleManager<FileNoteStore>,
    pub ai: AiService,
}

impl App {
    /// Load the config and open the note store
    pub async fn new(config_path: Option<&Path>, data_dir: Option<PathBuf>, user_id: String) -> Result<Self> {
        let config = AppConfig::load(config_path).context("Failed to load config")?;

        let data_dir = match data_dir {
            Some(dir) => dir,
            None => config.data_dir().context("Failed to get data directory")?,
        };
        log::debug!("Using data directory {}", data_dir.display());

        let store = FileNoteStore::new(data_dir);
        store.init().await.context("Failed to initialize note storage")?;

        let notes = NoteLifecycleManager::new(
            Arc::new(store),
            config.encryption_service(),
            config.unlock_cache(),
        );
        let ai = AiService::from_config(&config.ai).context("Failed to set up AI service")?;

        Ok(Self { user_id, notes, ai })
    }

    pub async fn list_notes(&self) -> Result<NoteLists> {
        self.notes
            .list_notes(&self.user_id)
            .await
            .context("Failed to list notes")
    }

    /// Find a note by id, id prefix or title (case-insensitive prefix match)
    pub async fn find_note(&self, query: &str) -> Result<Note> {
        if let Ok(id) = Uuid::parse_str(query) {
            return self.notes.get_note(id).await.context("Failed to load note");
        }

        let lists = self.list_notes().await?;
        let notes: Vec<Note> = lists.active.into_iter().chain(lists.archived).collect();
        let query_lower = query.to_lowercase();

        if let Some(note) = notes.iter().find(|n| n.title.to_lowercase() == query_lower) {
            return Ok(note.clone());
        }

        let matches: Vec<&Note> = notes
            .iter()
            .filter(|n| {
                n.id.to_string().starts_with(&query_lower)
                    || n.title.to_lowercase().starts_with(&query_lower)
            })
            .collect();

        match matches.len() {
            0 => bail!("No note matching '{}'", query),
            1 => Ok(matches[0].clone()),
            _ => bail!(
                "Ambiguous note '{}'. Matches:\n{}",
                query,
                matches
                    .iter()
                    .map(|n| format!("  - {} ({})", n.title, n.id))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }
}
