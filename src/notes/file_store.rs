use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use super::models::{sort_for_display, NewNote, Note, NoteRecord, NoteUpdate};
use super::store::{NoteStore, StoreError, StoreResult, Subscribers};

/// Note store keeping one JSON record per note on disk
pub struct FileNoteStore {
    base_path: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
    subscribers: Subscribers,
}

impl FileNoteStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            write_lock: Mutex::new(()),
            subscribers: Subscribers::default(),
        }
    }

    /// Get the default data directory
    pub fn default_data_dir() -> StoreResult<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("notevault"))
            .ok_or_else(|| StoreError::Unavailable("Data directory not found".to_string()))
    }

    /// Initialize storage directories
    pub async fn init(&self) -> StoreResult<()> {
        fs::create_dir_all(self.notes_dir()).await?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn notes_dir(&self) -> PathBuf {
        self.base_path.join("notes")
    }

    fn note_path(&self, id: Uuid) -> PathBuf {
        self.notes_dir().join(format!("{}.json", id))
    }

    /// The record exactly as persisted
    pub async fn read_record(&self, id: Uuid) -> StoreResult<NoteRecord> {
        let path = self.note_path(id);
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a temp file and rename so a record is never half written
    async fn write_record(&self, record: &NoteRecord) -> StoreResult<()> {
        let path = self.note_path(record.id);
        let tmp_path = path.with_extension("json.tmp");

        let content = serde_json::to_string_pretty(record)?;
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    /// Read a file found by a directory scan. Files deleted since the scan
    /// and unparseable files yield `None`.
    async fn read_listed_record(path: &Path) -> StoreResult<Option<NoteRecord>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&content) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                log::warn!("Skipping unparseable note file {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    async fn load_user_notes(&self, user_id: &str) -> StoreResult<Vec<Note>> {
        let notes_dir = self.notes_dir();
        if !fs::try_exists(&notes_dir).await? {
            return Ok(Vec::new());
        }

        let mut notes = Vec::new();
        let mut entries = fs::read_dir(&notes_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let record = match Self::read_listed_record(&path).await? {
                Some(record) => record,
                None => continue,
            };
            if record.user_id != user_id {
                continue;
            }
            match Note::try_from(record) {
                Ok(note) => notes.push(note),
                Err(e) => log::warn!("Skipping inconsistent note file {:?}: {}", path, e),
            }
        }

        sort_for_display(&mut notes);
        Ok(notes)
    }

    async fn notify(&self, user_id: &str) {
        if !self.subscribers.is_watched(user_id) {
            return;
        }
        match self.load_user_notes(user_id).await {
            Ok(notes) => self.subscribers.publish(user_id, notes),
            Err(e) => log::error!("Failed to build note snapshot for {}: {}", user_id, e),
        }
    }
}

#[async_trait]
impl NoteStore for FileNoteStore {
    async fn create(&self, note: NewNote) -> StoreResult<Note> {
        note.validate().map_err(StoreError::InvalidNote)?;
        let note = note.into_note();

        {
            let _guard = self.write_lock.lock().await;
            fs::create_dir_all(self.notes_dir()).await?;
            self.write_record(&NoteRecord::from(&note)).await?;
        }
        self.notify(&note.user_id).await;

        Ok(note)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Note> {
        let record = self.read_record(id).await?;
        Note::try_from(record).map_err(StoreError::InvalidRecord)
    }

    async fn update(&self, id: Uuid, update: NoteUpdate) -> StoreResult<Note> {
        let note = {
            let _guard = self.write_lock.lock().await;
            let record = self.read_record(id).await?;
            let mut note = Note::try_from(record).map_err(StoreError::InvalidRecord)?;

            if !note.apply(update) {
                log::warn!("No valid updates provided for note {}", id);
                return Ok(note);
            }

            self.write_record(&NoteRecord::from(&note)).await?;
            note
        };
        self.notify(&note.user_id).await;

        Ok(note)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let user_id = {
            let _guard = self.write_lock.lock().await;
            let record = self.read_record(id).await?;
            fs::remove_file(self.note_path(id)).await?;
            record.user_id
        };
        self.notify(&user_id).await;
        Ok(())
    }

    async fn list(&self, user_id: &str) -> StoreResult<Vec<Note>> {
        self.load_user_notes(user_id).await
    }

    async fn subscribe(&self, user_id: &str) -> StoreResult<watch::Receiver<Vec<Note>>> {
        let snapshot = self.load_user_notes(user_id).await?;
        Ok(self.subscribers.subscribe(user_id, snapshot))
    }
}
