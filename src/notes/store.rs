//! Note store abstraction and the in-memory implementation

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use super::models::{sort_for_display, NewNote, Note, NoteRecord, NoteUpdate};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Note not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid note record: {0}")]
    InvalidRecord(String),

    #[error("Invalid note data: {0}")]
    InvalidNote(String),

    #[error("Note store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Document store holding note records.
///
/// `update` is the single atomic write used for every encryption state
/// change: either the whole update is persisted or none of it is.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn create(&self, note: NewNote) -> StoreResult<Note>;

    async fn get(&self, id: Uuid) -> StoreResult<Note>;

    /// Apply a partial update. An empty update returns the note unchanged.
    async fn update(&self, id: Uuid, update: NoteUpdate) -> StoreResult<Note>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;

    /// All notes of a user, pinned first and then newest first
    async fn list(&self, user_id: &str) -> StoreResult<Vec<Note>>;

    /// Live snapshots of a user's notes in display order
    async fn subscribe(&self, user_id: &str) -> StoreResult<watch::Receiver<Vec<Note>>>;
}

/// Snapshot channels, one per subscribed user
#[derive(Default)]
pub struct Subscribers {
    channels: Mutex<HashMap<String, watch::Sender<Vec<Note>>>>,
}

impl Subscribers {
    pub fn subscribe(&self, user_id: &str, snapshot: Vec<Note>) -> watch::Receiver<Vec<Note>> {
        let mut channels = self.channels.lock().unwrap_or_else(|p| p.into_inner());
        match channels.get(user_id) {
            Some(sender) => {
                sender.send_replace(snapshot);
                sender.subscribe()
            }
            None => {
                let (sender, receiver) = watch::channel(snapshot);
                channels.insert(user_id.to_string(), sender);
                receiver
            }
        }
    }

    pub fn is_watched(&self, user_id: &str) -> bool {
        let channels = self.channels.lock().unwrap_or_else(|p| p.into_inner());
        channels
            .get(user_id)
            .map(|sender| sender.receiver_count() > 0)
            .unwrap_or(false)
    }

    pub fn publish(&self, user_id: &str, snapshot: Vec<Note>) {
        let mut channels = self.channels.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(sender) = channels.get(user_id) {
            if sender.send(snapshot).is_err() {
                // Every receiver is gone
                channels.remove(user_id);
            }
        }
    }
}

/// Store that keeps records in memory, for tests and ephemeral sessions
#[derive(Default)]
pub struct InMemoryNoteStore {
    records: RwLock<HashMap<Uuid, NoteRecord>>,
    subscribers: Subscribers,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The record exactly as persisted
    pub async fn record(&self, id: Uuid) -> StoreResult<NoteRecord> {
        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn snapshot(records: &HashMap<Uuid, NoteRecord>, user_id: &str) -> StoreResult<Vec<Note>> {
        let mut notes = records
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .map(|record| Note::try_from(record).map_err(StoreError::InvalidRecord))
            .collect::<StoreResult<Vec<_>>>()?;
        sort_for_display(&mut notes);
        Ok(notes)
    }

    fn notify(&self, records: &HashMap<Uuid, NoteRecord>, user_id: &str) {
        if !self.subscribers.is_watched(user_id) {
            return;
        }
        match Self::snapshot(records, user_id) {
            Ok(notes) => self.subscribers.publish(user_id, notes),
            Err(e) => log::error!("Failed to build note snapshot for {}: {}", user_id, e),
        }
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn create(&self, note: NewNote) -> StoreResult<Note> {
        note.validate().map_err(StoreError::InvalidNote)?;
        let note = note.into_note();

        let mut records = self.records.write().await;
        records.insert(note.id, NoteRecord::from(&note));
        self.notify(&records, &note.user_id);

        Ok(note)
    }

    async fn get(&self, id: Uuid) -> StoreResult<Note> {
        let record = self.record(id).await?;
        Note::try_from(record).map_err(StoreError::InvalidRecord)
    }

    async fn update(&self, id: Uuid, update: NoteUpdate) -> StoreResult<Note> {
        let mut records = self.records.write().await;
        let record = records.get(&id).cloned().ok_or(StoreError::NotFound(id))?;
        let mut note = Note::try_from(record).map_err(StoreError::InvalidRecord)?;

        if !note.apply(update) {
            log::warn!("No valid updates provided for note {}", id);
            return Ok(note);
        }

        records.insert(id, NoteRecord::from(&note));
        self.notify(&records, &note.user_id);

        Ok(note)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let record = records.remove(&id).ok_or(StoreError::NotFound(id))?;
        self.notify(&records, &record.user_id);
        Ok(())
    }

    async fn list(&self, user_id: &str) -> StoreResult<Vec<Note>> {
        let records = self.records.read().await;
        Self::snapshot(&records, user_id)
    }

    async fn subscribe(&self, user_id: &str) -> StoreResult<watch::Receiver<Vec<Note>>> {
        let records = self.records.read().await;
        let snapshot = Self::snapshot(&records, user_id)?;
        Ok(self.subscribers.subscribe(user_id, snapshot))
    }
}
