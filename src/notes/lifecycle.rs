//! Encryption lifecycle of notes
//!
//! A note moves between three states:
//!
//! - `Plaintext`: the record holds editable content.
//! - `EncryptedLocked`: the record holds an [`EncryptedPayload`] and no
//!   plaintext exists in memory.
//! - `EncryptedUnlocked`: still encrypted at rest, with the decrypted text
//!   held in the [`UnlockCache`] for display.
//!
//! Every transition that touches the record is a single store update, and
//! volatile state only changes after the store has confirmed the write.
//!
//! [`EncryptedPayload`]: crate::encryption::EncryptedPayload

use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::encryption::{EncryptionError, EncryptionService, UnlockCache};

use super::html::text_to_html;
use super::models::{NewNote, Note, NoteBody, NoteColor, NoteLists, NoteUpdate};
use super::store::{NoteStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteEncryptionState {
    Plaintext,
    EncryptedLocked,
    EncryptedUnlocked,
}

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Note not found: {0}")]
    NotFound(Uuid),

    #[error("Another encryption change is in progress for note {0}")]
    Busy(Uuid),

    #[error("Note {0} is already encrypted")]
    AlreadyEncrypted(Uuid),

    #[error("Note {0} is not encrypted")]
    NotEncrypted(Uuid),

    #[error("Note {0} is locked. Please unlock with password first.")]
    NoteLocked(Uuid),

    #[error("Note {0} is encrypted and cannot be edited")]
    NoteEncrypted(Uuid),

    #[error(transparent)]
    Encryption(#[from] EncryptionError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LifecycleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

impl LifecycleError {
    /// Text safe to show to the user
    pub fn user_message(&self) -> String {
        match self {
            Self::Encryption(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Marks a note as having a state change in flight
struct BusyGuard<'a> {
    busy: &'a Mutex<HashSet<Uuid>>,
    id: Uuid,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&self.id);
    }
}

/// Owns the plaintext/ciphertext duality of notes in a [`NoteStore`]
pub struct NoteLifecycleManager<S: NoteStore> {
    store: Arc<S>,
    encryption: EncryptionService,
    unlocked: UnlockCache,
    busy: Mutex<HashSet<Uuid>>,
    crypto_supported: OnceLock<bool>,
}

impl<S: NoteStore> NoteLifecycleManager<S> {
    pub fn new(store: Arc<S>, encryption: EncryptionService, unlocked: UnlockCache) -> Self {
        Self {
            store,
            encryption,
            unlocked,
            busy: Mutex::new(HashSet::new()),
            crypto_supported: OnceLock::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn unlock_cache(&self) -> &UnlockCache {
        &self.unlocked
    }

    /// Whether encrypt/decrypt actions should be offered at all
    pub fn is_encryption_available(&self) -> bool {
        *self
            .crypto_supported
            .get_or_init(|| self.encryption.is_crypto_supported())
    }

    fn ensure_crypto(&self) -> LifecycleResult<()> {
        if self.is_encryption_available() {
            Ok(())
        } else {
            Err(EncryptionError::Unsupported.into())
        }
    }

    fn begin(&self, id: Uuid) -> LifecycleResult<BusyGuard<'_>> {
        let mut busy = self.busy.lock().unwrap_or_else(|p| p.into_inner());
        if !busy.insert(id) {
            return Err(LifecycleError::Busy(id));
        }
        Ok(BusyGuard {
            busy: &self.busy,
            id,
        })
    }

    // ===== Encryption state machine =====

    pub async fn state(&self, id: Uuid) -> LifecycleResult<NoteEncryptionState> {
        let note = self.store.get(id).await?;
        Ok(self.state_of(&note))
    }

    pub fn state_of(&self, note: &Note) -> NoteEncryptionState {
        match note.body {
            NoteBody::Plaintext { .. } => NoteEncryptionState::Plaintext,
            NoteBody::Encrypted { .. } if self.unlocked.is_unlocked(note.id) => {
                NoteEncryptionState::EncryptedUnlocked
            }
            NoteBody::Encrypted { .. } => NoteEncryptionState::EncryptedLocked,
        }
    }

    /// Encrypt a plaintext note under `password` (`Plaintext -> EncryptedLocked`)
    pub async fn apply_password(&self, id: Uuid, password: &str) -> LifecycleResult<Note> {
        self.ensure_crypto()?;
        let _guard = self.begin(id)?;

        let note = self.store.get(id).await?;
        self.encrypt_note(&note, password).await
    }

    /// Decrypt a note for viewing (`EncryptedLocked -> EncryptedUnlocked`).
    ///
    /// A wrong password leaves the note locked. No attempt limit applies.
    pub async fn unlock(&self, id: Uuid, password: &str) -> LifecycleResult<Zeroizing<String>> {
        self.ensure_crypto()?;
        let _guard = self.begin(id)?;

        let note = self.store.get(id).await?;
        let payload = note.body.payload().ok_or(LifecycleError::NotEncrypted(id))?;

        let plaintext = Zeroizing::new(self.encryption.decrypt(payload, password).await?);
        self.unlocked.unlock(id, plaintext.to_string());
        log::info!("Unlocked note {}", id);

        Ok(plaintext)
    }

    /// Drop the decrypted copy (`EncryptedUnlocked -> EncryptedLocked`)
    pub fn lock(&self, id: Uuid) {
        self.unlocked.lock(id);
    }

    /// The decrypted text of an unlocked note
    pub fn unlocked_content(&self, id: Uuid) -> LifecycleResult<Zeroizing<String>> {
        self.unlocked
            .plaintext(id)
            .map_err(|_| LifecycleError::NoteLocked(id))
    }

    /// Persist the unlocked plaintext and drop the payload
    /// (`EncryptedUnlocked -> Plaintext`)
    pub async fn remove_encryption(&self, id: Uuid) -> LifecycleResult<Note> {
        let _guard = self.begin(id)?;

        let note = self.store.get(id).await?;
        if !note.is_encrypted() {
            return Err(LifecycleError::NotEncrypted(id));
        }

        let plaintext = self
            .unlocked
            .take(id)
            .map_err(|_| LifecycleError::NoteLocked(id))?;

        match self.persist_plaintext(id, &plaintext).await {
            Ok(note) => Ok(note),
            Err(e) => {
                // The record is still encrypted; keep showing it unlocked
                self.unlocked.unlock(id, plaintext.to_string());
                Err(e)
            }
        }
    }

    /// Encrypt a plaintext note, or permanently decrypt an encrypted one
    pub async fn toggle_encryption(&self, id: Uuid, password: &str) -> LifecycleResult<Note> {
        self.ensure_crypto()?;
        let _guard = self.begin(id)?;

        let note = self.store.get(id).await?;
        match &note.body {
            NoteBody::Plaintext { .. } => self.encrypt_note(&note, password).await,
            NoteBody::Encrypted { payload } => {
                let plaintext = Zeroizing::new(self.encryption.decrypt(payload, password).await?);
                let note = self.persist_plaintext(id, &plaintext).await?;
                self.unlocked.lock(id);
                Ok(note)
            }
        }
    }

    async fn encrypt_note(&self, note: &Note, password: &str) -> LifecycleResult<Note> {
        let content = match &note.body {
            NoteBody::Plaintext { content, .. } => content,
            NoteBody::Encrypted { .. } => return Err(LifecycleError::AlreadyEncrypted(note.id)),
        };

        let payload = self.encryption.encrypt(content, password).await?;
        let updated = self
            .store
            .update(note.id, NoteUpdate::body(NoteBody::Encrypted { payload }))
            .await
            .map_err(|e| {
                log::error!("Failed to persist encryption of note {}: {}", note.id, e);
                LifecycleError::from(e)
            })?;

        self.unlocked.lock(note.id);
        log::info!("Encrypted note {}", note.id);
        Ok(updated)
    }

    async fn persist_plaintext(&self, id: Uuid, plaintext: &str) -> LifecycleResult<Note> {
        let note = self
            .store
            .update(id, NoteUpdate::body(NoteBody::from_text(plaintext)))
            .await
            .map_err(|e| {
                log::error!("Failed to persist decryption of note {}: {}", id, e);
                LifecycleError::from(e)
            })?;

        log::info!("Removed encryption from note {}", id);
        Ok(note)
    }

    // ===== Plain note operations =====

    pub async fn create_note(&self, note: NewNote) -> LifecycleResult<Note> {
        Ok(self.store.create(note).await?)
    }

    pub async fn get_note(&self, id: Uuid) -> LifecycleResult<Note> {
        Ok(self.store.get(id).await?)
    }

    /// Replace the text of a plaintext note. `html_content` defaults to a
    /// rendering of `content`.
    pub async fn update_content(
        &self,
        id: Uuid,
        content: String,
        html_content: Option<String>,
    ) -> LifecycleResult<Note> {
        let _guard = self.begin(id)?;

        let note = self.store.get(id).await?;
        if note.is_encrypted() {
            return Err(LifecycleError::NoteEncrypted(id));
        }

        let html_content = html_content.unwrap_or_else(|| text_to_html(&content));
        let body = NoteBody::Plaintext {
            content,
            html_content,
        };
        Ok(self.store.update(id, NoteUpdate::body(body)).await?)
    }

    pub async fn rename(&self, id: Uuid, title: String) -> LifecycleResult<Note> {
        let update = NoteUpdate {
            title: Some(title),
            ..Default::default()
        };
        Ok(self.store.update(id, update).await?)
    }

    pub async fn set_tags(&self, id: Uuid, tags: Vec<String>) -> LifecycleResult<Note> {
        let update = NoteUpdate {
            tags: Some(tags),
            ..Default::default()
        };
        Ok(self.store.update(id, update).await?)
    }

    pub async fn set_summary(&self, id: Uuid, summary: Option<String>) -> LifecycleResult<Note> {
        let update = NoteUpdate {
            summary: Some(summary),
            ..Default::default()
        };
        Ok(self.store.update(id, update).await?)
    }

    pub async fn toggle_pin(&self, id: Uuid) -> LifecycleResult<Note> {
        let note = self.store.get(id).await?;
        let update = NoteUpdate {
            is_pinned: Some(!note.is_pinned),
            ..Default::default()
        };
        Ok(self.store.update(id, update).await?)
    }

    pub async fn change_color(&self, id: Uuid, color: NoteColor) -> LifecycleResult<Note> {
        let update = NoteUpdate {
            color: Some(color),
            ..Default::default()
        };
        Ok(self.store.update(id, update).await?)
    }

    pub async fn toggle_archive(&self, id: Uuid) -> LifecycleResult<Note> {
        let note = self.store.get(id).await?;
        let update = NoteUpdate {
            is_archived: Some(!note.is_archived),
            ..Default::default()
        };
        Ok(self.store.update(id, update).await?)
    }

    /// Delete a note in any state, forgetting any decrypted copy
    pub async fn delete_note(&self, id: Uuid) -> LifecycleResult<()> {
        let _guard = self.begin(id)?;
        self.store.delete(id).await?;
        self.unlocked.lock(id);
        Ok(())
    }

    pub async fn list_notes(&self, user_id: &str) -> LifecycleResult<NoteLists> {
        Ok(NoteLists::split(self.store.list(user_id).await?))
    }

    pub async fn subscribe(&self, user_id: &str) -> LifecycleResult<watch::Receiver<Vec<Note>>> {
        Ok(self.store.subscribe(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encryption::KdfParams;
    use crate::notes::store::{InMemoryNoteStore, StoreResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// In-memory store whose updates can be made to fail
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryNoteStore,
        fail_updates: AtomicBool,
    }

    #[async_trait]
    impl NoteStore for FlakyStore {
        async fn create(&self, note: NewNote) -> StoreResult<Note> {
            self.inner.create(note).await
        }

        async fn get(&self, id: Uuid) -> StoreResult<Note> {
            self.inner.get(id).await
        }

        async fn update(&self, id: Uuid, update: NoteUpdate) -> StoreResult<Note> {
            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("store unreachable".to_string()));
            }
            self.inner.update(id, update).await
        }

        async fn delete(&self, id: Uuid) -> StoreResult<()> {
            self.inner.delete(id).await
        }

        async fn list(&self, user_id: &str) -> StoreResult<Vec<Note>> {
            self.inner.list(user_id).await
        }

        async fn subscribe(&self, user_id: &str) -> StoreResult<watch::Receiver<Vec<Note>>> {
            self.inner.subscribe(user_id).await
        }
    }

    fn manager() -> NoteLifecycleManager<FlakyStore> {
        NoteLifecycleManager::new(
            Arc::new(FlakyStore::default()),
            EncryptionService::with_params(KdfParams { iterations: 1_000 }),
            UnlockCache::new(),
        )
    }

    async fn secret_note(manager: &NoteLifecycleManager<FlakyStore>) -> Note {
        manager
            .create_note(NewNote::new("user-1", "Plan", "secret plan"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_cycle() {
        let manager = manager();
        let note = secret_note(&manager).await;
        assert_eq!(manager.state(note.id).await.unwrap(), NoteEncryptionState::Plaintext);

        manager.apply_password(note.id, "Tr0ub4dor&3").await.unwrap();
        assert_eq!(
            manager.state(note.id).await.unwrap(),
            NoteEncryptionState::EncryptedLocked
        );

        let text = manager.unlock(note.id, "Tr0ub4dor&3").await.unwrap();
        assert_eq!(text.as_str(), "secret plan");
        assert_eq!(
            manager.state(note.id).await.unwrap(),
            NoteEncryptionState::EncryptedUnlocked
        );

        manager.lock(note.id);
        assert_eq!(
            manager.state(note.id).await.unwrap(),
            NoteEncryptionState::EncryptedLocked
        );

        manager.unlock(note.id, "Tr0ub4dor&3").await.unwrap();
        let restored = manager.remove_encryption(note.id).await.unwrap();
        assert_eq!(restored.body.content(), Some("secret plan"));
        assert_eq!(manager.state(note.id).await.unwrap(), NoteEncryptionState::Plaintext);
    }

    #[tokio::test]
    async fn test_wrong_password_stays_locked() {
        let manager = manager();
        let note = secret_note(&manager).await;
        manager.apply_password(note.id, "right").await.unwrap();

        let err = manager.unlock(note.id, "wrong").await.unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Encryption(EncryptionError::InvalidPasswordOrCorruptData)
        ));
        assert_eq!(err.user_message(), "Invalid password or corrupted data");
        assert_eq!(
            manager.state(note.id).await.unwrap(),
            NoteEncryptionState::EncryptedLocked
        );
        assert!(manager.unlocked_content(note.id).is_err());
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let manager = manager();
        let note = secret_note(&manager).await;

        assert!(matches!(
            manager.unlock(note.id, "pw").await,
            Err(LifecycleError::NotEncrypted(_))
        ));
        assert!(matches!(
            manager.remove_encryption(note.id).await,
            Err(LifecycleError::NotEncrypted(_))
        ));

        manager.apply_password(note.id, "pw").await.unwrap();
        assert!(matches!(
            manager.apply_password(note.id, "pw").await,
            Err(LifecycleError::AlreadyEncrypted(_))
        ));
        assert!(matches!(
            manager.remove_encryption(note.id).await,
            Err(LifecycleError::NoteLocked(_))
        ));
        assert!(matches!(
            manager.update_content(note.id, "edit".into(), None).await,
            Err(LifecycleError::NoteEncrypted(_))
        ));
        assert!(matches!(
            manager.apply_password(Uuid::new_v4(), "pw").await,
            Err(LifecycleError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_apply_password_rolls_back_on_store_failure() {
        let manager = manager();
        let note = secret_note(&manager).await;

        manager.store().fail_updates.store(true, Ordering::SeqCst);
        let err = manager.apply_password(note.id, "pw").await.unwrap_err();
        assert!(matches!(err, LifecycleError::Store(StoreError::Unavailable(_))));

        let stored = manager.get_note(note.id).await.unwrap();
        assert_eq!(stored.body.content(), Some("secret plan"));
        assert_eq!(manager.state(note.id).await.unwrap(), NoteEncryptionState::Plaintext);
    }

    #[tokio::test]
    async fn test_remove_encryption_rolls_back_on_store_failure() {
        let manager = manager();
        let note = secret_note(&manager).await;
        manager.apply_password(note.id, "pw").await.unwrap();
        manager.unlock(note.id, "pw").await.unwrap();

        manager.store().fail_updates.store(true, Ordering::SeqCst);
        assert!(manager.remove_encryption(note.id).await.is_err());

        assert_eq!(
            manager.state(note.id).await.unwrap(),
            NoteEncryptionState::EncryptedUnlocked
        );
        assert_eq!(manager.unlocked_content(note.id).unwrap().as_str(), "secret plan");
        assert!(manager.get_note(note.id).await.unwrap().is_encrypted());

        manager.store().fail_updates.store(false, Ordering::SeqCst);
        let note = manager.remove_encryption(note.id).await.unwrap();
        assert_eq!(note.body.content(), Some("secret plan"));
    }

    #[tokio::test]
    async fn test_busy_note_rejects_second_change() {
        let manager = manager();
        let note = secret_note(&manager).await;

        let guard = manager.begin(note.id).unwrap();
        assert!(matches!(
            manager.apply_password(note.id, "pw").await,
            Err(LifecycleError::Busy(_))
        ));
        assert!(matches!(
            manager.delete_note(note.id).await,
            Err(LifecycleError::Busy(_))
        ));
        drop(guard);

        assert!(manager.apply_password(note.id, "pw").await.is_ok());
    }

    #[tokio::test]
    async fn test_toggle_encryption() {
        let manager = manager();
        let note = secret_note(&manager).await;

        let encrypted = manager.toggle_encryption(note.id, "pw").await.unwrap();
        assert!(encrypted.is_encrypted());

        assert!(manager.toggle_encryption(note.id, "nope").await.is_err());
        assert!(manager.get_note(note.id).await.unwrap().is_encrypted());

        let plain = manager.toggle_encryption(note.id, "pw").await.unwrap();
        assert_eq!(plain.body.content(), Some("secret plan"));
        assert_eq!(
            plain.body,
            NoteBody::Plaintext {
                content: "secret plan".into(),
                html_content: "<p>secret plan</p>".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_delete_forgets_plaintext() {
        let manager = manager();
        let note = secret_note(&manager).await;
        manager.apply_password(note.id, "pw").await.unwrap();
        manager.unlock(note.id, "pw").await.unwrap();

        manager.delete_note(note.id).await.unwrap();
        assert!(!manager.unlock_cache().is_unlocked(note.id));
        assert!(matches!(
            manager.state(note.id).await,
            Err(LifecycleError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_metadata_operations() {
        let manager = manager();
        let note = secret_note(&manager).await;
        manager.apply_password(note.id, "pw").await.unwrap();

        // Metadata stays editable while the body is encrypted
        let note = manager.toggle_pin(note.id).await.unwrap();
        assert!(note.is_pinned);
        let note = manager.change_color(note.id, NoteColor::Yellow).await.unwrap();
        assert_eq!(note.color, NoteColor::Yellow);
        let note = manager.rename(note.id, "Renamed".into()).await.unwrap();
        assert_eq!(note.title, "Renamed");
        let note = manager.set_tags(note.id, vec!["x".into()]).await.unwrap();
        assert_eq!(note.tags, ["x"]);
        let note = manager.set_summary(note.id, Some("s".into())).await.unwrap();
        assert_eq!(note.summary.as_deref(), Some("s"));
        assert!(note.is_encrypted());

        let note = manager.toggle_archive(note.id).await.unwrap();
        let lists = manager.list_notes("user-1").await.unwrap();
        assert!(lists.active.is_empty());
        assert_eq!(lists.archived[0].id, note.id);
    }

    #[tokio::test]
    async fn test_update_content_renders_html() {
        let manager = manager();
        let note = secret_note(&manager).await;

        let note = manager
            .update_content(note.id, "new <text>".into(), None)
            .await
            .unwrap();
        assert_eq!(
            note.body,
            NoteBody::Plaintext {
                content: "new <text>".into(),
                html_content: "<p>new &lt;text&gt;</p>".into(),
            }
        );
    }

    #[test]
    fn test_encryption_available() {
        assert!(manager().is_encryption_available());
    }
}
