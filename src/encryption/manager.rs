//! Volatile cache of decrypted note content
//!
//! A note whose plaintext sits in the [`UnlockCache`] is shown as unlocked.
//! Nothing in here is ever persisted; dropping an entry (explicit lock,
//! auto-lock timeout or process exit) puts the note back into its locked
//! state.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use uuid::Uuid;
use zeroize::Zeroizing;

use super::errors::{EncryptionError, EncryptionResult};

/// Default auto-lock timeout (1 hour)
pub const DEFAULT_AUTO_LOCK_TIMEOUT: Duration = Duration::from_secs(3600);

/// Entry in the unlock cache
struct UnlockedEntry {
    plaintext: Zeroizing<String>,
    unlocked_at: Instant,
    last_accessed: Instant,
}

impl UnlockedEntry {
    fn new(plaintext: String) -> Self {
        let now = Instant::now();
        Self {
            plaintext: Zeroizing::new(plaintext),
            unlocked_at: now,
            last_accessed: now,
        }
    }

    fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }

    fn is_expired(&self, timeout: Duration) -> bool {
        self.last_accessed.elapsed() > timeout
    }
}

/// Holds decrypted content for unlocked notes
pub struct UnlockCache {
    entries: RwLock<HashMap<Uuid, UnlockedEntry>>,
    auto_lock_timeout: Duration,
}

impl Default for UnlockCache {
    fn default() -> Self {
        Self::new()
    }
}

impl UnlockCache {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_AUTO_LOCK_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            auto_lock_timeout: timeout,
        }
    }

    pub fn auto_lock_timeout(&self) -> Duration {
        self.auto_lock_timeout
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, UnlockedEntry>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, UnlockedEntry>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cache decrypted content for a note
    pub fn unlock(&self, note_id: Uuid, plaintext: String) {
        self.write().insert(note_id, UnlockedEntry::new(plaintext));
    }

    /// Drop the cached content for a note
    pub fn lock(&self, note_id: Uuid) {
        self.write().remove(&note_id);
    }

    pub fn is_unlocked(&self, note_id: Uuid) -> bool {
        self.read()
            .get(&note_id)
            .map(|entry| !entry.is_expired(self.auto_lock_timeout))
            .unwrap_or(false)
    }

    /// Get the cached plaintext, refreshing the entry's last access time
    pub fn plaintext(&self, note_id: Uuid) -> EncryptionResult<Zeroizing<String>> {
        let mut entries = self.write();

        match entries.get_mut(&note_id) {
            Some(entry) if entry.is_expired(self.auto_lock_timeout) => {
                entries.remove(&note_id);
                log::debug!("Auto-locked note {}", note_id);
                Err(EncryptionError::NoteLocked)
            }
            Some(entry) => {
                entry.touch();
                Ok(entry.plaintext.clone())
            }
            None => Err(EncryptionError::NoteLocked),
        }
    }

    /// Remove the entry and hand its plaintext to the caller
    pub fn take(&self, note_id: Uuid) -> EncryptionResult<Zeroizing<String>> {
        match self.write().remove(&note_id) {
            Some(entry) if !entry.is_expired(self.auto_lock_timeout) => Ok(entry.plaintext),
            _ => Err(EncryptionError::NoteLocked),
        }
    }

    /// How long a note has been unlocked
    pub fn unlocked_for(&self, note_id: Uuid) -> Option<Duration> {
        self.read()
            .get(&note_id)
            .filter(|entry| !entry.is_expired(self.auto_lock_timeout))
            .map(|entry| entry.unlocked_at.elapsed())
    }

    pub fn unlocked_ids(&self) -> Vec<Uuid> {
        self.read()
            .iter()
            .filter(|(_, entry)| !entry.is_expired(self.auto_lock_timeout))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn lock_all(&self) {
        self.write().clear();
    }

    /// Remove expired entries (auto-lock check)
    pub fn cleanup_expired(&self) {
        let timeout = self.auto_lock_timeout;
        self.write().retain(|_, entry| !entry.is_expired(timeout));
    }

    pub fn stats(&self) -> UnlockStats {
        let timeout = self.auto_lock_timeout;
        let unlocked_notes = self
            .read()
            .values()
            .filter(|entry| !entry.is_expired(timeout))
            .count();

        UnlockStats {
            unlocked_notes,
            auto_lock_timeout_secs: self.auto_lock_timeout.as_secs(),
        }
    }
}

/// Statistics about the unlock cache state
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockStats {
    pub unlocked_notes: usize,
    pub auto_lock_timeout_secs: u64,
}
