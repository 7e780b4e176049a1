//! Notes with optional client-side password encryption.
//!
//! Note content can be sealed under a password with PBKDF2-HMAC-SHA256 and
//! AES-256-GCM before it is persisted. Only the payload reaches the store;
//! decrypted text lives in a volatile per-session cache.

pub mod ai;
pub mod config;
pub mod encryption;
pub mod notes;

pub use ai::{AiConfig, AiError, AiService, AiStatus, TextTransform};
pub use config::{AppConfig, ConfigError};
pub use encryption::{EncryptedPayload, EncryptionError, EncryptionService, UnlockCache};
pub use notes::{
    FileNoteStore, InMemoryNoteStore, LifecycleError, NewNote, Note, NoteBody, NoteColor,
    NoteEncryptionState, NoteLifecycleManager, NoteStore,
};
