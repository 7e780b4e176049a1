//! Note records, their stores and the encryption lifecycle

mod file_store;
pub mod html;
pub mod lifecycle;
mod models;
pub mod store;

pub use file_store::FileNoteStore;
pub use lifecycle::{LifecycleError, LifecycleResult, NoteEncryptionState, NoteLifecycleManager};
pub use models::*;
pub use store::{InMemoryNoteStore, NoteStore, StoreError, StoreResult};
