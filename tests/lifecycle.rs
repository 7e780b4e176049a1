use std::sync::Arc;

use notevault::encryption::{EncryptionService, UnlockCache, INVALID_PASSWORD_MESSAGE};
use notevault::notes::{
    FileNoteStore, LifecycleError, NewNote, NoteEncryptionState, NoteLifecycleManager,
};
use tempfile::TempDir;

const PASSWORD: &str = "Tr0ub4dor&3";

async fn setup() -> (TempDir, NoteLifecycleManager<FileNoteStore>) {
    let dir = TempDir::new().unwrap();
    let store = FileNoteStore::new(dir.path().to_path_buf());
    store.init().await.unwrap();

    let manager = NoteLifecycleManager::new(
        Arc::new(store),
        EncryptionService::new(),
        UnlockCache::new(),
    );
    (dir, manager)
}

#[tokio::test]
async fn encrypted_note_never_persists_plaintext() {
    let (dir, manager) = setup().await;
    let note = manager
        .create_note(NewNote::new("alice", "Plans", "secret plan"))
        .await
        .unwrap();

    manager.apply_password(note.id, PASSWORD).await.unwrap();
    assert_eq!(
        manager.state(note.id).await.unwrap(),
        NoteEncryptionState::EncryptedLocked
    );

    let raw = std::fs::read_to_string(dir.path().join("notes").join(format!("{}.json", note.id))).unwrap();
    assert!(!raw.contains("secret plan"));
    assert!(raw.contains("\"isEncrypted\": true"));

    let record = manager.store().read_record(note.id).await.unwrap();
    assert!(record.content.is_empty());
    assert!(record.html_content.is_empty());
    let payload = record.encrypted_data.unwrap();
    assert_eq!(notevault::encryption::from_text(&payload.salt).unwrap().len(), 16);
    assert_eq!(notevault::encryption::from_text(&payload.iv).unwrap().len(), 12);
}

#[tokio::test]
async fn wrong_password_keeps_note_locked() {
    let (_dir, manager) = setup().await;
    let note = manager
        .create_note(NewNote::new("alice", "Plans", "secret plan"))
        .await
        .unwrap();
    manager.apply_password(note.id, PASSWORD).await.unwrap();

    let err = manager.unlock(note.id, "wrong").await.unwrap_err();
    assert!(matches!(err, LifecycleError::Encryption(_)));
    assert_eq!(err.user_message(), INVALID_PASSWORD_MESSAGE);
    assert_eq!(
        manager.state(note.id).await.unwrap(),
        NoteEncryptionState::EncryptedLocked
    );

    let plaintext = manager.unlock(note.id, PASSWORD).await.unwrap();
    assert_eq!(plaintext.as_str(), "secret plan");
    assert_eq!(
        manager.state(note.id).await.unwrap(),
        NoteEncryptionState::EncryptedUnlocked
    );
}

#[tokio::test]
async fn remove_encryption_restores_plaintext_record() {
    let (_dir, manager) = setup().await;
    let note = manager
        .create_note(NewNote::new("alice", "Plans", "secret plan"))
        .await
        .unwrap();
    manager.apply_password(note.id, PASSWORD).await.unwrap();
    manager.unlock(note.id, PASSWORD).await.unwrap();

    let note = manager.remove_encryption(note.id).await.unwrap();
    assert_eq!(manager.state_of(&note), NoteEncryptionState::Plaintext);
    assert!(!manager.unlock_cache().is_unlocked(note.id));

    let record = manager.store().read_record(note.id).await.unwrap();
    assert!(!record.is_encrypted);
    assert!(record.encrypted_data.is_none());
    assert_eq!(record.content, "secret plan");
    assert_eq!(record.html_content, "<p>secret plan</p>");
}

#[tokio::test]
async fn encrypted_notes_survive_reopening_the_store() {
    let (dir, manager) = setup().await;
    let note = manager
        .create_note(NewNote::new("alice", "Diary", "line one\nline two"))
        .await
        .unwrap();
    manager.apply_password(note.id, PASSWORD).await.unwrap();
    drop(manager);

    let store = FileNoteStore::new(dir.path().to_path_buf());
    let reopened = NoteLifecycleManager::new(
        Arc::new(store),
        EncryptionService::new(),
        UnlockCache::new(),
    );

    assert_eq!(
        reopened.state(note.id).await.unwrap(),
        NoteEncryptionState::EncryptedLocked
    );
    let plaintext = reopened.unlock(note.id, PASSWORD).await.unwrap();
    assert_eq!(plaintext.as_str(), "line one\nline two");
}

#[tokio::test]
async fn listing_shows_encrypted_notes_without_content() {
    let (_dir, manager) = setup().await;
    let secret = manager
        .create_note(NewNote::new("alice", "Secret", "hidden"))
        .await
        .unwrap();
    manager
        .create_note(NewNote::new("alice", "Open", "visible"))
        .await
        .unwrap();
    manager.apply_password(secret.id, PASSWORD).await.unwrap();

    let lists = manager.list_notes("alice").await.unwrap();
    assert_eq!(lists.active.len(), 2);

    let listed = lists.active.iter().find(|n| n.id == secret.id).unwrap();
    assert!(listed.is_encrypted());
    assert!(listed.body.content().is_none());
}
