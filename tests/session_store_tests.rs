use chatgate::client_wrapper::{Message, Role};
use chatgate::session_store::{JsonlSessionStore, SessionStore, SessionStoreError};
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_transcripts_survive_reopening() {
    let dir = TempDir::new().unwrap();

    {
        let store = JsonlSessionStore::open(dir.path()).unwrap();
        store
            .append(
                "default_session",
                &[
                    Message::new(Role::User, "courses of student 1?"),
                    Message::new(Role::Assistant, "Math, Physics"),
                ],
            )
            .await
            .unwrap();
    }

    let reopened = JsonlSessionStore::open(dir.path()).unwrap();
    let history = reopened.load("default_session").await.unwrap();
    assert_eq!(
        history,
        vec![
            Message::new(Role::User, "courses of student 1?"),
            Message::new(Role::Assistant, "Math, Physics"),
        ]
    );

    reopened
        .append("default_session", &[Message::new(Role::User, "thanks")])
        .await
        .unwrap();
    let entries = reopened.read_entries("default_session").unwrap();
    let indices: Vec<u64> = entries.iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_distinct_sessions_use_distinct_files() {
    let dir = TempDir::new().unwrap();
    let store = JsonlSessionStore::open(dir.path()).unwrap();

    store
        .append("alice", &[Message::new(Role::User, "hi from alice")])
        .await
        .unwrap();
    store
        .append("bob", &[Message::new(Role::User, "hi from bob")])
        .await
        .unwrap();

    assert_ne!(store.transcript_path("alice"), store.transcript_path("bob"));
    assert!(store.transcript_path("alice").exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    assert_eq!(store.load("alice").await.unwrap().len(), 1);
    assert!(store.load("carol").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_store_creates_missing_directory() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = JsonlSessionStore::open(&nested).unwrap();
    assert!(nested.is_dir());
    assert_eq!(store.dir(), nested.as_path());
}

#[tokio::test]
async fn test_corrupt_line_is_reported() {
    let dir = TempDir::new().unwrap();
    let store = JsonlSessionStore::open(dir.path()).unwrap();
    store
        .append("s", &[Message::new(Role::User, "fine")])
        .await
        .unwrap();

    let path = store.transcript_path("s");
    let mut text = fs::read_to_string(&path).unwrap();
    text.push_str("not json\n");
    fs::write(&path, text).unwrap();

    match store.load("s").await {
        Err(SessionStoreError::Corrupt { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected corrupt transcript, got {:?}", other),
    }
}
