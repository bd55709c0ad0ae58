//! Tests for the RowEngine contract on the in-memory engine.

use tessera::engine::{InMemory, RowEngine};

#[tokio::test]
async fn test_get_absent_row_is_none() {
    let engine = InMemory::new();
    assert_eq!(engine.get_row("users", "missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_put_then_get_round_trip() {
    let engine = InMemory::new();
    engine.put_row("users", "k", b"v1".to_vec()).await.unwrap();
    assert_eq!(
        engine.get_row("users", "k").await.unwrap(),
        Some(b"v1".to_vec())
    );

    // put replaces
    engine.put_row("users", "k", b"v2".to_vec()).await.unwrap();
    assert_eq!(
        engine.get_row("users", "k").await.unwrap(),
        Some(b"v2".to_vec())
    );
}

#[tokio::test]
async fn test_tables_are_separate_namespaces() {
    let engine = InMemory::new();
    engine.put_row("users", "k", b"u".to_vec()).await.unwrap();
    engine.put_row("roles", "k", b"r".to_vec()).await.unwrap();

    assert_eq!(
        engine.get_row("users", "k").await.unwrap(),
        Some(b"u".to_vec())
    );
    assert_eq!(
        engine.get_row("roles", "k").await.unwrap(),
        Some(b"r".to_vec())
    );
}

#[tokio::test]
async fn test_insert_if_absent_decides_the_winner() {
    let engine = InMemory::new();

    assert!(
        engine
            .insert_if_absent("markers", "ALICE", b"first".to_vec())
            .await
            .unwrap()
    );
    assert!(
        !engine
            .insert_if_absent("markers", "ALICE", b"second".to_vec())
            .await
            .unwrap()
    );

    // The loser must not have overwritten the winner's value
    assert_eq!(
        engine.get_row("markers", "ALICE").await.unwrap(),
        Some(b"first".to_vec())
    );
}

#[tokio::test]
async fn test_delete_row_is_idempotent() {
    let engine = InMemory::new();
    engine.put_row("users", "k", b"v".to_vec()).await.unwrap();

    engine.delete_row("users", "k").await.unwrap();
    engine.delete_row("users", "k").await.unwrap();
    assert_eq!(engine.get_row("users", "k").await.unwrap(), None);

    // Deleting from a table that never existed is fine too
    engine.delete_row("nope", "k").await.unwrap();
}

#[tokio::test]
async fn test_deleted_key_is_claimable_again() {
    let engine = InMemory::new();
    engine
        .insert_if_absent("markers", "ALICE", b"a".to_vec())
        .await
        .unwrap();
    engine.delete_row("markers", "ALICE").await.unwrap();

    assert!(
        engine
            .insert_if_absent("markers", "ALICE", b"b".to_vec())
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_index_insert_read_remove() {
    let engine = InMemory::new();

    assert!(engine.index_read("by_role", "Admin").await.unwrap().is_empty());

    engine.index_insert("by_role", "Admin", "u1").await.unwrap();
    engine.index_insert("by_role", "Admin", "u2").await.unwrap();
    // Re-inserting an existing association is silent
    engine.index_insert("by_role", "Admin", "u1").await.unwrap();

    let mut keys = engine.index_read("by_role", "Admin").await.unwrap();
    keys.sort();
    assert_eq!(keys, vec!["u1".to_string(), "u2".to_string()]);

    engine.index_remove("by_role", "Admin", "u1").await.unwrap();
    assert_eq!(
        engine.index_read("by_role", "Admin").await.unwrap(),
        vec!["u2".to_string()]
    );

    // Removing an absent association is silent
    engine.index_remove("by_role", "Admin", "u1").await.unwrap();
    engine.index_remove("by_role", "Nope", "u1").await.unwrap();
}

#[tokio::test]
async fn test_conditional_insert_under_contention() {
    use std::sync::Arc;

    let engine = Arc::new(InMemory::new());
    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .insert_if_absent("markers", "RACE", format!("writer-{i}").into_bytes())
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}
