use storage::{KeyValueStore, Storage, QUOTES_KEY};

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("quotes.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn values_survive_reopening_the_database() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("quotes.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage
        .set_item(QUOTES_KEY, r#"[{"id":1,"text":"t","category":"c"}]"#)
        .await
        .expect("write");
    storage.pool().close().await;

    let reopened = Storage::new(&database_url).await.expect("reopen");
    assert_eq!(
        reopened.get_item(QUOTES_KEY).await.expect("read").as_deref(),
        Some(r#"[{"id":1,"text":"t","category":"c"}]"#)
    );
}
