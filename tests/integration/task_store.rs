//! Integration tests for the Postgres record stores
//!
//! Run against a scratch database:
//! `POSTGRES_URL=postgres://... cargo test --test integration -- --ignored`

use prometheus::Gauge;
use std::sync::Arc;
use std::time::Duration;
use tradesignal::core::http::HealthCheck;
use tradesignal::db::{
    Database, PostgresTaskStore, PostgresUserStore, TaskRepository, UserRepository,
};
use tradesignal::error::StoreError;
use tradesignal::models::{NewTask, STATUS_RUNNING};

fn database_url() -> String {
    std::env::var("POSTGRES_URL").expect("POSTGRES_URL must be set for database tests")
}

// One test so the steps do not race each other on the shared table
#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn task_store_lifecycle() {
    let store = PostgresTaskStore::connect(&database_url())
        .await
        .expect("connect task store");
    store.delete_all().await.unwrap();

    let first = store
        .insert(NewTask::new("user-1", "AAPL", "1d", "macd", "rsi", STATUS_RUNNING))
        .await
        .unwrap();
    let second = store
        .insert(NewTask::new("user-1", "TSLA", "4h", "ema", "ema", "stopped"))
        .await
        .unwrap();
    let other = store
        .insert(NewTask::new("user-2", "BTCUSDT", "1h", "macd", "macd", STATUS_RUNNING))
        .await
        .unwrap();
    assert!(second.id > first.id);
    assert_eq!(first.stock, "AAPL");

    let fetched = store.get_by_id(first.id).await.unwrap().expect("inserted task");
    assert_eq!(fetched, first);
    assert!(store.get_by_id(other.id + 1000).await.unwrap().is_none());

    assert!(store.get_by_user_and_id("user-2", first.id).await.unwrap().is_none());
    assert_eq!(
        store.get_by_user_and_id("user-1", second.id).await.unwrap(),
        Some(second.clone())
    );

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(store.list_by_user("user-1").await.unwrap().len(), 2);

    let running: Vec<i32> = store.list_running().await.unwrap().iter().map(|t| t.id).collect();
    assert_eq!(running, vec![first.id, other.id]);

    assert_eq!(store.delete_by_user_and_id("user-2", first.id).await.unwrap(), 0);
    assert_eq!(store.delete_by_user_and_id("user-1", first.id).await.unwrap(), 1);

    assert_eq!(store.delete_all().await.unwrap(), 2);
    assert!(store.list_all().await.unwrap().is_empty());
    assert_eq!(store.delete_all().await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires a Postgres database with the identity schema"]
async fn user_store_reads_identity_table() {
    match PostgresUserStore::connect(&database_url()).await {
        Ok(users) => {
            let columns = users.columns("User").await.unwrap();
            assert!(columns.iter().any(|c| c == "email"));
            assert!(users.get_by_id("no-such-user").await.unwrap().is_none());
        }
        Err(StoreError::MissingTable(table)) => assert!(table.contains("User")),
        Err(e) => panic!("unexpected store error: {}", e),
    }
}

#[tokio::test]
#[ignore = "requires a Postgres database"]
async fn store_recovers_after_connection_is_terminated() {
    let gauge = Gauge::new("database_connected", "test").unwrap();
    let db = Arc::new(
        Database::connect(&database_url())
            .await
            .expect("connect database")
            .with_status_gauge(gauge.clone()),
    );
    let store = PostgresTaskStore::new(db.clone()).await.expect("task store");
    assert_eq!(gauge.get(), 1.0);

    let client = db.client().await.unwrap();
    // The server drops the session while answering, so the error is expected
    let _ = client
        .batch_execute("SELECT pg_terminate_backend(pg_backend_pid())")
        .await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(client.is_closed());
    drop(client);

    store.list_all().await.expect("query after reconnect");
    assert!(!db.client().await.unwrap().is_closed());
    assert!(db.is_healthy().await);
    assert_eq!(gauge.get(), 1.0);
}
