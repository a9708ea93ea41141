//! Integration tests for the SQLite plan store.

use maestro_core::store::{PlanStore, DEFAULT_NAMESPACE};
use maestro_core::{PlanState, PlanStep, StepStatus};
use rusqlite::{params, Connection};
use tempfile::TempDir;

fn sample_state() -> PlanState {
    let mut step = PlanStep::new(1, "Only", "intent", true, "do it");
    step.status = StepStatus::Completed;
    PlanState {
        steps: vec![step],
        cursor: 1,
    }
}

#[tokio::test]
async fn save_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = PlanStore::new(dir.path().join("test.db"));
    let state = sample_state();

    store.save(DEFAULT_NAMESPACE, &state).await.unwrap();
    let loaded = store.load(DEFAULT_NAMESPACE).await.unwrap();
    assert_eq!(loaded, state);
}

#[tokio::test]
async fn missing_namespace_loads_empty_plan() {
    let dir = TempDir::new().unwrap();
    let store = PlanStore::new(dir.path().join("test.db"));

    let loaded = store.load("never-written").await.unwrap();
    assert_eq!(loaded, PlanState::default());
}

#[tokio::test]
async fn namespaces_are_independent() {
    let dir = TempDir::new().unwrap();
    let store = PlanStore::new(dir.path().join("test.db"));

    store.save("a", &sample_state()).await.unwrap();
    store.save("b", &PlanState::default()).await.unwrap();

    assert_eq!(store.load("a").await.unwrap().steps.len(), 1);
    assert!(store.load("b").await.unwrap().steps.is_empty());
}

#[tokio::test]
async fn saving_again_overwrites() {
    let dir = TempDir::new().unwrap();
    let store = PlanStore::new(dir.path().join("test.db"));

    store.save(DEFAULT_NAMESPACE, &sample_state()).await.unwrap();
    store
        .save(DEFAULT_NAMESPACE, &PlanState::default())
        .await
        .unwrap();

    let loaded = store.load(DEFAULT_NAMESPACE).await.unwrap();
    assert_eq!(loaded, PlanState::default());
}

#[tokio::test]
async fn malformed_payload_degrades_to_empty_plan() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("test.db");
    let store = PlanStore::new(db_path.clone());

    // Establish the schema, then corrupt the row behind the store's back.
    store.save(DEFAULT_NAMESPACE, &sample_state()).await.unwrap();
    let conn = Connection::open(&db_path).unwrap();
    conn.execute(
        "UPDATE plan_state SET payload = ?1 WHERE namespace = ?2",
        params!["{not json at all", DEFAULT_NAMESPACE],
    )
    .unwrap();
    drop(conn);

    let loaded = store.load(DEFAULT_NAMESPACE).await.unwrap();
    assert_eq!(loaded, PlanState::default());
}

#[tokio::test]
async fn out_of_range_cursor_is_clamped_on_load() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("test.db");
    let store = PlanStore::new(db_path.clone());

    store.save(DEFAULT_NAMESPACE, &sample_state()).await.unwrap();
    let payload = r#"{"steps":[{"index":1,"title":"t","intent":"","sideEffects":false,"instruction":"","status":"pending"}],"currentIndex":99}"#;
    let conn = Connection::open(&db_path).unwrap();
    conn.execute(
        "UPDATE plan_state SET payload = ?1 WHERE namespace = ?2",
        params![payload, DEFAULT_NAMESPACE],
    )
    .unwrap();
    drop(conn);

    let loaded = store.load(DEFAULT_NAMESPACE).await.unwrap();
    assert_eq!(loaded.steps.len(), 1);
    assert_eq!(loaded.cursor, 1);
}
