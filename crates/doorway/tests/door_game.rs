//! End-to-end tests: a real `HttpBackend` game against a stub counter
//! server that counts five reps per poll.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use doorway::prelude::*;
use serde_json::{Value, json};
use tokio::sync::mpsc::UnboundedReceiver;

// =========================================================================
// Stub backend
// =========================================================================

#[derive(Default)]
struct Stub {
    session_id: Option<String>,
    movement_count: u64,
    total_reps: u64,
    resets: Vec<String>,
    reject_resets: bool,
}

type Shared = Arc<Mutex<Stub>>;

async fn reset(State(stub): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    let mut stub = stub.lock().unwrap();
    if stub.reject_resets {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    let id = body["session_id"].as_str().unwrap_or_default().to_string();
    stub.resets.push(id.clone());
    stub.session_id = Some(id);
    stub.movement_count = 0;
    StatusCode::OK
}

/// Every poll "sees" five more reps.
async fn counter(State(stub): State<Shared>) -> Json<Value> {
    let mut stub = stub.lock().unwrap();
    stub.movement_count += 5;
    stub.total_reps += 5;
    Json(json!({
        "session_id": stub.session_id,
        "movement_count": stub.movement_count,
    }))
}

async fn totals(State(stub): State<Shared>) -> Json<Value> {
    let stub = stub.lock().unwrap();
    Json(json!({ "success": true, "total_reps": stub.total_reps }))
}

async fn serve(stub: Shared) -> ConnectionConfig {
    let router = Router::new()
        .route("/reset_counter", post(reset))
        .route("/get_counter", get(counter))
        .route("/get_total_reps", get(totals))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    ConnectionConfig::new("127.0.0.1", port.to_string())
}

fn fast_config() -> SessionConfig {
    SessionConfig {
        poll_interval: Duration::from_millis(100),
        countdown_secs: 1,
        ..SessionConfig::default()
    }
}

async fn next_matching(
    events: &mut UnboundedReceiver<GameEvent>,
    pred: impl Fn(&GameEvent) -> bool,
) -> GameEvent {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let event = events.recv().await.expect("event stream closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_full_game_over_http() {
    let stub: Shared = Arc::default();
    let connection = serve(Arc::clone(&stub)).await;

    let (game, mut events) = DoorGame::builder()
        .connection(connection)
        .session_config(fast_config())
        .spawn()
        .unwrap();

    let first = game.start_game("10", "2").await.unwrap();
    assert_eq!(first.set_number, 1);

    let finished = next_matching(&mut events, |e| matches!(e, GameEvent::GameFinished { .. })).await;
    let GameEvent::GameFinished { sets, total_reps } = finished else {
        unreachable!()
    };
    assert_eq!(sets, 2);
    assert_eq!(total_reps, Some(20));

    let snap = game.snapshot().await.unwrap();
    assert_eq!(snap.step, GameStep::Input);

    let resets = stub.lock().unwrap().resets.clone();
    assert_eq!(resets.len(), 2);
    assert_eq!(resets[0], first.id.as_str());
    assert_ne!(resets[0], resets[1]);
}

#[tokio::test]
async fn test_rejected_reset_lands_on_config() {
    let stub: Shared = Arc::default();
    stub.lock().unwrap().reject_resets = true;
    let connection = serve(Arc::clone(&stub)).await;

    let (game, _events) = DoorGame::builder()
        .connection(connection)
        .session_config(fast_config())
        .spawn()
        .unwrap();

    let err = DoorwayError::from(game.start_game("10", "2").await.unwrap_err());
    assert!(err.is_connectivity());
    assert_eq!(game.snapshot().await.unwrap().step, GameStep::Config);
}

#[tokio::test]
async fn test_spawn_rejects_invalid_address() {
    let result = DoorGame::builder()
        .connection(ConnectionConfig::new("http://10.0.0.1", "5000"))
        .spawn();

    assert!(matches!(
        result,
        Err(DoorwayError::Backend(BackendError::InvalidAddress(_)))
    ));
}
