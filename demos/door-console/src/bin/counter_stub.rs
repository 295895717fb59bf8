//! A stand-in for the camera backend: counts a few "reps" per poll.
//!
//! ```text
//! cargo run -p door-console --bin counter_stub -- 127.0.0.1:5000
//! ```

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

#[derive(Default)]
struct Counter {
    session_id: Option<String>,
    movement_count: u64,
    total_reps: u64,
}

type Shared = Arc<Mutex<Counter>>;

async fn status() -> &'static str {
    "counter stub"
}

async fn reset(State(counter): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    let Some(id) = body["session_id"].as_str() else {
        return StatusCode::BAD_REQUEST;
    };
    let mut counter = counter.lock().unwrap_or_else(|e| e.into_inner());
    tracing::info!(session_id = id, "counter reset");
    counter.session_id = Some(id.to_string());
    counter.movement_count = 0;
    StatusCode::OK
}

async fn get_counter(State(counter): State<Shared>) -> Json<Value> {
    let mut counter = counter.lock().unwrap_or_else(|e| e.into_inner());
    if counter.session_id.is_some() {
        let reps = rand::random_range(0..=2);
        counter.movement_count += reps;
        counter.total_reps += reps;
    }
    Json(json!({
        "session_id": counter.session_id,
        "movement_count": counter.movement_count,
    }))
}

async fn get_total_reps(State(counter): State<Shared>) -> Json<Value> {
    let counter = counter.lock().unwrap_or_else(|e| e.into_inner());
    Json(json!({ "success": true, "total_reps": counter.total_reps }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    doorway::init_logging("info");
    let addr = std::env::args().nth(1).unwrap_or_else(|| "127.0.0.1:5000".to_string());

    let router = Router::new()
        .route("/", get(status))
        .route("/reset_counter", post(reset))
        .route("/get_counter", get(get_counter))
        .route("/get_total_reps", get(get_total_reps))
        .with_state(Shared::default());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "counter stub listening");
    axum::serve(listener, router).await?;
    Ok(())
}
