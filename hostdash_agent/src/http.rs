//! JSON endpoints over the metrics facade. Every route answers 200; a failed
//! domain serializes as `{"error": "..."}`.

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::to_json;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/system-info", get(system_info))
        .route("/api/memory-info", get(memory_info))
        .route("/api/cpu-info", get(cpu_info))
        .route("/api/gpu-info", get(gpu_info))
        .route("/api/pools", get(pools))
        .route("/api/network", get(network))
        .route("/api/disk-io", get(disk_io))
        .route("/api/temperatures", get(temperatures))
        .route("/api/top-processes", get(top_processes))
        .route("/health", get(health))
        .with_state(state)
}

async fn system_info(State(s): State<AppState>) -> Json<Value> {
    Json(to_json(&s.metrics.system_info().await))
}

async fn memory_info(State(s): State<AppState>) -> Json<Value> {
    Json(to_json(&s.metrics.memory_info().await))
}

async fn cpu_info(State(s): State<AppState>) -> Json<Value> {
    Json(to_json(&s.metrics.cpu_info().await))
}

async fn gpu_info(State(s): State<AppState>) -> Json<Value> {
    Json(to_json(&s.metrics.gpu_info().await))
}

async fn pools(State(s): State<AppState>) -> Json<Value> {
    Json(to_json(&s.metrics.pools().await))
}

async fn network(State(s): State<AppState>) -> Json<Value> {
    Json(to_json(&s.metrics.network().await))
}

async fn disk_io(State(s): State<AppState>) -> Json<Value> {
    Json(to_json(&s.metrics.disk_io().await))
}

async fn temperatures(State(s): State<AppState>) -> Json<Value> {
    Json(to_json(&s.metrics.temperatures().await))
}

async fn top_processes(State(s): State<AppState>) -> Json<Value> {
    Json(to_json(&s.metrics.top_processes().await))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "version": env!("CARGO_PKG_VERSION") }))
}
