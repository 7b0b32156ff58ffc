pub mod comment;
pub mod ip;

use axum::Json;
use serde_json::{Value, json};

/// 存活检查，不经过限流
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
