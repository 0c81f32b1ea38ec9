//! Standard API response envelope.
//!
//! Every response carries `result: success|error`; errors add a `message`.
//! The error half of the envelope lives on `Error`'s `IntoResponse` impl.

use axum::Json;
use serde_json::{json, Value};

/// `{"result": "success", "message": ...}`
pub fn success_message(message: &str) -> Json<Value> {
    Json(json!({
        "result": "success",
        "message": message,
    }))
}
