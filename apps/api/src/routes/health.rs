use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "BiasCheck API is running"
    }))
}

/// GET /health
/// Reports service version, whether a model is loaded and whether sentiment is live.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "biascheck-api",
        "model_loaded": state.analyzer.model_handle().is_loaded(),
        "sentiment_available": state.analyzer.sentiment().is_available(),
        "lexicon_entries": state.analyzer.lexicon().len()
    }))
}
