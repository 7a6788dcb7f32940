//! Axum route handlers for the analysis API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::AnalysisReport;
use crate::detection::{render_report, MatchResult};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct BiasReportResponse {
    #[serde(flatten)]
    pub result: MatchResult,
    pub report: String,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: String,
    pub classes: Vec<String>,
    pub feature_width: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /analyze
///
/// Classifies a job posting and lists the bias-coded lexicon words it contains.
/// Returns 503 until a model has been loaded.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisReport>, AppError> {
    validate_text(&request.text)?;
    let report = state.analyzer.analyze(&request.text)?;
    Ok(Json(report))
}

/// POST /bias-report
///
/// Lexical match report only. Available even when no model is loaded.
pub async fn handle_bias_report(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<BiasReportResponse>, AppError> {
    validate_text(&request.text)?;
    let result = state.analyzer.detect_bias_report(&request.text);
    let report = render_report(&result);
    Ok(Json(BiasReportResponse { result, report }))
}

/// POST /admin/reload
///
/// Re-reads the model artifact from `BIASCHECK_MODEL_PATH` and swaps it in.
/// A failed load leaves the current model serving.
pub async fn handle_reload(
    State(state): State<AppState>,
) -> Result<Json<ReloadResponse>, AppError> {
    let path = state.config.model_path.clone();
    let analyzer = state.analyzer.clone();

    tokio::task::spawn_blocking(move || {
        analyzer
            .model_handle()
            .reload(&path, analyzer.sentiment().clone())
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("reload task failed: {e}")))??;

    let model = state.analyzer.model_handle().current()?;
    model.check_lexicon(state.analyzer.lexicon());
    info!(classes = ?model.classes(), "Model reloaded");

    Ok(Json(ReloadResponse {
        status: "reloaded".to_string(),
        classes: model.classes().to_vec(),
        feature_width: model.layout().total_width,
    }))
}

fn validate_text(text: &str) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }
    Ok(())
}
