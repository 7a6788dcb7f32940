use crate::analysis::Analyzer;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Lexicon, swappable model and sentiment engine behind one cloneable handle.
    pub analyzer: Analyzer,
}
