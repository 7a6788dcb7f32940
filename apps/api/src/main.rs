use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use biascheck::analysis::Analyzer;
use biascheck::config::Config;
use biascheck::features::SentimentCapability;
use biascheck::lexicon::BiasLexicon;
use biascheck::model::{ModelHandle, TrainedModel};
use biascheck::routes::build_router;
use biascheck::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("biascheck={0},biascheck_api={0}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting BiasCheck API v{}", env!("CARGO_PKG_VERSION"));

    // No inference is possible without the lexicon
    let lexicon = BiasLexicon::load_csv(&config.lexicon_path)
        .with_context(|| format!("loading bias lexicon {}", config.lexicon_path.display()))?;

    let sentiment = SentimentCapability::resolve(&config);
    info!("Sentiment engine: {:?}", sentiment);

    // A missing artifact is not fatal; /analyze answers 503 until /admin/reload succeeds
    let model = match TrainedModel::load(&config.model_path, sentiment.clone()) {
        Ok(model) => {
            model.check_lexicon(&lexicon);
            info!(
                path = %config.model_path.display(),
                classes = ?model.classes(),
                width = model.layout().total_width,
                "Model loaded"
            );
            Some(model)
        }
        Err(e) => {
            error!(path = %config.model_path.display(), "Model not loaded: {e}");
            None
        }
    };

    let analyzer = Analyzer::new(
        Arc::new(lexicon),
        Arc::new(ModelHandle::new(model)),
        sentiment,
    );

    let state = AppState {
        config: config.clone(),
        analyzer,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
