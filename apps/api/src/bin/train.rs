//! biascheck-train: fits the bias classifier offline and writes the model artifact.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use biascheck::config::{ClassWeight, Config, SentimentSetting, TrainingConfig};
use biascheck::features::SentimentCapability;
use biascheck::lexicon::BiasLexicon;
use biascheck::training::{load_corpus, train};

#[derive(Parser)]
#[command(name = "biascheck-train")]
#[command(about = "Train the job-posting bias classifier")]
#[command(version)]
struct Cli {
    /// Labeled corpus CSV with `text` and `label` columns
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Bias lexicon CSV with `word`, `label`, `bias_type`, `context_notes`
    #[arg(long)]
    lexicon: Option<PathBuf>,

    /// Where to write the model artifact
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Fraction of each label held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,

    /// Random seed for the stratified split
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// TF-IDF vocabulary size
    #[arg(long, default_value_t = 2000)]
    max_features: usize,

    #[arg(long, default_value_t = 2000)]
    max_iter: usize,

    /// Inverse L2 regularisation strength
    #[arg(short = 'c', long = "c", default_value_t = 1.0)]
    c: f64,

    #[arg(long, default_value_t = 1e-4)]
    tol: f64,

    /// Weight every class equally instead of balancing by frequency
    #[arg(long)]
    uniform_weights: bool,

    /// Train with zero sentiment features
    #[arg(long)]
    no_sentiment: bool,

    /// Print the training summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if cli.no_sentiment {
        config.sentiment = SentimentSetting::Disabled;
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("biascheck={0},biascheck_train={0}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let corpus_path = cli.corpus.unwrap_or_else(|| config.corpus_path.clone());
    let lexicon_path = cli.lexicon.unwrap_or_else(|| config.lexicon_path.clone());
    let output = cli.output.unwrap_or_else(|| config.model_path.clone());

    let training = TrainingConfig {
        test_size: cli.test_size,
        seed: cli.seed,
        max_features: cli.max_features,
        max_iter: cli.max_iter,
        c: cli.c,
        tol: cli.tol,
        class_weight: if cli.uniform_weights {
            ClassWeight::Uniform
        } else {
            ClassWeight::Balanced
        },
    };

    let lexicon = BiasLexicon::load_csv(&lexicon_path)
        .with_context(|| format!("loading bias lexicon {}", lexicon_path.display()))?;
    let corpus = load_corpus(&corpus_path)
        .with_context(|| format!("loading corpus {}", corpus_path.display()))?;
    let sentiment = SentimentCapability::resolve(&config);

    let outcome = train(&corpus, &lexicon, sentiment, &training)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary())?);
    } else {
        println!("Label distribution:");
        for (label, count) in &outcome.label_distribution {
            println!("  {label:<12} {count}");
        }
        println!();
        println!("Classification report:");
        println!("{}", outcome.report);
        if !outcome.fit.converged {
            println!(
                "Warning: optimizer stopped after {} iterations without converging",
                outcome.fit.iterations
            );
        }
    }

    outcome
        .model
        .save(&output)
        .with_context(|| format!("writing model artifact {}", output.display()))?;
    info!(path = %output.display(), "Training complete");
    println!("Model saved to {}", output.display());

    Ok(())
}
