//! Feature extraction for the classifier.
//!
//! Each stage implements `FeatureTransform`; `FeatureComposer` concatenates the
//! stages column-wise in a fixed order: [lexical terms][bias features][sentiment].

pub mod bias;
pub mod composer;
pub mod polarity;
pub mod sentiment;
pub mod stopwords;
pub mod tfidf;

use crate::errors::AppError;

pub use bias::BiasFeatureExtractor;
pub use composer::{FeatureComposer, FeatureLayout};
pub use polarity::LexiconSentimentEngine;
pub use sentiment::{SentimentCapability, SentimentEngine, SentimentFeatureExtractor, SentimentScore};
pub use tfidf::TfidfVectorizer;

/// One row per input text.
pub type FeatureMatrix = Vec<Vec<f64>>;

/// A fit/transform stage of the feature pipeline.
pub trait FeatureTransform {
    fn name(&self) -> &'static str;

    /// Learns whatever statistics the stage needs. Stateless stages do nothing.
    fn fit(&mut self, texts: &[String]) -> Result<(), AppError>;

    /// Produces a `texts.len() × width` matrix.
    fn transform(&self, texts: &[String]) -> Result<FeatureMatrix, AppError>;

    /// Output column count, or `None` if the stage has not been fitted yet.
    fn width(&self) -> Option<usize>;
}
