//! Feature composer: runs an explicit ordered list of stages and concatenates
//! their outputs column-wise.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::features::bias::BiasFeatureExtractor;
use crate::features::sentiment::{SentimentCapability, SentimentFeatureExtractor};
use crate::features::tfidf::TfidfVectorizer;
use crate::features::{FeatureMatrix, FeatureTransform};
use crate::lexicon::BiasLexicon;

/// A stage of the composed pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FeatureStage {
    Tfidf(TfidfVectorizer),
    Bias(BiasFeatureExtractor),
    Sentiment(SentimentFeatureExtractor),
}

impl FeatureStage {
    fn as_transform(&self) -> &dyn FeatureTransform {
        match self {
            FeatureStage::Tfidf(t) => t,
            FeatureStage::Bias(b) => b,
            FeatureStage::Sentiment(s) => s,
        }
    }

    fn as_transform_mut(&mut self) -> &mut dyn FeatureTransform {
        match self {
            FeatureStage::Tfidf(t) => t,
            FeatureStage::Bias(b) => b,
            FeatureStage::Sentiment(s) => s,
        }
    }
}

/// Column layout fixed at fit time and stored with the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLayout {
    pub lexical_width: usize,
    /// Sorted bias types; each contributes a (count, presence) column pair.
    pub bias_types: Vec<String>,
    pub bias_width: usize,
    pub sentiment_width: usize,
    pub total_width: usize,
    /// Whether sentiment was live (non-zero) when the model was fitted.
    pub sentiment_available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureComposer {
    stages: Vec<FeatureStage>,
    fitted: bool,
}

impl FeatureComposer {
    /// The standard pipeline: [TF-IDF terms][bias features][sentiment].
    pub fn new(lexicon: &BiasLexicon, sentiment: SentimentCapability, max_features: usize) -> Self {
        Self::from_stages(vec![
            FeatureStage::Tfidf(TfidfVectorizer::new(max_features)),
            FeatureStage::Bias(BiasFeatureExtractor::new(lexicon)),
            FeatureStage::Sentiment(SentimentFeatureExtractor::new(sentiment)),
        ])
    }

    pub fn from_stages(stages: Vec<FeatureStage>) -> Self {
        Self {
            stages,
            fitted: false,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    pub fn fit(&mut self, texts: &[String]) -> Result<&mut Self, AppError> {
        for stage in &mut self.stages {
            stage.as_transform_mut().fit(texts)?;
        }
        self.fitted = true;
        Ok(self)
    }

    pub fn transform(&self, texts: &[String]) -> Result<FeatureMatrix, AppError> {
        if !self.fitted {
            return Err(AppError::Configuration(
                "feature composer used before fit or model load".to_string(),
            ));
        }

        let mut rows: FeatureMatrix = vec![Vec::with_capacity(self.width().unwrap_or(0)); texts.len()];
        for stage in &self.stages {
            let transform = stage.as_transform();
            let block = transform.transform(texts)?;
            if block.len() != texts.len() {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "stage '{}' returned {} rows for {} texts",
                    transform.name(),
                    block.len(),
                    texts.len()
                )));
            }
            for (row, part) in rows.iter_mut().zip(block) {
                row.extend(part);
            }
        }
        Ok(rows)
    }

    /// Total output width, or `None` before fit.
    pub fn width(&self) -> Option<usize> {
        if !self.fitted {
            return None;
        }
        self.stages
            .iter()
            .map(|s| s.as_transform().width())
            .sum::<Option<usize>>()
    }

    /// Rebinds the runtime sentiment capability after deserialization.
    pub fn bind_sentiment(&mut self, capability: SentimentCapability) {
        for stage in &mut self.stages {
            if let FeatureStage::Sentiment(s) = stage {
                s.bind(capability.clone());
            }
        }
    }

    pub fn layout(&self) -> Result<FeatureLayout, AppError> {
        let total_width = self.width().ok_or_else(|| {
            AppError::Configuration("feature layout requested before fit".to_string())
        })?;

        let mut layout = FeatureLayout {
            lexical_width: 0,
            bias_types: Vec::new(),
            bias_width: 0,
            sentiment_width: 0,
            total_width,
            sentiment_available: false,
        };
        for stage in &self.stages {
            let width = stage.as_transform().width().unwrap_or(0);
            match stage {
                FeatureStage::Tfidf(_) => layout.lexical_width += width,
                FeatureStage::Bias(b) => {
                    layout.bias_types = b.bias_types().to_vec();
                    layout.bias_width += width;
                }
                FeatureStage::Sentiment(s) => {
                    layout.sentiment_width += width;
                    layout.sentiment_available = s.is_available();
                }
            }
        }
        Ok(layout)
    }
}
