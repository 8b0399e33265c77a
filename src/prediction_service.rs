use crate::category::Category;
use crate::disposal::rule_for;
use crate::error::{ModelLoadError, PredictionError};
use crate::image_classifier::impl_candle::ImageClassifierCandle;
use crate::image_classifier::inference::infer;
use crate::image_classifier::interface::{Classification, ImageClassifier};
use crate::image_classifier::models::model_config::ModelConfig;
use crate::library::logger::interface::Logger;
use crate::preprocess::preprocess;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub label: Category,
    pub confidence: f32,
    pub bin_color: String,
    pub advice: String,
}

/// Bytes in, disposal guidance out. Holds the classifier for the lifetime of
/// the process; `predict` may be called from any number of threads at once.
pub struct PredictionService {
    classifier: Arc<dyn ImageClassifier>,
    logger: Arc<dyn Logger>,
}

impl PredictionService {
    pub fn new(classifier: Arc<dyn ImageClassifier>, logger: Arc<dyn Logger>) -> Self {
        Self {
            classifier,
            logger: logger.with_namespace("prediction_service"),
        }
    }

    /// Loads the trained model. An error here means the service must not start.
    pub fn load(config: &ModelConfig, logger: Arc<dyn Logger>) -> Result<Self, ModelLoadError> {
        let classifier = ImageClassifierCandle::load(config, logger.clone())?;
        Ok(Self::new(Arc::new(classifier), logger))
    }

    pub fn predict(&self, image_bytes: &[u8]) -> Result<PredictionResult, PredictionError> {
        let tensor = preprocess(image_bytes)?;
        let probabilities = infer(self.classifier.as_ref(), &tensor)?;
        let Classification { label, confidence } = probabilities.top();
        let rule = rule_for(label);

        let _ = self.logger.debug(&format!(
            "predicted {} ({:.4}) from {} bytes",
            label,
            confidence,
            image_bytes.len()
        ));

        Ok(PredictionResult {
            label,
            confidence,
            bin_color: rule.bin_color.to_string(),
            advice: rule.advice.to_string(),
        })
    }
}
