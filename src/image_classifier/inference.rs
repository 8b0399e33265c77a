use crate::category::{Category, CATEGORY_COUNT};
use crate::error::InferenceError;
use crate::image_classifier::interface::{Classification, ImageClassifier};
use crate::preprocess::tensor::ImageTensor;

/// Softmax output aligned positionally with [`Category::ALL`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probabilities([f32; CATEGORY_COUNT]);

impl Probabilities {
    pub fn from_logits(logits: &[f32]) -> Result<Self, InferenceError> {
        if logits.len() != CATEGORY_COUNT {
            return Err(InferenceError::OutputWidth {
                expected: CATEGORY_COUNT,
                found: logits.len(),
            });
        }
        if logits.iter().any(|logit| !logit.is_finite()) {
            return Err(InferenceError::NonFinite);
        }

        let mut values = [0.0; CATEGORY_COUNT];
        for (value, p) in values.iter_mut().zip(softmax(logits)) {
            *value = p;
        }
        Ok(Self(values))
    }

    pub fn values(&self) -> &[f32; CATEGORY_COUNT] {
        &self.0
    }

    pub fn get(&self, category: Category) -> f32 {
        self.0[category.index()]
    }

    /// Highest-probability category. Ties go to the earliest category.
    pub fn top(&self) -> Classification {
        let mut best = Classification {
            label: Category::ALL[0],
            confidence: self.0[0],
        };
        for (&label, &confidence) in Category::ALL.iter().zip(self.0.iter()).skip(1) {
            if confidence > best.confidence {
                best = Classification { label, confidence };
            }
        }
        best
    }
}

/// Max-subtracted softmax; stable for arbitrarily large finite logits.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|logit| (logit - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// One forward pass, then softmax. Output depends only on the classifier and the input.
pub fn infer(
    classifier: &dyn ImageClassifier,
    input: &ImageTensor,
) -> Result<Probabilities, InferenceError> {
    let logits = classifier.logits(input)?;
    Probabilities::from_logits(&logits)
}
