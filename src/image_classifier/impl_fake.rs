use crate::error::InferenceError;
use crate::image_classifier::interface::ImageClassifier;
use crate::preprocess::tensor::ImageTensor;
use std::sync::atomic::{AtomicUsize, Ordering};

type LogitsFn = dyn Fn(&ImageTensor) -> Vec<f32> + Send + Sync;

/// Stands in for a trained model: logits come from a fixed vector or a closure.
pub struct ImageClassifierFake {
    logits_fn: Box<LogitsFn>,
    calls: AtomicUsize,
}

impl ImageClassifierFake {
    pub fn new(logits: impl Into<Vec<f32>>) -> Self {
        let logits = logits.into();
        Self::from_fn(move |_| logits.clone())
    }

    pub fn from_fn(logits_fn: impl Fn(&ImageTensor) -> Vec<f32> + Send + Sync + 'static) -> Self {
        Self {
            logits_fn: Box::new(logits_fn),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageClassifier for ImageClassifierFake {
    fn logits(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.logits_fn)(input))
    }
}
