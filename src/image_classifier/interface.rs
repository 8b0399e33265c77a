use crate::category::Category;
use crate::error::InferenceError;
use crate::preprocess::tensor::ImageTensor;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: Category,
    pub confidence: f32,
}

pub trait ImageClassifier: Send + Sync {
    /// Raw pre-softmax scores, one per [`Category`] in declaration order.
    fn logits(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError>;
}
