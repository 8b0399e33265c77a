use crate::category::CATEGORY_COUNT;
use crate::error::{InferenceError, ModelLoadError};
use crate::image_classifier::interface::ImageClassifier;
use crate::image_classifier::models::model_config::{Architecture, DeviceKind, ModelConfig};
use crate::image_classifier::models::resnet::ResNet;
use crate::library::logger::interface::Logger;
use crate::preprocess::tensor::{ImageTensor, CHANNELS, INPUT_SIZE};
use candle_core::safetensors::MmapedSafetensors;
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::VarBuilder;
use std::path::Path;
use std::sync::Arc;

/// ResNet classifier bound to trained safetensors weights. Built once at
/// startup and read concurrently afterwards; nothing in it is mutated.
pub struct ImageClassifierCandle {
    model: ResNet,
    device: Device,
}

impl ImageClassifierCandle {
    pub fn load(config: &ModelConfig, logger: Arc<dyn Logger>) -> Result<Self, ModelLoadError> {
        let logger = logger.with_namespace("candle");
        let path = config.weights_path.as_path();

        if !path.is_file() {
            return Err(ModelLoadError::MissingWeights {
                path: path.to_path_buf(),
            });
        }

        let device = create_device(config.device)?;

        check_head(path, config.architecture)?;

        let weights_error = |source| ModelLoadError::Weights {
            path: path.to_path_buf(),
            source,
        };

        // SAFETY: the weight file is memory-mapped while the tensors are copied
        // out; it must not be modified concurrently by another process.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[path], DType::F32, &device)
                .map_err(weights_error)?
        };
        let model =
            ResNet::load(config.architecture, CATEGORY_COUNT, vb).map_err(weights_error)?;

        let _ = logger.info(&format!(
            "model ready: {} with {} categories on {}",
            config.architecture, CATEGORY_COUNT, config.device
        ));

        Ok(Self { model, device })
    }
}

impl ImageClassifier for ImageClassifierCandle {
    fn logits(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        let x = Tensor::from_slice(
            input.as_slice(),
            (1, CHANNELS, INPUT_SIZE, INPUT_SIZE),
            &self.device,
        )?;
        let logits = self.model.forward(&x)?.squeeze(0)?.to_vec1::<f32>()?;
        Ok(logits)
    }
}

/// Rejects weights whose `fc` layer was trained for a different category set
/// before the backbone is bound, so the error names the actual problem.
fn check_head(path: &Path, architecture: Architecture) -> Result<(), ModelLoadError> {
    let weights_error = |source| ModelLoadError::Weights {
        path: path.to_path_buf(),
        source,
    };

    // SAFETY: see `ImageClassifierCandle::load`.
    let tensors = unsafe { MmapedSafetensors::new(path).map_err(weights_error)? };
    let found = tensors
        .load("fc.weight", &Device::Cpu)
        .map_err(weights_error)?
        .dims()
        .to_vec();
    let expected = vec![CATEGORY_COUNT, architecture.feature_width()];

    if found != expected {
        return Err(ModelLoadError::HeadMismatch { expected, found });
    }
    Ok(())
}

fn create_device(kind: DeviceKind) -> Result<Device, ModelLoadError> {
    match kind {
        DeviceKind::Cpu => Ok(Device::Cpu),
        DeviceKind::Cuda(ordinal) => {
            #[cfg(feature = "cuda")]
            {
                Device::new_cuda(ordinal).map_err(|e| ModelLoadError::Device {
                    message: format!("failed to create CUDA device {}: {}", ordinal, e),
                })
            }
            #[cfg(not(feature = "cuda"))]
            {
                Err(ModelLoadError::Device {
                    message: format!(
                        "cuda:{} requested but CUDA support is not enabled, compile with --features cuda",
                        ordinal
                    ),
                })
            }
        }
    }
}
