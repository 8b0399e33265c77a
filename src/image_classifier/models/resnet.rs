//! torchvision-compatible ResNet with a resized classification head.
//!
//! Parameter names follow torchvision's `state_dict` layout (`conv1`, `bn1`,
//! `layer{1..4}.{i}.*`, `fc`), so weights exported from PyTorch bind without
//! renaming. Only inference is supported: batch norm always uses the stored
//! running statistics.

use super::model_config::Architecture;
use candle_core::{Module, Result, Tensor, D};
use candle_nn::{Conv2d, Conv2dConfig, Init, Linear, VarBuilder};

const BN_EPS: f64 = 1e-5;
const STEM_WIDTH: usize = 64;

/// Batch norm folded into a per-channel scale and shift at load time.
#[derive(Debug, Clone)]
struct FrozenBatchNorm {
    scale: Tensor,
    shift: Tensor,
}

impl FrozenBatchNorm {
    fn load(channels: usize, vb: VarBuilder) -> Result<Self> {
        let weight = vb.get_with_hints(channels, "weight", Init::Const(1.0))?;
        let bias = vb.get_with_hints(channels, "bias", Init::Const(0.0))?;
        let running_mean = vb.get_with_hints(channels, "running_mean", Init::Const(0.0))?;
        let running_var = vb.get_with_hints(channels, "running_var", Init::Const(1.0))?;

        // y = (x - mean) / sqrt(var + eps) * weight + bias
        let scale = (weight / (running_var + BN_EPS)?.sqrt()?)?;
        let shift = (bias - running_mean.mul(&scale)?)?;

        Ok(Self {
            scale: scale.reshape((1, channels, 1, 1))?,
            shift: shift.reshape((1, channels, 1, 1))?,
        })
    }
}

impl Module for FrozenBatchNorm {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        x.broadcast_mul(&self.scale)?.broadcast_add(&self.shift)
    }
}

fn conv(
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    stride: usize,
    padding: usize,
    vb: VarBuilder,
) -> Result<Conv2d> {
    let cfg = Conv2dConfig {
        stride,
        padding,
        ..Default::default()
    };
    candle_nn::conv2d_no_bias(in_channels, out_channels, kernel_size, cfg, vb)
}

/// 1x1 projection on the shortcut path (`downsample.0` conv, `downsample.1` bn).
#[derive(Debug, Clone)]
struct Downsample {
    conv: Conv2d,
    bn: FrozenBatchNorm,
}

impl Downsample {
    fn load(in_channels: usize, out_channels: usize, stride: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            conv: conv(in_channels, out_channels, 1, stride, 0, vb.pp("0"))?,
            bn: FrozenBatchNorm::load(out_channels, vb.pp("1"))?,
        })
    }

    fn load_if_needed(
        in_channels: usize,
        out_channels: usize,
        stride: usize,
        vb: VarBuilder,
    ) -> Result<Option<Self>> {
        if stride != 1 || in_channels != out_channels {
            Ok(Some(Self::load(in_channels, out_channels, stride, vb.pp("downsample"))?))
        } else {
            Ok(None)
        }
    }
}

impl Module for Downsample {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        self.bn.forward(&self.conv.forward(x)?)
    }
}

#[derive(Debug, Clone)]
struct BasicBlock {
    conv1: Conv2d,
    bn1: FrozenBatchNorm,
    conv2: Conv2d,
    bn2: FrozenBatchNorm,
    downsample: Option<Downsample>,
}

impl BasicBlock {
    fn load(in_channels: usize, planes: usize, stride: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            conv1: conv(in_channels, planes, 3, stride, 1, vb.pp("conv1"))?,
            bn1: FrozenBatchNorm::load(planes, vb.pp("bn1"))?,
            conv2: conv(planes, planes, 3, 1, 1, vb.pp("conv2"))?,
            bn2: FrozenBatchNorm::load(planes, vb.pp("bn2"))?,
            downsample: Downsample::load_if_needed(in_channels, planes, stride, vb)?,
        })
    }
}

impl Module for BasicBlock {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let out = self.bn1.forward(&self.conv1.forward(x)?)?.relu()?;
        let out = self.bn2.forward(&self.conv2.forward(&out)?)?;
        let identity = match &self.downsample {
            Some(downsample) => downsample.forward(x)?,
            None => x.clone(),
        };
        (out + identity)?.relu()
    }
}

/// ResNet v1.5 bottleneck: the stride sits on the 3x3 convolution.
#[derive(Debug, Clone)]
struct Bottleneck {
    conv1: Conv2d,
    bn1: FrozenBatchNorm,
    conv2: Conv2d,
    bn2: FrozenBatchNorm,
    conv3: Conv2d,
    bn3: FrozenBatchNorm,
    downsample: Option<Downsample>,
}

impl Bottleneck {
    const EXPANSION: usize = 4;

    fn load(in_channels: usize, planes: usize, stride: usize, vb: VarBuilder) -> Result<Self> {
        let out_channels = planes * Self::EXPANSION;
        Ok(Self {
            conv1: conv(in_channels, planes, 1, 1, 0, vb.pp("conv1"))?,
            bn1: FrozenBatchNorm::load(planes, vb.pp("bn1"))?,
            conv2: conv(planes, planes, 3, stride, 1, vb.pp("conv2"))?,
            bn2: FrozenBatchNorm::load(planes, vb.pp("bn2"))?,
            conv3: conv(planes, out_channels, 1, 1, 0, vb.pp("conv3"))?,
            bn3: FrozenBatchNorm::load(out_channels, vb.pp("bn3"))?,
            downsample: Downsample::load_if_needed(in_channels, out_channels, stride, vb)?,
        })
    }
}

impl Module for Bottleneck {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let out = self.bn1.forward(&self.conv1.forward(x)?)?.relu()?;
        let out = self.bn2.forward(&self.conv2.forward(&out)?)?.relu()?;
        let out = self.bn3.forward(&self.conv3.forward(&out)?)?;
        let identity = match &self.downsample {
            Some(downsample) => downsample.forward(x)?,
            None => x.clone(),
        };
        (out + identity)?.relu()
    }
}

#[derive(Debug, Clone)]
enum Block {
    Basic(BasicBlock),
    Bottleneck(Bottleneck),
}

impl Module for Block {
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        match self {
            Block::Basic(block) => block.forward(x),
            Block::Bottleneck(block) => block.forward(x),
        }
    }
}

/// 3x3/2 max pool with padding 1. Zero padding is exact because the input
/// comes straight out of a relu.
fn stem_pool(x: &Tensor) -> Result<Tensor> {
    x.pad_with_zeros(D::Minus2, 1, 1)?
        .pad_with_zeros(D::Minus1, 1, 1)?
        .max_pool2d_with_stride(3, 2)
}

#[derive(Debug, Clone)]
pub struct ResNet {
    conv1: Conv2d,
    bn1: FrozenBatchNorm,
    blocks: Vec<Block>,
    fc: Linear,
}

impl ResNet {
    /// Builds the backbone for `architecture` with an `fc` head of
    /// `num_classes` outputs, binding every parameter through `vb`.
    pub fn load(architecture: Architecture, num_classes: usize, vb: VarBuilder) -> Result<Self> {
        let conv1 = conv(3, STEM_WIDTH, 7, 2, 3, vb.pp("conv1"))?;
        let bn1 = FrozenBatchNorm::load(STEM_WIDTH, vb.pp("bn1"))?;

        let stage_planes = [64, 128, 256, 512];
        let stage_strides = [1, 2, 2, 2];
        let mut in_channels = STEM_WIDTH;
        let mut blocks = Vec::new();

        for (stage, &count) in architecture.blocks_per_stage().iter().enumerate() {
            let vb_stage = vb.pp(format!("layer{}", stage + 1));
            let planes = stage_planes[stage];
            for index in 0..count {
                let stride = if index == 0 { stage_strides[stage] } else { 1 };
                let vb_block = vb_stage.pp(index.to_string());
                let block = if architecture.uses_bottleneck() {
                    Block::Bottleneck(Bottleneck::load(in_channels, planes, stride, vb_block)?)
                } else {
                    Block::Basic(BasicBlock::load(in_channels, planes, stride, vb_block)?)
                };
                blocks.push(block);
                in_channels = planes * architecture.expansion();
            }
        }

        let fc = candle_nn::linear(in_channels, num_classes, vb.pp("fc"))?;

        Ok(Self {
            conv1,
            bn1,
            blocks,
            fc,
        })
    }
}

impl Module for ResNet {
    /// `(batch, 3, H, W)` normalized images to `(batch, num_classes)` logits.
    fn forward(&self, x: &Tensor) -> Result<Tensor> {
        let x = self.bn1.forward(&self.conv1.forward(x)?)?.relu()?;
        let mut x = stem_pool(&x)?;
        for block in &self.blocks {
            x = block.forward(&x)?;
        }
        let pooled = x.mean(D::Minus1)?.mean(D::Minus1)?;
        self.fc.forward(&pooled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    /// Loads a module twice: once to create its variables, then again after
    /// `weights` have been written over them.
    fn load_with<T>(load: impl Fn(VarBuilder) -> Result<T>, weights: &[(&str, Tensor)]) -> T {
        let device = Device::Cpu;
        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        load(vb.clone()).unwrap();
        for (name, value) in weights {
            varmap.set_one(*name, value).unwrap();
        }
        load(vb).unwrap()
    }

    fn tensor(values: &[f32], shape: &[usize]) -> Tensor {
        Tensor::from_slice(values, shape, &Device::Cpu).unwrap()
    }

    fn identity_kernel() -> Tensor {
        let mut kernel = [0.0f32; 9];
        kernel[4] = 1.0;
        tensor(&kernel, &[1, 1, 3, 3])
    }

    fn assert_close(actual: &Tensor, expected: &[f32]) {
        let actual: Vec<f32> = actual.flatten_all().unwrap().to_vec1().unwrap();
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-3, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_frozen_batch_norm_uses_running_stats() {
        let device = Device::Cpu;
        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        // creates the variables so they can be overwritten below
        FrozenBatchNorm::load(2, vb.clone()).unwrap();
        varmap
            .set_one("running_mean", Tensor::new(&[1.0f32, -2.0], &device).unwrap())
            .unwrap();
        varmap
            .set_one("running_var", Tensor::new(&[4.0f32, 1.0], &device).unwrap())
            .unwrap();
        varmap
            .set_one("weight", Tensor::new(&[2.0f32, 1.0], &device).unwrap())
            .unwrap();
        varmap
            .set_one("bias", Tensor::new(&[0.5f32, 0.0], &device).unwrap())
            .unwrap();
        // scale and shift are folded at load time
        let bn = FrozenBatchNorm::load(2, vb).unwrap();

        let x = Tensor::new(&[3.0f32, 0.0], &device)
            .unwrap()
            .reshape((1, 2, 1, 1))
            .unwrap();
        let y: Vec<f32> = bn.forward(&x).unwrap().flatten_all().unwrap().to_vec1().unwrap();

        // (3 - 1) / sqrt(4 + eps) * 2 + 0.5 and (0 + 2) / sqrt(1 + eps)
        assert!((y[0] - 2.5).abs() < 1e-4);
        assert!((y[1] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_resnet18_output_shape() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = ResNet::load(Architecture::ResNet18, 6, vb).unwrap();

        let x = Tensor::zeros((1, 3, 224, 224), DType::F32, &device).unwrap();
        let logits = model.forward(&x).unwrap();

        assert_eq!(logits.dims(), &[1, 6]);
    }

    #[test]
    fn test_parameter_names_follow_torchvision() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        ResNet::load(Architecture::ResNet50, 6, vb).unwrap();

        let data = varmap.data().lock().unwrap();
        for name in [
            "conv1.weight",
            "bn1.running_var",
            "layer1.0.conv3.weight",
            "layer1.0.downsample.0.weight",
            "layer2.0.downsample.1.running_mean",
            "layer3.5.bn2.bias",
            "layer4.2.conv1.weight",
            "fc.weight",
            "fc.bias",
        ] {
            assert!(data.contains_key(name), "missing {}", name);
        }
        assert!(!data.contains_key("layer1.1.downsample.0.weight"));
        assert_eq!(data["fc.weight"].dims(), &[6, 2048]);
        assert_eq!(data["layer1.0.conv2.weight"].dims(), &[64, 64, 3, 3]);
    }

    #[test]
    fn test_basic_block_adds_the_shortcut_before_relu() {
        let block = load_with(
            |vb| BasicBlock::load(1, 1, 1, vb),
            &[
                ("conv1.weight", identity_kernel()),
                ("conv2.weight", identity_kernel()),
            ],
        );

        let x = tensor(&[-1.0, 2.0], &[1, 1, 1, 2]);
        let y = block.forward(&x).unwrap();

        // relu(relu(x) + x): [-1 + 0, 2 + 2] then clamped
        assert_close(&y, &[0.0, 4.0]);
    }

    #[test]
    fn test_bottleneck_forward() {
        let block = load_with(
            |vb| Bottleneck::load(4, 1, 1, vb),
            &[
                ("conv1.weight", tensor(&[1.0, 0.0, 0.0, 0.0], &[1, 4, 1, 1])),
                ("conv2.weight", identity_kernel()),
                ("conv3.weight", tensor(&[1.0; 4], &[4, 1, 1, 1])),
            ],
        );
        assert!(block.downsample.is_none());

        let x = tensor(&[2.0, -3.0, 1.0, -0.5], &[1, 4, 1, 1]);
        let y = block.forward(&x).unwrap();

        // channel 0 is broadcast back to all four outputs, then the input is added
        assert_close(&y, &[4.0, 0.0, 3.0, 1.5]);
    }

    #[test]
    fn test_strided_block_projects_the_shortcut() {
        let block = load_with(
            |vb| BasicBlock::load(1, 2, 2, vb),
            &[
                ("conv1.weight", Tensor::zeros((2, 1, 3, 3), DType::F32, &Device::Cpu).unwrap()),
                ("downsample.0.weight", tensor(&[1.0, 1.0], &[2, 1, 1, 1])),
            ],
        );

        let values: Vec<f32> = (0..16).map(|i| i as f32 - 5.0).collect();
        let x = tensor(&values, &[1, 1, 4, 4]);
        let y = block.forward(&x).unwrap();

        // the main path is zero, so only the stride-2 samples of x survive
        assert_eq!(y.dims(), &[1, 2, 2, 2]);
        assert_close(&y, &[0.0, 0.0, 3.0, 5.0, 0.0, 0.0, 3.0, 5.0]);
    }

    #[test]
    fn test_stem_pool_pads_by_one() {
        let values: Vec<f32> = (0..16).map(|i| i as f32).collect();
        let x = tensor(&values, &[1, 1, 4, 4]);

        let y = stem_pool(&x).unwrap();

        assert_eq!(y.dims(), &[1, 1, 2, 2]);
        assert_close(&y, &[5.0, 7.0, 13.0, 15.0]);
    }

    #[test]
    fn test_resnet50_forward_runs_bottlenecks() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let model = ResNet::load(Architecture::ResNet50, 6, vb).unwrap();

        let x = Tensor::ones((1, 3, 64, 64), DType::F32, &device).unwrap();
        let logits: Vec<f32> = model.forward(&x).unwrap().flatten_all().unwrap().to_vec1().unwrap();

        assert_eq!(logits.len(), 6);
        assert!(logits.iter().all(|v| v.is_finite()));
    }
}
