use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {value}")]
pub struct InvalidConfigValue {
    pub field: &'static str,
    pub value: String,
}

/// torchvision ResNet variants the loader can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    ResNet18,
    ResNet34,
    ResNet50,
}

impl Architecture {
    pub fn as_str(self) -> &'static str {
        match self {
            Architecture::ResNet18 => "resnet18",
            Architecture::ResNet34 => "resnet34",
            Architecture::ResNet50 => "resnet50",
        }
    }

    /// Blocks per stage, `layer1` through `layer4`.
    pub fn blocks_per_stage(self) -> [usize; 4] {
        match self {
            Architecture::ResNet18 => [2, 2, 2, 2],
            Architecture::ResNet34 | Architecture::ResNet50 => [3, 4, 6, 3],
        }
    }

    pub fn uses_bottleneck(self) -> bool {
        matches!(self, Architecture::ResNet50)
    }

    pub fn expansion(self) -> usize {
        if self.uses_bottleneck() {
            4
        } else {
            1
        }
    }

    /// Width of the pooled feature vector fed to the classification head.
    pub fn feature_width(self) -> usize {
        512 * self.expansion()
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = InvalidConfigValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "resnet18" => Ok(Architecture::ResNet18),
            "resnet34" => Ok(Architecture::ResNet34),
            "resnet50" => Ok(Architecture::ResNet50),
            _ => Err(InvalidConfigValue {
                field: "architecture",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Cpu,
    Cuda(usize),
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Cpu => write!(f, "cpu"),
            DeviceKind::Cuda(ordinal) => write!(f, "cuda:{}", ordinal),
        }
    }
}

/// Accepts `cpu`, `cuda`/`gpu` (device 0) and `cuda:N`.
impl FromStr for DeviceKind {
    type Err = InvalidConfigValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidConfigValue {
            field: "device",
            value: s.to_string(),
        };
        let lowered = s.trim().to_lowercase();
        match lowered.as_str() {
            "cpu" => Ok(DeviceKind::Cpu),
            "cuda" | "gpu" => Ok(DeviceKind::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|ordinal| ordinal.parse().ok())
                .map(DeviceKind::Cuda)
                .ok_or_else(invalid),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub weights_path: PathBuf,
    pub architecture: Architecture,
    pub device: DeviceKind,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::from("models/waste_model.safetensors"),
            architecture: Architecture::ResNet50,
            device: DeviceKind::Cpu,
        }
    }
}
