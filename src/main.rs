use clap::Parser;
use serde::Serialize;
use smart_recycle::config::Config;
use smart_recycle::error::ModelLoadError;
use smart_recycle::image_classifier::models::model_config::{Architecture, DeviceKind};
use smart_recycle::library::logger::impl_console::{Level, LoggerConsole};
use smart_recycle::prediction_service::{PredictionResult, PredictionService};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "smart-recycle")]
#[command(about = "Classify photographed waste and print where it should be thrown away")]
struct Args {
    /// Path to the safetensors weight file
    #[arg(short, long, env = "SMART_RECYCLE_WEIGHTS")]
    weights: Option<PathBuf>,

    /// Backbone architecture: resnet18, resnet34 or resnet50
    #[arg(short, long, env = "SMART_RECYCLE_ARCH")]
    arch: Option<Architecture>,

    /// Device to run on: cpu, cuda, or cuda:N
    #[arg(short, long, env = "SMART_RECYCLE_DEVICE")]
    device: Option<DeviceKind>,

    /// Also log every prediction
    #[arg(short, long)]
    verbose: bool,

    /// Images to classify
    #[arg(required = true)]
    images: Vec<PathBuf>,
}

#[derive(Serialize)]
struct PredictionLine<'a> {
    filename: String,
    #[serde(flatten)]
    prediction: &'a PredictionResult,
}

#[derive(Serialize)]
struct ErrorLine {
    filename: String,
    error: &'static str,
    message: String,
}

fn main() -> Result<(), ModelLoadError> {
    let args = Args::parse();

    let mut config = Config::default();
    if let Some(weights) = args.weights {
        config.model.weights_path = weights;
    }
    if let Some(arch) = args.arch {
        config.model.architecture = arch;
    }
    if let Some(device) = args.device {
        config.model.device = device;
    }

    let min_level = if args.verbose {
        Level::Debug
    } else {
        Level::Info
    };
    let logger = Arc::new(LoggerConsole::new(config.logger_timezone).with_min_level(min_level));

    let service = PredictionService::load(&config.model, logger)?;

    for path in &args.images {
        let filename = path.display().to_string();
        let line = match std::fs::read(path) {
            Ok(bytes) => match service.predict(&bytes) {
                Ok(prediction) => serde_json::to_string(&PredictionLine {
                    filename,
                    prediction: &prediction,
                }),
                Err(e) => serde_json::to_string(&ErrorLine {
                    filename,
                    error: e.kind(),
                    message: error_chain(&e),
                }),
            },
            Err(e) => serde_json::to_string(&ErrorLine {
                filename,
                error: "io_error",
                message: e.to_string(),
            }),
        };
        match line {
            Ok(line) => println!("{}", line),
            Err(e) => eprintln!("failed to serialize result for {}: {}", path.display(), e),
        }
    }

    Ok(())
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
