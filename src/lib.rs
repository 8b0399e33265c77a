//! Waste photo classifier: decodes an image, runs a ResNet over it and maps
//! the predicted material to disposal guidance.
//!
//! ```no_run
//! use smart_recycle::config::Config;
//! use smart_recycle::library::logger::impl_console::LoggerConsole;
//! use smart_recycle::prediction_service::PredictionService;
//! use std::sync::Arc;
//!
//! let config = Config::default();
//! let logger = Arc::new(LoggerConsole::new(config.logger_timezone));
//! let service = PredictionService::load(&config.model, logger)?;
//! let result = service.predict(&std::fs::read("bottle.jpg")?)?;
//! println!("{} -> {} bin", result.label, result.bin_color);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod category;
pub mod config;
pub mod disposal;
pub mod error;
pub mod image_classifier;
pub mod library;
pub mod prediction_service;
pub mod preprocess;
