use crate::image_classifier::models::model_config::ModelConfig;
use chrono::{FixedOffset, Offset, Utc};

const CENTRAL_EUROPEAN_OFFSET_SECS: i32 = 3600;

#[derive(Debug, Clone)]
pub struct Config {
    pub model: ModelConfig,
    pub logger_timezone: FixedOffset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            logger_timezone: central_european_time(),
        }
    }
}

fn central_european_time() -> FixedOffset {
    FixedOffset::east_opt(CENTRAL_EUROPEAN_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}
