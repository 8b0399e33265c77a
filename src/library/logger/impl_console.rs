use crate::library::logger::interface::{Logger, LoggerError};
use chrono::Utc;
use std::io::Write;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
}

#[derive(Debug, Clone)]
pub struct LoggerConsole {
    namespace: Option<String>,
    timezone: chrono::FixedOffset,
    min_level: Level,
}

impl LoggerConsole {
    pub fn new(timezone: chrono::FixedOffset) -> Self {
        Self {
            namespace: None,
            timezone,
            min_level: Level::Info,
        }
    }

    pub fn with_min_level(mut self, min_level: Level) -> Self {
        self.min_level = min_level;
        self
    }

    fn format_line(&self, level: Level, message: &str) -> String {
        let local_time = Utc::now().with_timezone(&self.timezone);
        let formatted = local_time.format("%Y-%m-%d %I:%M:%S%.3f %p");
        let level = match level {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
        };
        match &self.namespace {
            Some(namespace) => format!("[{}] {} {}: {}", formatted, level, namespace, message),
            None => format!("[{}] {} {}", formatted, level, message),
        }
    }

    fn write(&self, level: Level, message: &str) -> Result<(), LoggerError> {
        if level < self.min_level {
            return Ok(());
        }
        // stdout carries prediction output, so log lines go to stderr
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "{}", self.format_line(level, message))?;
        Ok(())
    }
}

impl Logger for LoggerConsole {
    fn info(&self, message: &str) -> Result<(), LoggerError> {
        self.write(Level::Info, message)
    }

    fn debug(&self, message: &str) -> Result<(), LoggerError> {
        self.write(Level::Debug, message)
    }

    fn with_namespace(&self, namespace: &str) -> Arc<dyn Logger> {
        let new_namespace = match &self.namespace {
            Some(current) => format!("{}:{}", current, namespace),
            None => namespace.to_string(),
        };

        Arc::new(LoggerConsole {
            namespace: Some(new_namespace),
            timezone: self.timezone,
            min_level: self.min_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Offset, Utc};

    #[test]
    fn test_format_line_includes_namespace_chain() {
        let logger = LoggerConsole {
            namespace: Some("prediction_service:candle".to_string()),
            timezone: Utc.fix(),
            min_level: Level::Info,
        };

        let line = logger.format_line(Level::Info, "model ready");

        assert!(line.ends_with("INFO prediction_service:candle: model ready"));
    }

    #[test]
    fn test_format_line_without_namespace() {
        let logger = LoggerConsole::new(Utc.fix());

        let line = logger.format_line(Level::Debug, "hello");

        assert!(line.starts_with('['));
        assert!(line.ends_with("DEBUG hello"));
    }

    #[test]
    fn test_debug_is_filtered_below_min_level() {
        let logger = LoggerConsole::new(Utc.fix());

        assert!(logger.debug("dropped").is_ok());
        assert!(logger.info("kept").is_ok());
    }
}
