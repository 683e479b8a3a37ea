//! Injected logging capability
//!
//! Queue components take an `Arc<dyn Logger>` at construction instead of
//! writing to the process-wide logger, so tests can capture what a flush
//! pass reported without touching global state.

use log::Level;

/// A sink for queue diagnostics
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

/// Forwards to the `log` facade (and therefore to env_logger)
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLogger;

impl Logger for ProcessLogger {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: "pdrelay::queue", level, "{}", message);
    }
}

/// Captures log lines in memory
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: std::sync::Mutex<Vec<(Level, String)>>,
}

#[cfg(test)]
impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().unwrap().clone()
    }

    /// Lines at `level` that contain `needle`
    pub fn matching(&self, level: Level, needle: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, msg)| *l == level && msg.contains(needle))
            .map(|(_, msg)| msg)
            .collect()
    }
}

#[cfg(test)]
impl Logger for MemoryLogger {
    fn log(&self, level: Level, message: &str) {
        self.lines.lock().unwrap().push((level, message.to_string()));
    }
}
