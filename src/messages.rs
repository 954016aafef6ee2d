use std::sync::{Mutex, PoisonError};

/// Messages meant for the player rather than the log file.
pub trait UserMessages: Send + Sync {
    fn info(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Routes user messages to the log.
#[derive(Default)]
pub struct LogMessages;

impl UserMessages for LogMessages {
    fn info(&self, msg: &str) {
        log::info!(target: "chat", "{}", msg);
    }

    fn error(&self, msg: &str) {
        log::error!(target: "chat", "{}", msg);
    }
}

/// Keeps every message; used by headless drivers that print a summary.
#[derive(Default)]
pub struct MessageBuffer {
    lines: Mutex<Vec<String>>,
}

impl MessageBuffer {
    pub fn take(&self) -> Vec<String> {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *lines)
    }

    fn push(&self, line: String) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines.push(line);
    }
}

impl UserMessages for MessageBuffer {
    fn info(&self, msg: &str) {
        self.push(msg.to_string());
    }

    fn error(&self, msg: &str) {
        log::warn!(target: "chat", "{}", msg);
        self.push(format!("error: {msg}"));
    }
}
