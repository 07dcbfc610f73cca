use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// Where `chapisha` writes. Cloning shares the same sink, so spawned tasks
/// print into the buffer of the interpreter that spawned them.
#[derive(Debug, Clone, Default)]
pub enum Output {
    #[default]
    Stdout,
    Captured(Arc<Mutex<String>>),
}

impl Output {
    pub fn captured() -> Self {
        Output::Captured(Arc::new(Mutex::new(String::new())))
    }

    pub fn write(&self, text: &str) {
        match self {
            Output::Stdout => {
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(text.as_bytes());
                let _ = stdout.flush();
            }
            Output::Captured(buffer) => {
                buffer.lock().unwrap_or_else(PoisonError::into_inner).push_str(text);
            }
        }
    }

    pub fn write_line(&self, text: &str) {
        match self {
            Output::Stdout => {
                let mut stdout = std::io::stdout().lock();
                let _ = writeln!(stdout, "{}", text);
            }
            Output::Captured(buffer) => {
                let mut buffer = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                buffer.push_str(text);
                buffer.push('\n');
            }
        }
    }

    /// Everything written so far, when capturing.
    pub fn contents(&self) -> Option<String> {
        match self {
            Output::Stdout => None,
            Output::Captured(buffer) => Some(buffer.lock().unwrap_or_else(PoisonError::into_inner).clone()),
        }
    }
}
