use std::io::{self, BufRead, Write};
use std::sync::{Mutex, PoisonError};

use refscope_app::{DialogService, Popover};
use tracing::debug;

/// Dialogs on stdout/stdin. In JSON mode nothing is printed and every
/// question is declined so scripts never block on a prompt.
pub struct TerminalDialog {
    json: bool,
    notifications: Mutex<Vec<String>>,
}

impl TerminalDialog {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            notifications: Mutex::new(Vec::new()),
        }
    }

    pub fn notifications(&self) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn ask(&self, prompt: &str) -> bool {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "{prompt} [y/N] ");
        let _ = stderr.flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        }
    }
}

impl DialogService for TerminalDialog {
    fn notify(&self, message: &str) {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
        if !self.json {
            println!("{message}");
        }
    }

    fn confirm(&self, title: &str, message: &str, action_label: &str) -> bool {
        if self.json {
            return false;
        }
        eprintln!("{title}: {message}");
        self.ask(&format!("{action_label}?"))
    }
}

/// The terminal has no popover; the prompt line simply ends.
pub struct PromptLine;

impl Popover for PromptLine {
    fn hide(&self) {
        debug!("prompt closed");
    }
}
