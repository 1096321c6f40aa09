//! Terminal color detection and ANSI formatting.
//!
//! Colors are disabled when `NO_COLOR` is set or when output is not a TTY,
//! so rendered reports stay readable in pipes and dumb terminals.

use std::env;
use std::io::{self, IsTerminal};

/// Color support detection and formatting
pub struct ColorSupport {
    enabled: bool,
}

impl ColorSupport {
    /// Detect color support automatically
    pub fn detect() -> Self {
        Self {
            enabled: Self::should_use_colors(),
        }
    }

    /// Force disable colors
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    fn should_use_colors() -> bool {
        if env::var("NO_COLOR").is_ok() {
            return false;
        }
        io::stdout().is_terminal() && io::stderr().is_terminal()
    }

    pub fn green(&self, text: &str) -> String {
        self.wrap("\x1b[32m", text)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.wrap("\x1b[33m", text)
    }

    pub fn red(&self, text: &str) -> String {
        self.wrap("\x1b[31m", text)
    }

    pub fn cyan(&self, text: &str) -> String {
        self.wrap("\x1b[36m", text)
    }

    pub fn bold(&self, text: &str) -> String {
        self.wrap("\x1b[1m", text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.wrap("\x1b[2m", text)
    }

    fn wrap(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("{code}{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}
