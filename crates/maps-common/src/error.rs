use std::fmt;

use serde::Serialize;

/// How serious a reported diagnostic is.
///
/// Only `Error` invalidates a compilation unit; warnings and notes are
/// collected and rendered but code generation may still proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl Severity {
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }

    /// The matching `log` level, used when a diagnostic is echoed to the log.
    pub fn log_level(self) -> log::Level {
        match self {
            Severity::Note => log::Level::Info,
            Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Note => write!(f, "note"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}
