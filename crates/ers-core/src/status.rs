use std::fmt;

use crate::error::SwapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "ok",
            Severity::Info => "info",
            Severity::Warning => "warn",
            Severity::Error => "error",
        }
    }
}

/// One user-facing line: what happened and how much it matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub severity: Severity,
    pub message: String,
}

impl Status {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self { severity, message: message.into() }
    }
    pub fn success(message: impl Into<String>) -> Self { Self::new(Severity::Success, message) }
    pub fn info(message: impl Into<String>) -> Self { Self::new(Severity::Info, message) }
    pub fn warning(message: impl Into<String>) -> Self { Self::new(Severity::Warning, message) }
}

impl From<&SwapError> for Status {
    fn from(e: &SwapError) -> Self { Status::new(e.severity(), e.to_string()) }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity.as_str(), self.message)
    }
}

/// Statuses collected while an operation runs, in the order they happened.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub statuses: Vec<Status>,
}

impl Report {
    pub fn push(&mut self, status: Status) {
        match status.severity {
            Severity::Error => log::error!("{}", status.message),
            Severity::Warning => log::warn!("{}", status.message),
            _ => log::info!("{}", status.message),
        }
        self.statuses.push(status);
    }

    /// Close out an operation: a failure becomes the final status instead of propagating.
    pub fn finish<T>(mut self, res: Result<T, SwapError>) -> Vec<Status> {
        if let Err(e) = res {
            self.push(Status::from(&e));
        }
        self.statuses
    }
}
