//! Error status for propagation policy

use std::fmt;

/// The status of an error, indicating whether the run may continue.
///
/// - `Fatal`: abort the whole run, write no output
/// - `Recorded`: keep going, the condition is kept as a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorStatus {
    /// Error aborts the run.
    ///
    /// Examples: InvalidVersionFormat, TemplateError, UnresolvedKind
    #[default]
    Fatal,

    /// Error is recorded and processing continues.
    ///
    /// Examples: LinkNotFound
    Recorded,
}

impl ErrorStatus {
    /// Check if the run must stop
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorStatus::Fatal)
    }

    /// Get status as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorStatus::Fatal => "fatal",
            ErrorStatus::Recorded => "recorded",
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_fatal() {
        assert!(ErrorStatus::Fatal.is_fatal());
        assert!(!ErrorStatus::Recorded.is_fatal());
        assert_eq!(ErrorStatus::default(), ErrorStatus::Fatal);
    }
}
