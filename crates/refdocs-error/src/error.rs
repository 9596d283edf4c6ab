//! `Error`: kind, status, call chain, context and wrapped cause.

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// Every fallible refdocs operation returns this.
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    /// Status follows the kind: only recorded kinds start as `Recorded`.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let status = if kind.is_fatal() {
            ErrorStatus::Fatal
        } else {
            ErrorStatus::Recorded
        };

        Self {
            kind,
            message: message.into(),
            status,
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    /// Innermost `module::function` that reported the error.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// The wrapped cause, if any.
    pub fn source_ref(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.source.as_ref().map(|e| e.as_ref())
    }

    /// Record the reporting operation. A previously set one is kept in the
    /// context under `called`, so the chain reads outermost first.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Wrap the underlying cause. Debug builds assert it is set only once.
    pub fn set_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(Box::new(source));
        self
    }

    /// Check if this error aborts the run
    pub fn is_fatal(&self) -> bool {
        self.status.is_fatal()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.status)?;
        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }

        if !self.context.is_empty() {
            write!(f, ", context {{ ")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.message.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Message: {}", self.message)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "        {}: {}", key, value)?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "    Source: {:?}", source)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

impl Error {
    /// Create a ConfigInvalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create an InputLocation error
    pub fn input_location(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InputLocation, message).with_context("path", path)
    }

    /// Create a NoPackagesFound error
    pub fn no_packages_found(root: impl Into<String>) -> Self {
        let root = root.into();
        Self::new(
            ErrorKind::NoPackagesFound,
            format!("no API packages found in {}", root),
        )
        .with_context("root", root)
    }

    /// Create an InvalidVersionFormat error
    pub fn invalid_version_format(package: impl Into<String>, version: impl Into<String>) -> Self {
        let package = package.into();
        let version = version.into();
        Self::new(
            ErrorKind::InvalidVersionFormat,
            format!(
                "cannot infer API version of package {} (basename {:?} is not an API version)",
                package, version
            ),
        )
        .with_context("package", package)
        .with_context("version", version)
    }

    /// Create an UnresolvedKind error
    pub fn unresolved_kind(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnresolvedKind, message).with_context("type", type_name)
    }

    /// Create an InvalidExternalPattern error
    pub fn invalid_external_pattern(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        Self::new(
            ErrorKind::InvalidExternalPattern,
            format!("pattern {:?} failed to compile", pattern),
        )
        .with_context("pattern", pattern)
    }

    /// Create a TemplateError
    pub fn template_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TemplateError, message)
    }

    /// Create a LinkNotFound diagnostic
    pub fn link_not_found(type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self::new(
            ErrorKind::LinkNotFound,
            format!("no external link source for type {}", type_name),
        )
        .with_context("type", type_name)
    }

    /// Create an UnknownTypeReference error
    pub fn unknown_type_reference(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorKind::UnknownTypeReference,
            format!("type '{}' is referenced but never declared", name),
        )
        .with_context("reference", name)
    }

    /// Create a DuplicateType error
    pub fn duplicate_type(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorKind::DuplicateType,
            format!("type '{}' is declared more than once", name),
        )
        .with_context("type", name)
    }
}
