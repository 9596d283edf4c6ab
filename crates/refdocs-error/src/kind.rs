//! Error kinds for refdocs operations

use strum_macros::{Display, IntoStaticStr};

/// The kind of error that occurred.
///
/// Callers match on `ErrorKind` to decide whether a condition aborts the run
/// or is only recorded as a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Display)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// Invalid configuration file or option
    ConfigInvalid,

    // =========================================================================
    // Input errors
    // =========================================================================
    /// The root location is missing or is not a directory
    InputLocation,

    /// The declaration store yielded no qualifying packages
    NoPackagesFound,

    /// A package manifest could not be deserialized
    DeserializationFailed,

    /// A package manifest is well-formed JSON but violates the store contract
    InvalidFormat,

    /// Two declarations share one qualified name
    DuplicateType,

    /// A type reference names a type that was never declared
    UnknownTypeReference,

    /// An `elem` or `underlying` chain loops back on itself
    CyclicType,

    // =========================================================================
    // Resolution errors
    // =========================================================================
    /// A package's trailing path segment is not an API version
    InvalidVersionFormat,

    /// A type kind is unknown, or a constant declaration has no value
    UnresolvedKind,

    /// An external package rule pattern failed to compile
    InvalidExternalPattern,

    /// A docs URL template failed to parse or execute
    TemplateError,

    /// No external package rule matched a non-local type
    LinkNotFound,

    // =========================================================================
    // Output errors
    // =========================================================================
    /// The document template failed to load or execute
    RenderFailed,

    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    /// The HTTP endpoint could not be started
    ServeFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Check if this error kind aborts the run by default
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ErrorKind::LinkNotFound)
    }
}
