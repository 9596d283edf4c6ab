//! # refdocs-error
//!
//! Unified error handling for refdocs.
//!
//! - **ErrorKind**: what went wrong (e.g. InvalidVersionFormat, TemplateError)
//! - **ErrorStatus**: whether the run stops (Fatal) or keeps going (Recorded)
//! - **Error Context**: key/value pairs that locate the cause
//! - **Error Source**: the wrapped underlying error
//!
//! ## Usage
//!
//! ```rust
//! use refdocs_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::InvalidVersionFormat, "basename is not a version")
//!         .with_operation("group::api_version_for_package")
//!         .with_context("package", "example.io/apis/widgets/alpha"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, refdocs_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using refdocs Error
pub type Result<T> = std::result::Result<T, Error>;
