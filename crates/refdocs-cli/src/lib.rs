//! refdocs command-line interface.
//!
pub mod discovery;
pub mod options;
pub mod output;
pub mod pipeline;

use refdocs_error::Result;

pub use options::{DEFAULT_CONFIG, DEFAULT_TEMPLATE_DIR, OutputTarget, RefdocsOptions};
pub use pipeline::build_document;

/// Main entry point: build the document, then write or serve it.
pub fn run_main(opts: &RefdocsOptions) -> Result<()> {
    let doc = build_document(opts)?;
    match &opts.target {
        OutputTarget::File(path) => output::write_file(path, &doc),
        OutputTarget::Http(addr) => output::serve(addr, doc),
    }
}
