//! Core pipeline: load manifests → select → group → resolve → render.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use refdocs_core::{ReferenceDocs, Universe, combine_packages, select_packages};
use refdocs_error::{Error, Result};
use refdocs_render::{RenderOptions, generate_doc};

use crate::RefdocsOptions;
use crate::discovery::load_packages;

/// Build the reference document for `opts`.
///
/// Any failure aborts the run before output is produced.
pub fn build_document(opts: &RefdocsOptions) -> Result<String> {
    opts.validate()?;
    let config = opts.load_config()?;

    // 1. Load
    let load_start = Instant::now();
    let raw = load_packages(&opts.api_dir)?;
    let universe = Universe::from_packages(raw)?;
    info!(
        "Declaration loading: {:.2}s ({} source packages)",
        load_start.elapsed().as_secs_f64(),
        universe.packages().len()
    );

    // 2. Select and group
    let group_start = Instant::now();
    let packages = {
        let selected = select_packages(&universe);
        if selected.is_empty() {
            return Err(Error::no_packages_found(opts.api_dir.display().to_string())
                .with_operation("pipeline::build_document"));
        }
        combine_packages(&selected)?
    };
    info!(
        "Grouping: {:.2}s ({} API packages)",
        group_start.elapsed().as_secs_f64(),
        packages.len()
    );

    // 3. Resolve
    let resolve_start = Instant::now();
    let docs = Arc::new(ReferenceDocs::new(universe, packages, config)?);
    info!("Resolution: {:.2}s", resolve_start.elapsed().as_secs_f64());

    // 4. Render
    let render_start = Instant::now();
    let mut render_options = RenderOptions::new(&opts.template_dir);
    if let Some(revision) = &opts.revision {
        render_options = render_options.with_revision(revision.clone());
    }
    let doc = generate_doc(docs, &render_options)?;
    info!(
        "Rendering: {:.2}s ({} bytes)",
        render_start.elapsed().as_secs_f64(),
        doc.len()
    );

    Ok(doc)
}
