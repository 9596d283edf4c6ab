//! Manifest discovery under the api directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ignore::WalkBuilder;
use tracing::{debug, info};

use refdocs_core::RawPackage;
use refdocs_error::{Error, ErrorKind, Result};

const MANIFEST_EXTENSION: &str = "json";

/// Every `*.json` file under `root`, in sorted order.
pub fn discover_manifests(root: &Path) -> Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(true)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut manifests = Vec::new();
    for entry in builder.build() {
        let entry = entry.map_err(|e| {
            Error::new(
                ErrorKind::IoFailed,
                format!("failed to walk directory {}: {e}", root.display()),
            )
            .with_operation("discovery::discover_manifests")
        })?;

        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == MANIFEST_EXTENSION) {
            manifests.push(path.to_path_buf());
        }
    }
    manifests.sort();
    Ok(manifests)
}

/// Read and parse every manifest under `root`.
pub fn load_packages(root: &Path) -> Result<Vec<RawPackage>> {
    let start = Instant::now();
    let manifests = discover_manifests(root)?;

    let mut packages = Vec::with_capacity(manifests.len());
    for path in &manifests {
        let shown = path.display().to_string();
        let source = fs::read_to_string(path).map_err(|e| {
            Error::from(e)
                .with_operation("discovery::load_packages")
                .with_context("path", shown.clone())
        })?;
        let package = RawPackage::from_json(&source).map_err(|e| e.with_context("path", shown))?;
        debug!(path = %path.display(), package = %package.path, "loaded manifest");
        packages.push(package);
    }

    info!(
        "Manifest discovery: {:.2}s ({} manifests)",
        start.elapsed().as_secs_f64(),
        packages.len()
    );
    Ok(packages)
}
