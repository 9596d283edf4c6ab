//! Template rendering of the resolved documentation model.
//!
//! Every `*.tpl` file of the template directory is registered under its file
//! stem; rendering starts at `page`. Templates receive `packages`, `config`
//! and `gitCommit`, and call the model's operations by name
//! (`typeDisplayName`, `linkForType`, `visibleTypes`, ...).
//!
//! # Module Structure
//!
//! - [`objects`]: package/type/member views handed to templates
//! - [`functions`]: operation registration
//! - [`revision`]: best-effort VCS revision lookup
//! - [`postprocess`]: whitespace stripping of the rendered document

pub mod functions;
pub mod objects;
pub mod postprocess;
pub mod revision;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use minijinja::value::Value;
use minijinja::{AutoEscape, Environment};
use tracing::{debug, warn};

use refdocs_core::{DocOps, ReferenceDocs};
use refdocs_error::{Error, ErrorKind, Result};

pub use objects::{MemberObject, PackageObject, SharedDocs, TypeObject};
pub use postprocess::strip_whitespace;
pub use revision::current_revision;

/// Name of the entry template.
pub const ENTRY_TEMPLATE: &str = "page";
const TEMPLATE_EXTENSION: &str = "tpl";

// ============================================================================
// Options
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub template_dir: PathBuf,
    /// Revision to print; `None` looks it up with git unless disabled.
    pub revision: Option<String>,
    /// Directory git is asked about; defaults to the working directory.
    pub revision_dir: Option<PathBuf>,
}

impl RenderOptions {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_revision_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.revision_dir = Some(dir.into());
        self
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Read every `*.tpl` file of `dir`, sorted by name, as `(stem, source)`.
pub fn load_templates(dir: &Path) -> Result<Vec<(String, String)>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        Error::from(e)
            .with_operation("render::load_templates")
            .with_context("dir", dir.display().to_string())
    })?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut templates = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let source = fs::read_to_string(&path).map_err(|e| {
            Error::from(e)
                .with_operation("render::load_templates")
                .with_context("path", path.display().to_string())
        })?;
        debug!(template = stem, "loaded template");
        templates.push((stem.to_string(), source));
    }
    Ok(templates)
}

fn build_environment(docs: &SharedDocs, templates: Vec<(String, String)>) -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    functions::register(&mut env, docs);

    for (name, source) in templates {
        env.add_template_owned(name.clone(), source).map_err(|e| {
            Error::template_error(format!("parse error in template {}", name))
                .with_operation("render::build_environment")
                .with_context("template", name)
                .set_source(e)
        })?;
    }

    if env.get_template(ENTRY_TEMPLATE).is_err() {
        return Err(Error::template_error(format!(
            "no {}.{} template found",
            ENTRY_TEMPLATE, TEMPLATE_EXTENSION
        ))
        .with_operation("render::build_environment"));
    }
    Ok(env)
}

/// Turn a template failure back into the model error that caused it.
fn recover_error(err: minijinja::Error) -> Error {
    let (kind, message) = model_cause(&err).unwrap_or_else(|| {
        (ErrorKind::RenderFailed, "template execution error".to_string())
    });
    Error::new(kind, message)
        .with_operation("render::page")
        .set_source(err)
}

fn model_cause(err: &minijinja::Error) -> Option<(ErrorKind, String)> {
    let mut cause = std::error::Error::source(err);
    while let Some(current) = cause {
        if let Some(inner) = current.downcast_ref::<Error>() {
            return Some((inner.kind(), inner.message().to_string()));
        }
        cause = current.source();
    }
    None
}

// ============================================================================
// Rendering
// ============================================================================

/// Render `docs` with the templates of `options.template_dir`.
pub fn render(docs: SharedDocs, options: &RenderOptions) -> Result<String> {
    let templates = load_templates(&options.template_dir)?;
    render_with_templates(docs, templates, options)
}

/// Render with templates already in memory.
pub fn render_with_templates(
    docs: SharedDocs,
    templates: Vec<(String, String)>,
    options: &RenderOptions,
) -> Result<String> {
    let env = build_environment(&docs, templates)?;

    let git_commit = if docs.config().git_commit_disabled {
        String::new()
    } else {
        match &options.revision {
            Some(revision) => revision.clone(),
            None => {
                let dir = options.revision_dir.clone().unwrap_or_else(|| PathBuf::from("."));
                current_revision(&dir).unwrap_or_default()
            }
        }
    };

    let packages: Vec<Value> = (0..docs.packages().len())
        .map(|index| PackageObject::value(&docs, index))
        .collect();

    let ctx = minijinja::context! {
        packages => packages,
        config => Value::from_serialize(docs.config()),
        gitCommit => git_commit,
    };

    let template = env
        .get_template(ENTRY_TEMPLATE)
        .map_err(|e| Error::template_error("entry template missing").set_source(e))?;
    template.render(ctx).map_err(recover_error)
}

/// Render, then strip whitespace unless the configuration preserves it.
///
/// Unresolved external links are summarized once the document is complete.
pub fn generate_doc(docs: Arc<ReferenceDocs>, options: &RenderOptions) -> Result<String> {
    let shared: SharedDocs = docs.clone();
    let doc = render(shared, options).map_err(|e| e.with_operation("render::generate_doc"))?;

    let unresolved = docs.unresolved_links();
    if !unresolved.is_empty() {
        warn!(
            "{} type(s) have no external link source: {}",
            unresolved.len(),
            unresolved.join(", ")
        );
    }

    if docs.config().preserve_trailing_whitespace {
        Ok(doc)
    } else {
        Ok(strip_whitespace(&doc))
    }
}
