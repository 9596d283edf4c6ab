//! Run options for the refdocs binary.

use std::fs;
use std::path::{Path, PathBuf};

use refdocs_core::GeneratorConfig;
use refdocs_error::{Error, Result};

pub const DEFAULT_CONFIG: &str = "config/config.json";
pub const DEFAULT_TEMPLATE_DIR: &str = "templates/html";

/// Where the finished document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    /// Serve over HTTP on `addr` (`:8080` binds every interface).
    Http(String),
}

#[derive(Debug, Clone)]
pub struct RefdocsOptions {
    pub api_dir: PathBuf,
    pub config: PathBuf,
    pub template_dir: PathBuf,
    pub target: OutputTarget,
    /// Revision printed in the footer; looked up with git when unset.
    pub revision: Option<String>,
}

impl RefdocsOptions {
    pub fn new(api_dir: impl Into<PathBuf>, target: OutputTarget) -> Self {
        Self {
            api_dir: api_dir.into(),
            config: PathBuf::from(DEFAULT_CONFIG),
            template_dir: PathBuf::from(DEFAULT_TEMPLATE_DIR),
            target,
            revision: None,
        }
    }

    pub fn with_config(mut self, config: impl Into<PathBuf>) -> Self {
        self.config = config.into();
        self
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = dir.into();
        self
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Both input locations must be existing directories.
    pub fn validate(&self) -> Result<()> {
        require_dir(&self.api_dir, "api-dir")?;
        require_dir(&self.template_dir, "template-dir")
    }

    pub fn load_config(&self) -> Result<GeneratorConfig> {
        let source = fs::read_to_string(&self.config).map_err(|e| {
            Error::from(e)
                .with_operation("options::load_config")
                .with_context("path", self.config.display().to_string())
        })?;
        GeneratorConfig::from_json(&source)
            .map_err(|e| e.with_context("path", self.config.display().to_string()))
    }
}

fn require_dir(path: &Path, flag: &'static str) -> Result<()> {
    let shown = path.display().to_string();
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::input_location(shown, "not a directory").with_context("flag", flag)),
        Err(e) => Err(Error::input_location(shown, "cannot stat")
            .with_context("flag", flag)
            .set_source(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refdocs_error::ErrorKind;

    #[test]
    fn test_defaults_follow_repository_layout() {
        let opts = RefdocsOptions::new("apis", OutputTarget::Http(":8080".into()));
        assert_eq!(opts.config, PathBuf::from("config/config.json"));
        assert_eq!(opts.template_dir, PathBuf::from("templates/html"));
        assert_eq!(opts.revision, None);
    }

    #[test]
    fn test_validate_rejects_files_and_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("apis.json");
        fs::write(&file, "{}").unwrap();

        let opts = RefdocsOptions::new(&file, OutputTarget::File("out.html".into()))
            .with_template_dir(dir.path());
        assert_eq!(opts.validate().unwrap_err().kind(), ErrorKind::InputLocation);

        let opts = RefdocsOptions::new(dir.path(), OutputTarget::File("out.html".into()))
            .with_template_dir(dir.path().join("missing"));
        assert_eq!(opts.validate().unwrap_err().kind(), ErrorKind::InputLocation);

        let opts = RefdocsOptions::new(dir.path(), OutputTarget::File("out.html".into()))
            .with_template_dir(dir.path());
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_load_config_reports_kind() {
        let dir = tempfile::tempdir().unwrap();
        let opts = RefdocsOptions::new(dir.path(), OutputTarget::File("out.html".into()))
            .with_config(dir.path().join("config.json"));
        assert_eq!(opts.load_config().unwrap_err().kind(), ErrorKind::FileNotFound);

        fs::write(dir.path().join("config.json"), r#"{"hideMembers": []}"#).unwrap();
        assert_eq!(opts.load_config().unwrap_err().kind(), ErrorKind::ConfigInvalid);

        fs::write(dir.path().join("config.json"), r#"{"hideMemberFields": ["TypeMeta"]}"#).unwrap();
        let config = opts.load_config().unwrap();
        assert_eq!(config.hidden_member_fields, vec!["TypeMeta".to_string()]);
    }
}
