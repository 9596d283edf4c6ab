//! Generator configuration, as read from the JSON config file.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use refdocs_error::{Error, ErrorKind, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Fields with these names are hidden on every type.
    #[serde(rename = "hideMemberFields", default)]
    pub hidden_member_fields: Vec<String>,

    /// Types whose qualified name matches one of these patterns are hidden.
    #[serde(rename = "hideTypePatterns", default)]
    pub hide_type_patterns: Vec<String>,

    /// Recognized external packages and how to link to them, tried in order.
    #[serde(rename = "externalPackages", default)]
    pub external_packages: Vec<ExternalPackage>,

    /// Display-name prefix rewrites, applied in file order.
    #[serde(rename = "typeDisplayNamePrefixOverrides", default)]
    pub type_display_name_prefix_overrides: IndexMap<String, String>,

    #[serde(rename = "markdownDisabled", default)]
    pub markdown_disabled: bool,

    #[serde(rename = "preserveTrailingWhitespace", default)]
    pub preserve_trailing_whitespace: bool,

    /// Leave the VCS revision out of the rendered document.
    #[serde(rename = "gitCommitDisabled", default)]
    pub git_commit_disabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalPackage {
    /// Regular expression matched against the qualified type identifier.
    #[serde(rename = "typeMatchPrefix")]
    pub type_match_prefix: String,

    /// URL template; sees `TypeIdentifier`, `PackagePath`, `PackageSegments`.
    #[serde(rename = "docsURLTemplate")]
    pub docs_url_template: String,
}

impl GeneratorConfig {
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| {
            Error::new(ErrorKind::ConfigInvalid, "failed to parse config file")
                .with_operation("config::from_json")
                .set_source(e)
        })
    }

    pub fn with_hidden_member_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden_member_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_hide_type_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hide_type_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_external_package(
        mut self,
        type_match_prefix: impl Into<String>,
        docs_url_template: impl Into<String>,
    ) -> Self {
        self.external_packages.push(ExternalPackage {
            type_match_prefix: type_match_prefix.into(),
            docs_url_template: docs_url_template.into(),
        });
        self
    }

    pub fn with_prefix_override(
        mut self,
        prefix: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        self.type_display_name_prefix_overrides
            .insert(prefix.into(), replacement.into());
        self
    }

    pub fn with_markdown_disabled(mut self, disabled: bool) -> Self {
        self.markdown_disabled = disabled;
        self
    }

    pub fn with_preserve_trailing_whitespace(mut self, preserve: bool) -> Self {
        self.preserve_trailing_whitespace = preserve;
        self
    }

    pub fn with_git_commit_disabled(mut self, disabled: bool) -> Self {
        self.git_commit_disabled = disabled;
        self
    }
}
