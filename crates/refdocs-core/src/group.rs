//! Package selection and grouping of source packages into API packages.
//!
//! A source package contributes to the API package keyed by its `+groupName`
//! marker and its trailing path segment (the API version). Several source
//! packages may share one key; their declarations are concatenated.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use refdocs_error::{Error, Result};

use crate::decl::{SourcePackage, TypeId, Universe};
use crate::tags::extract_comment_tags;

/// Doc comment that selects a package even without a group name.
pub const FORCE_INCLUDE_MARKER: &str = "// +gencrdrefdocs:force";

const VERSION_PATTERN: &str = r"^v\d+((alpha|beta)\d+)?$";

static VERSION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(VERSION_PATTERN).expect("version pattern is valid"));

/// One logical API package, keyed by `(group, version)`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiPackage {
    pub group: String,
    pub version: String,
    /// Paths of the contributing source packages, in processing order.
    pub source_packages: Vec<String>,
    pub types: Vec<TypeId>,
    pub constants: Vec<TypeId>,
}

impl ApiPackage {
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// `group/version`, also the package display name.
    pub fn identifier(&self) -> String {
        format!("{}/{}", self.group, self.version)
    }
}

/// Value of the package's `+groupName` marker; empty unless given exactly once.
pub fn group_name(pkg: &SourcePackage) -> String {
    let mut tags = extract_comment_tags("+", &pkg.comments);
    match tags.swap_remove("groupName") {
        Some(mut values) if values.len() == 1 => values.remove(0),
        _ => String::new(),
    }
}

pub fn is_vendor_package(pkg: &SourcePackage) -> bool {
    pkg.source_path.contains("/vendor/")
}

fn is_force_included(pkg: &SourcePackage) -> bool {
    pkg.doc_comments.iter().any(|line| line == FORCE_INCLUDE_MARKER)
}

/// Pick the packages worth documenting, sorted by path.
///
/// Vendored packages never qualify. Others need a group name and at least
/// one type, or the force-include doc comment.
pub fn select_packages(universe: &Universe) -> Vec<&SourcePackage> {
    let mut selected = Vec::new();
    for pkg in universe.packages() {
        let group = group_name(pkg);
        debug!(package = %pkg.path, group = %group, "trying package");

        if is_vendor_package(pkg) {
            debug!(package = %pkg.path, "package is vendored, ignoring");
            continue;
        }

        if (!group.is_empty() && !pkg.types.is_empty()) || is_force_included(pkg) {
            debug!(package = %pkg.path, "package has a group name and types");
            selected.push(pkg);
        }
    }

    selected.sort_by(|a, b| a.path.cmp(&b.path));
    for pkg in &selected {
        info!("using package={}", pkg.path);
    }
    selected
}

/// `(group, version)` of a source package.
///
/// The local package name is taken as the API version and must look like
/// `v1`, `v2beta3` or `v1alpha1`.
pub fn api_version_for_package(pkg: &SourcePackage) -> Result<(String, String)> {
    if !VERSION_REGEX.is_match(&pkg.name) {
        return Err(Error::invalid_version_format(&pkg.path, &pkg.name)
            .with_operation("group::api_version_for_package")
            .with_context("pattern", VERSION_PATTERN));
    }
    Ok((group_name(pkg), pkg.name.clone()))
}

/// Group source packages by `(group, version)`.
///
/// Input order does not matter: packages are processed sorted by path and the
/// result is sorted with [`sort_packages`]. Any package with a malformed
/// version fails the whole grouping.
pub fn combine_packages(pkgs: &[&SourcePackage]) -> Result<Vec<ApiPackage>> {
    let mut ordered: Vec<&SourcePackage> = pkgs.to_vec();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<ApiPackage> = Vec::new();

    for pkg in ordered {
        let (group, version) = api_version_for_package(pkg)
            .map_err(|e| e.with_operation("group::combine_packages"))?;

        let api = ApiPackage::new(group, version);
        let slot = *index.entry(api.identifier()).or_insert_with(|| {
            out.push(api);
            out.len() - 1
        });

        let target = &mut out[slot];
        target.types.extend(pkg.types.iter().copied());
        target.constants.extend(pkg.constants.iter().copied());
        target.source_packages.push(pkg.path.clone());
    }

    sort_packages(&mut out);
    Ok(out)
}

/// Stable sort by group, then version, both as plain strings.
pub fn sort_packages(packages: &mut [ApiPackage]) {
    packages.sort_by(|a, b| {
        a.group
            .cmp(&b.group)
            .then_with(|| a.version.cmp(&b.version))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{manifest, universe_of};
    use pretty_assertions::assert_eq;
    use refdocs_error::ErrorKind;
    use serde_json::json;

    fn keys(packages: &[ApiPackage]) -> Vec<(String, String)> {
        packages
            .iter()
            .map(|p| (p.group.clone(), p.version.clone()))
            .collect()
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(g, v)| (g.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_sort_packages_by_group_then_version() {
        let mut packages: Vec<ApiPackage> = [
            ("a", "v1"),
            ("c", "v1beta1"),
            ("b", "v1beta1"),
            ("c", "v1"),
            ("b", "v1"),
            ("a", "v1beta1"),
        ]
        .into_iter()
        .map(|(g, v)| ApiPackage::new(g, v))
        .collect();

        sort_packages(&mut packages);
        assert_eq!(
            keys(&packages),
            pairs(&[
                ("a", "v1"),
                ("a", "v1beta1"),
                ("b", "v1"),
                ("b", "v1beta1"),
                ("c", "v1"),
                ("c", "v1beta1"),
            ])
        );
    }

    #[test]
    fn test_versions_sort_as_plain_strings() {
        let mut packages = vec![
            ApiPackage::new("a", "v10"),
            ApiPackage::new("a", "v2"),
            ApiPackage::new("a", "v1beta1"),
            ApiPackage::new("a", "v1"),
        ];
        sort_packages(&mut packages);
        assert_eq!(
            keys(&packages),
            pairs(&[("a", "v1"), ("a", "v10"), ("a", "v1beta1"), ("a", "v2")])
        );
    }

    #[test]
    fn test_combine_sorts_and_merges() {
        let universe = universe_of(vec![
            manifest("example.io/a/v1beta1", "a", &["Alpha"]),
            manifest("example.io/c/v1", "c", &["Gamma"]),
            manifest("example.io/b/v1", "b", &["Beta"]),
            manifest("example.io/a/v1", "a", &["One"]),
            manifest("example.io/a-extra/v1", "a", &["Two"]),
        ]);
        let sources: Vec<&SourcePackage> = universe.packages().iter().collect();
        let packages = combine_packages(&sources).unwrap();

        assert_eq!(
            keys(&packages),
            pairs(&[("a", "v1"), ("a", "v1beta1"), ("b", "v1"), ("c", "v1")])
        );

        let merged = &packages[0];
        assert_eq!(
            merged.source_packages,
            vec!["example.io/a-extra/v1", "example.io/a/v1"]
        );
        let names: Vec<&str> = merged
            .types
            .iter()
            .map(|id| universe.get(*id).name.name.as_str())
            .collect();
        assert_eq!(names, vec!["Two", "One"]);
        assert_eq!(merged.identifier(), "a/v1");
    }

    #[test]
    fn test_combine_is_order_independent() {
        let universe = universe_of(vec![
            manifest("example.io/x/v1", "x", &["A"]),
            manifest("example.io/y/v1", "x", &["B"]),
            manifest("example.io/z/v2", "z", &["C"]),
        ]);
        let forward: Vec<&SourcePackage> = universe.packages().iter().collect();
        let mut backward = forward.clone();
        backward.reverse();

        assert_eq!(
            combine_packages(&forward).unwrap(),
            combine_packages(&backward).unwrap()
        );
    }

    #[test]
    fn test_merged_constants_are_kept() {
        let universe = universe_of(vec![
            json!({
                "path": "example.io/one/v1",
                "comments": ["+groupName=g"],
                "types": [{"name": "Phase", "kind": "alias", "underlying": "string"}],
                "constants": [{"name": "PhaseA", "kind": "declarationOf", "underlying": "Phase", "constValue": "A"}]
            }),
            json!({
                "path": "example.io/two/v1",
                "comments": ["+groupName=g"],
                "types": [{"name": "Mode", "kind": "alias", "underlying": "string"}],
                "constants": [{"name": "ModeB", "kind": "declarationOf", "underlying": "Mode", "constValue": "B"}]
            }),
        ]);
        let sources: Vec<&SourcePackage> = universe.packages().iter().collect();
        let packages = combine_packages(&sources).unwrap();

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].types.len(), 2);
        assert_eq!(packages[0].constants.len(), 2);
    }

    #[test]
    fn test_non_version_basename_fails() {
        let universe = universe_of(vec![
            manifest("example.io/a/v1", "a", &["Fine"]),
            manifest("example.io/apis/alpha", "a", &["Broken"]),
        ]);
        let sources: Vec<&SourcePackage> = universe.packages().iter().collect();
        let err = combine_packages(&sources).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidVersionFormat);
        assert!(err.message().contains("\"alpha\""));
    }

    #[test]
    fn test_version_pattern() {
        for good in ["v1", "v2", "v1alpha1", "v2beta3", "v10"] {
            assert!(VERSION_REGEX.is_match(good), "{good}");
        }
        for bad in ["alpha", "v1alpha", "1", "v1gamma1", "V1", "internal"] {
            assert!(!VERSION_REGEX.is_match(bad), "{bad}");
        }
    }

    #[test]
    fn test_group_name_requires_single_value() {
        let mut pkg = SourcePackage {
            comments: vec!["+groupName=widgets.example.io".into()],
            ..Default::default()
        };
        assert_eq!(group_name(&pkg), "widgets.example.io");

        pkg.comments.push("+groupName=other.example.io".into());
        assert_eq!(group_name(&pkg), "");

        pkg.comments.clear();
        assert_eq!(group_name(&pkg), "");
    }

    #[test]
    fn test_select_packages() {
        let universe = universe_of(vec![
            manifest("example.io/b/v1", "b", &["B"]),
            manifest("example.io/a/v1", "a", &["A"]),
            json!({"path": "example.io/empty/v1", "comments": ["+groupName=empty"]}),
            json!({"path": "example.io/nogroup/v1", "types": [{"name": "X", "kind": "struct"}]}),
            json!({
                "path": "example.io/forced/v1",
                "docComments": ["// +gencrdrefdocs:force"]
            }),
            json!({
                "path": "example.io/vendored/v1",
                "sourcePath": "/src/project/vendor/example.io/vendored/v1",
                "comments": ["+groupName=vendored"],
                "types": [{"name": "V", "kind": "struct"}]
            }),
        ]);

        let paths: Vec<&str> = select_packages(&universe)
            .iter()
            .map(|p| p.path.as_str())
            .collect();
        assert_eq!(
            paths,
            vec!["example.io/a/v1", "example.io/b/v1", "example.io/forced/v1"]
        );
    }
}
