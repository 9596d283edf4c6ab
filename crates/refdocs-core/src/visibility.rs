//! Which types and members make it into the document, and in what order.

use std::cmp::Reverse;
use std::sync::LazyLock;

use regex::Regex;

use refdocs_error::{Error, Result};

use crate::config::GeneratorConfig;
use crate::decl::{Member, TypeDecl, TypeId, Universe};
use crate::group::ApiPackage;
use crate::tags::{extract_comment_tags, struct_tag_lookup};

static EXPORTED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+(genclient|kubebuilder:object:root=true)").expect("export pattern is valid")
});

/// Carries a client-generation or object-root marker.
pub fn is_exported_type(decl: &TypeDecl) -> bool {
    decl.second_closest_comment_lines
        .iter()
        .any(|line| EXPORTED_REGEX.is_match(line))
}

fn json_tag(member: &Member) -> String {
    struct_tag_lookup(&member.tags, "json").unwrap_or_default()
}

/// Serialized field name from the `json` tag, or the Go field name.
pub fn field_name(member: &Member) -> String {
    let tag = json_tag(member);
    let tag = tag.strip_suffix(",omitempty").unwrap_or(&tag);
    let tag = tag.strip_suffix(",inline").unwrap_or(tag);
    if tag.is_empty() || tag == "-" {
        member.name.clone()
    } else {
        tag.to_string()
    }
}

pub fn field_embedded(member: &Member) -> bool {
    json_tag(member).contains(",inline")
}

pub fn is_optional_member(member: &Member) -> bool {
    extract_comment_tags("+", &member.comment_lines).contains_key("optional")
}

/// Exported types first, then by qualified name.
pub fn sort_types(universe: &Universe, ids: &mut [TypeId]) {
    ids.sort_by_cached_key(|id| {
        let decl = universe.get(*id);
        (Reverse(is_exported_type(decl)), decl.name.to_string())
    });
}

/// Constants of `pkg` whose underlying type is exactly `id`, sorted.
pub fn constants_of(universe: &Universe, id: TypeId, pkg: Option<&ApiPackage>) -> Vec<TypeId> {
    let Some(pkg) = pkg else {
        return Vec::new();
    };
    let mut out: Vec<TypeId> = pkg
        .constants
        .iter()
        .copied()
        .filter(|c| universe.get(*c).underlying == Some(id))
        .collect();
    sort_types(universe, &mut out);
    out
}

/// Compiled hiding rules.
#[derive(Debug, Clone, Default)]
pub struct Visibility {
    hide_patterns: Vec<Regex>,
    hidden_fields: Vec<String>,
}

impl Visibility {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        let hide_patterns = config
            .hide_type_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    Error::config_invalid(format!("hide pattern {:?} failed to compile", pattern))
                        .with_operation("visibility::new")
                        .with_context("pattern", pattern.clone())
                        .set_source(e)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            hide_patterns,
            hidden_fields: config.hidden_member_fields.clone(),
        })
    }

    /// Hidden by pattern, or an unmarked type whose name starts lower-case.
    pub fn is_hidden(&self, decl: &TypeDecl) -> bool {
        let qualified = decl.name.to_string();
        if self.hide_patterns.iter().any(|re| re.is_match(&qualified)) {
            return true;
        }
        !is_exported_type(decl) && decl.name.name.chars().next().is_some_and(char::is_lowercase)
    }

    pub fn hidden_member(&self, member: &Member) -> bool {
        self.hidden_fields.iter().any(|field| *field == member.name)
    }

    /// `ids` without hidden types, order preserved.
    pub fn visible_types(&self, universe: &Universe, ids: &[TypeId]) -> Vec<TypeId> {
        ids.iter()
            .copied()
            .filter(|id| !self.is_hidden(universe.get(*id)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::Fixture;
    use pretty_assertions::assert_eq;
    use refdocs_error::ErrorKind;

    fn member(name: &str, tags: &str) -> Member {
        Member {
            name: name.to_string(),
            ty: TypeId(0),
            tags: tags.to_string(),
            comment_lines: Vec::new(),
            embedded: false,
        }
    }

    #[test]
    fn test_field_name_from_json_tag() {
        assert_eq!(field_name(&member("Spec", r#"json:"spec,omitempty""#)), "spec");
        assert_eq!(field_name(&member("Meta", r#"json:"meta,inline""#)), "meta");
        assert_eq!(field_name(&member("Spec", r#"json:"-""#)), "Spec");
        assert_eq!(field_name(&member("TypeMeta", r#"json:",inline""#)), "TypeMeta");
        assert_eq!(field_name(&member("Labels", "")), "Labels");
        assert_eq!(field_name(&member("Count", r#"protobuf:"varint,1""#)), "Count");
    }

    #[test]
    fn test_field_embedded() {
        assert!(field_embedded(&member("TypeMeta", r#"json:",inline""#)));
        assert!(!field_embedded(&member("Spec", r#"json:"spec""#)));
        assert!(!field_embedded(&member("Spec", r#"yaml:",inline""#)));
    }

    #[test]
    fn test_optional_member() {
        let mut m = member("Status", "");
        assert!(!is_optional_member(&m));
        m.comment_lines = vec!["Observed state.".into(), "+optional".into()];
        assert!(is_optional_member(&m));
    }

    #[test]
    fn test_exported_and_hidden() {
        let fx = Fixture::widgets();
        let visibility = Visibility::new(&GeneratorConfig::default()).unwrap();

        let widget = fx.universe.get(fx.id("Widget"));
        let helper = fx.universe.get(fx.id("internalHelper"));
        assert!(is_exported_type(widget));
        assert!(!is_exported_type(helper));
        assert!(!visibility.is_hidden(widget));
        assert!(visibility.is_hidden(helper));
    }

    #[test]
    fn test_hide_patterns_match_qualified_name() {
        let fx = Fixture::widgets();
        let config = GeneratorConfig::default().with_hide_type_patterns(["List$", r"^widgets\.example\.io/apis/v1\.Mode$"]);
        let visibility = Visibility::new(&config).unwrap();

        let visible: Vec<&str> = visibility
            .visible_types(&fx.universe, &fx.packages[0].types)
            .into_iter()
            .map(|id| fx.universe.get(id).name.name.as_str())
            .collect();
        assert!(!visible.contains(&"WidgetList"));
        assert!(!visible.contains(&"Mode"));
        assert!(!visible.contains(&"internalHelper"));
        assert!(visible.contains(&"Widget"));
        assert!(visible.contains(&"Phase"));
    }

    #[test]
    fn test_bad_hide_pattern_is_config_error() {
        let config = GeneratorConfig::default().with_hide_type_patterns(["(unclosed"]);
        let err = Visibility::new(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_hidden_member_is_exact_match() {
        let config = GeneratorConfig::default().with_hidden_member_fields(["TypeMeta"]);
        let visibility = Visibility::new(&config).unwrap();
        assert!(visibility.hidden_member(&member("TypeMeta", "")));
        assert!(!visibility.hidden_member(&member("typeMeta", "")));
        assert!(!visibility.hidden_member(&member("TypeMetaExtra", "")));
    }

    #[test]
    fn test_sort_types_exported_first() {
        let fx = Fixture::widgets();
        let mut ids = vec![
            fx.id("Part"),
            fx.id("WidgetList"),
            fx.id("Phase"),
            fx.id("Widget"),
        ];
        sort_types(&fx.universe, &mut ids);
        let names: Vec<&str> = ids
            .iter()
            .map(|id| fx.universe.get(*id).name.name.as_str())
            .collect();
        assert_eq!(names, vec!["Widget", "WidgetList", "Part", "Phase"]);
    }

    #[test]
    fn test_constants_of_matches_identity() {
        let fx = Fixture::widgets();
        let pkg = &fx.packages[0];
        let names = |id| -> Vec<String> {
            constants_of(&fx.universe, id, Some(pkg))
                .iter()
                .map(|c| fx.universe.get(*c).name.name.clone())
                .collect()
        };

        assert_eq!(names(fx.id("Phase")), vec!["PhasePending", "PhaseRunning"]);
        assert_eq!(names(fx.id("Mode")), vec!["ModeFast"]);
        assert!(names(fx.id("Widget")).is_empty());

        let string = fx.universe.lookup("string").unwrap();
        assert!(names(string).is_empty());
        assert!(constants_of(&fx.universe, fx.id("Phase"), None).is_empty());
    }
}
