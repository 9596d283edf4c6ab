//! The resolved documentation model and the operations a renderer may call.

use std::collections::BTreeSet;
use std::fmt;

use parking_lot::Mutex;
use tracing::warn;

use refdocs_error::{Error, Result};

use crate::comments;
use crate::config::GeneratorConfig;
use crate::decl::{Member, TypeId, Universe};
use crate::group::ApiPackage;
use crate::index::TypePackageIndex;
use crate::link::LinkResolver;
use crate::naming::{self, Naming};
use crate::references::ReferenceGraph;
use crate::visibility::{self, Visibility};

/// Markup a renderer may emit without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Markup(pub String);

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operations exposed to a renderer over the resolved model.
///
/// Anything that walks packages, types and members to produce a document
/// goes through this trait, so renderers can be swapped without touching
/// grouping or resolution.
pub trait DocOps: Send + Sync {
    fn universe(&self) -> &Universe;
    fn packages(&self) -> &[ApiPackage];
    fn config(&self) -> &GeneratorConfig;

    fn is_exported_type(&self, id: TypeId) -> bool;
    fn field_name(&self, member: &Member) -> String;
    fn field_embedded(&self, member: &Member) -> bool;
    fn type_identifier(&self, id: TypeId) -> String;
    fn type_display_name(&self, id: TypeId) -> Result<String>;
    fn visible_types(&self, ids: &[TypeId]) -> Vec<TypeId>;
    fn render_comments(&self, lines: &[String]) -> String;
    fn package_display_name(&self, pkg: &ApiPackage) -> String;
    fn api_group(&self, id: TypeId) -> String;
    fn package_anchor_id(&self, pkg: &ApiPackage) -> String;
    fn link_for_type(&self, id: TypeId) -> Result<String>;
    fn asciidoc_link_for_type(&self, id: TypeId) -> Result<String>;
    fn anchor_id_for_type(&self, id: TypeId) -> String;
    fn safe(&self, markup: &str) -> Markup;
    fn sorted_types(&self, ids: &[TypeId]) -> Vec<TypeId>;
    fn type_references(&self, id: TypeId) -> Vec<TypeId>;
    fn hidden_member(&self, member: &Member) -> bool;
    fn is_local_type(&self, id: TypeId) -> bool;
    fn is_optional_member(&self, member: &Member) -> bool;
    fn safe_identifier(&self, id: &str) -> String;
    fn constants_of_type(&self, id: TypeId) -> Vec<TypeId>;
}

/// Grouped packages plus every index and compiled rule derived from them.
///
/// Immutable once built, apart from the record of unresolved external links.
#[derive(Debug)]
pub struct ReferenceDocs {
    universe: Universe,
    packages: Vec<ApiPackage>,
    config: GeneratorConfig,
    index: TypePackageIndex,
    references: ReferenceGraph,
    links: LinkResolver,
    visibility: Visibility,
    unresolved: Mutex<BTreeSet<String>>,
}

impl ReferenceDocs {
    /// Build indexes and compile configured rules. Malformed rules fail here.
    pub fn new(universe: Universe, packages: Vec<ApiPackage>, config: GeneratorConfig) -> Result<Self> {
        let links = LinkResolver::new(&config.external_packages)
            .map_err(|e| e.with_operation("docs::new"))?;
        let visibility = Visibility::new(&config).map_err(|e| e.with_operation("docs::new"))?;
        let index = TypePackageIndex::build(&packages);
        let references = ReferenceGraph::build(&universe, &packages);

        Ok(Self {
            universe,
            packages,
            config,
            index,
            references,
            links,
            visibility,
            unresolved: Mutex::new(BTreeSet::new()),
        })
    }

    pub fn naming(&self) -> Naming<'_> {
        Naming::new(&self.universe, &self.packages, &self.index)
    }

    pub fn index(&self) -> &TypePackageIndex {
        &self.index
    }

    pub fn references(&self) -> &ReferenceGraph {
        &self.references
    }

    /// Types for which no external rule matched, so far.
    pub fn unresolved_links(&self) -> Vec<String> {
        self.unresolved.lock().iter().cloned().collect()
    }
}

impl DocOps for ReferenceDocs {
    fn universe(&self) -> &Universe {
        &self.universe
    }

    fn packages(&self) -> &[ApiPackage] {
        &self.packages
    }

    fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn is_exported_type(&self, id: TypeId) -> bool {
        visibility::is_exported_type(self.universe.get(id))
    }

    fn field_name(&self, member: &Member) -> String {
        visibility::field_name(member)
    }

    fn field_embedded(&self, member: &Member) -> bool {
        visibility::field_embedded(member)
    }

    fn type_identifier(&self, id: TypeId) -> String {
        self.naming().type_identifier(id)
    }

    fn type_display_name(&self, id: TypeId) -> Result<String> {
        self.naming()
            .display_name(id, &self.config.type_display_name_prefix_overrides)
    }

    fn visible_types(&self, ids: &[TypeId]) -> Vec<TypeId> {
        self.visibility.visible_types(&self.universe, ids)
    }

    fn render_comments(&self, lines: &[String]) -> String {
        comments::render_comments(lines, !self.config.markdown_disabled)
    }

    fn package_display_name(&self, pkg: &ApiPackage) -> String {
        pkg.identifier()
    }

    fn api_group(&self, id: TypeId) -> String {
        self.naming().api_group_for_type(id)
    }

    fn package_anchor_id(&self, pkg: &ApiPackage) -> String {
        naming::package_anchor_id(pkg)
    }

    /// `#anchor` for local types, an external URL for linkable foreign
    /// types, empty otherwise. A foreign type no rule matches is recorded.
    fn link_for_type(&self, id: TypeId) -> Result<String> {
        let base = self.universe.dereference(id);
        if self.index.contains(base) {
            return Ok(format!("#{}", self.naming().anchor_id(base)));
        }

        let decl = self.universe.get(base);
        if !decl.kind.is_linkable() {
            return Ok(String::new());
        }

        match self
            .links
            .external_url(decl)
            .map_err(|e| e.with_operation("docs::link_for_type"))?
        {
            Some(url) => Ok(url),
            None => {
                let diagnostic = Error::link_not_found(decl.name.to_string())
                    .with_operation("docs::link_for_type");
                warn!("{}", diagnostic.message());
                self.unresolved.lock().insert(decl.name.to_string());
                Ok(String::new())
            }
        }
    }

    fn asciidoc_link_for_type(&self, id: TypeId) -> Result<String> {
        let link = self.link_for_type(id)?;
        let display = self.type_display_name(id)?;
        Ok(match link.strip_prefix('#') {
            Some(anchor) => format!("xref:{}[$${}$$]", anchor, display),
            None => format!("link:{}[$${}$$]", link, display),
        })
    }

    fn anchor_id_for_type(&self, id: TypeId) -> String {
        self.naming().anchor_id(id)
    }

    fn safe(&self, markup: &str) -> Markup {
        Markup(markup.to_string())
    }

    fn sorted_types(&self, ids: &[TypeId]) -> Vec<TypeId> {
        let mut out = ids.to_vec();
        visibility::sort_types(&self.universe, &mut out);
        out
    }

    /// Visible owners of a member of type `id`, sorted.
    fn type_references(&self, id: TypeId) -> Vec<TypeId> {
        let mut out: Vec<TypeId> = self
            .references
            .referrers(id)
            .filter(|owner| !self.visibility.is_hidden(self.universe.get(*owner)))
            .collect();
        visibility::sort_types(&self.universe, &mut out);
        out
    }

    fn hidden_member(&self, member: &Member) -> bool {
        self.visibility.hidden_member(member)
    }

    fn is_local_type(&self, id: TypeId) -> bool {
        self.naming().is_local_type(id)
    }

    fn is_optional_member(&self, member: &Member) -> bool {
        visibility::is_optional_member(member)
    }

    fn safe_identifier(&self, id: &str) -> String {
        naming::safe_identifier(id)
    }

    fn constants_of_type(&self, id: TypeId) -> Vec<TypeId> {
        let owner = self.index.owner(id).and_then(|idx| self.packages.get(idx));
        visibility::constants_of(&self.universe, id, owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::Fixture;
    use pretty_assertions::assert_eq;
    use refdocs_error::ErrorKind;

    fn docs_with(config: GeneratorConfig) -> (Fixture, ReferenceDocs) {
        let fx = Fixture::widgets();
        let docs = Fixture::widgets().into_docs(config).unwrap();
        (fx, docs)
    }

    fn k8s_config() -> GeneratorConfig {
        GeneratorConfig::default().with_external_package(
            r"^k8s\.io/apimachinery/pkg/apis/meta/v1\.",
            "https://pkg.example/{{.PackagePath}}#{{.TypeIdentifier}}",
        )
    }

    #[test]
    fn test_local_links_are_anchors() {
        let (fx, docs) = docs_with(k8s_config());
        let link = docs.link_for_type(fx.member_type("Widget", "Parts")).unwrap();
        assert_eq!(link, "#widgets-example-io-v1-part");
        assert!(docs.link_for_type(fx.member_type("Widget", "Status")).unwrap().starts_with('#'));
    }

    #[test]
    fn test_external_links_use_first_matching_rule() {
        let (fx, docs) = docs_with(k8s_config());
        let link = docs.link_for_type(fx.member_type("Widget", "Metadata")).unwrap();
        assert_eq!(
            link,
            "https://pkg.example/k8s.io/apimachinery/pkg/apis/meta/v1#ObjectMeta"
        );
        assert!(docs.unresolved_links().is_empty());
    }

    #[test]
    fn test_unmatched_external_link_is_recorded() {
        let (fx, docs) = docs_with(k8s_config());
        let gadget = fx.member_type("WidgetSpec", "Gadget");
        assert_eq!(docs.link_for_type(gadget).unwrap(), "");
        assert_eq!(docs.link_for_type(gadget).unwrap(), "");
        assert_eq!(docs.unresolved_links(), vec!["example.io/thirdparty/v1.Gadget"]);
    }

    #[test]
    fn test_builtins_and_maps_have_no_link() {
        let (fx, docs) = docs_with(k8s_config());
        assert_eq!(docs.link_for_type(fx.member_type("Widget", "Replicas")).unwrap(), "");
        assert_eq!(docs.link_for_type(fx.member_type("Widget", "Labels")).unwrap(), "");
        assert!(docs.unresolved_links().is_empty());
    }

    #[test]
    fn test_asciidoc_links() {
        let (fx, docs) = docs_with(k8s_config());
        assert_eq!(
            docs.asciidoc_link_for_type(fx.member_type("Widget", "Spec")).unwrap(),
            "xref:widgets-example-io-v1-widgetspec[$$WidgetSpec$$]"
        );
        assert_eq!(
            docs.asciidoc_link_for_type(fx.member_type("Widget", "Metadata")).unwrap(),
            "link:https://pkg.example/k8s.io/apimachinery/pkg/apis/meta/v1#ObjectMeta[$$k8s.io/apimachinery/pkg/apis/meta/v1.ObjectMeta$$]"
        );
    }

    #[test]
    fn test_malformed_rules_fail_construction() {
        let config = GeneratorConfig::default().with_external_package("([", "https://x");
        let err = Fixture::widgets().into_docs(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidExternalPattern);

        let config = GeneratorConfig::default().with_external_package("^k8s", "{{ .Oops");
        let err = Fixture::widgets().into_docs(config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TemplateError);
    }

    #[test]
    fn test_hidden_types_leave_graph_but_not_references() {
        let (fx, docs) = docs_with(GeneratorConfig::default());
        let part = fx.id("Part");
        let helper = fx.id("internalHelper");

        assert!(docs.references().referrers(part).any(|owner| owner == helper));

        let referrers: Vec<&str> = docs
            .type_references(part)
            .into_iter()
            .map(|id| docs.universe().get(id).name.name.as_str())
            .collect();
        assert_eq!(referrers, vec!["Widget", "Part"]);

        let visible = docs.visible_types(&docs.packages()[0].types);
        assert!(!visible.contains(&helper));
    }

    #[test]
    fn test_type_references_are_sorted_and_unique() {
        let (fx, docs) = docs_with(GeneratorConfig::default());
        let phase = fx.id("Phase");
        let names: Vec<String> = docs
            .type_references(phase)
            .into_iter()
            .map(|id| docs.type_identifier(id))
            .collect();
        assert_eq!(
            names,
            vec![
                "widgets.example.io/apis/v1.WidgetSpec",
                "widgets.example.io/apis/v1.WidgetStatus",
            ]
        );
    }

    #[test]
    fn test_constants_of_type_uses_owning_package() {
        let (fx, docs) = docs_with(GeneratorConfig::default());
        let constants: Vec<String> = docs
            .constants_of_type(fx.id("Phase"))
            .into_iter()
            .map(|id| docs.type_display_name(id).unwrap())
            .collect();
        assert_eq!(constants, vec!["\"Pending\"", "\"Running\""]);

        let meta = fx.member_type("Widget", "Metadata");
        assert!(docs.constants_of_type(meta).is_empty());
    }

    #[test]
    fn test_package_names_and_groups() {
        let (fx, docs) = docs_with(GeneratorConfig::default());
        let pkg = &docs.packages()[0];
        assert_eq!(docs.package_display_name(pkg), "widgets.example.io/v1");
        assert_eq!(docs.package_anchor_id(pkg), "widgets.example.io/v1");
        assert_eq!(docs.api_group(fx.id("Widget")), "widgets.example.io/v1");
        assert_eq!(docs.safe("<b>x</b>").to_string(), "<b>x</b>");
    }

    #[test]
    fn test_render_comments_follows_markdown_toggle() {
        let lines = vec!["Some *text*.".to_string(), "+optional".to_string()];

        let (_, docs) = docs_with(GeneratorConfig::default());
        assert_eq!(docs.render_comments(&lines).trim(), "<p>Some <em>text</em>.</p>");

        let (_, docs) = docs_with(GeneratorConfig::default().with_markdown_disabled(true));
        assert_eq!(docs.render_comments(&lines), "Some *text*.");
    }
}
