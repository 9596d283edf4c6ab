//! Ingestion of declaration-store manifests into a [`Universe`].
//!
//! The store hands over one manifest per source package. References between
//! declarations are qualified names; the builder mints a [`TypeId`] for each
//! declaration and resolves every reference against that index. Anonymous
//! wrappers (`*T`, `[]T`, `map[K]V`) and builtins are synthesized on first
//! reference so that manifests only have to spell out named types.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use refdocs_error::{Error, ErrorKind, Result};

use crate::decl::{Member, SourcePackage, TypeDecl, TypeId, TypeKind, TypeName, Universe};

const BUILTINS: [&str; 21] = [
    "bool", "byte", "complex64", "complex128", "error", "float32", "float64", "int", "int8",
    "int16", "int32", "int64", "rune", "string", "uint", "uint8", "uint16", "uint32", "uint64",
    "uintptr", "any",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawPackage {
    pub path: String,
    /// Defaults to the trailing segment of `path`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub source_path: String,
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub doc_comments: Vec<String>,
    #[serde(default)]
    pub types: Vec<RawType>,
    #[serde(default)]
    pub constants: Vec<RawType>,
}

impl RawPackage {
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|e| {
            Error::new(ErrorKind::DeserializationFailed, "malformed package manifest")
                .with_operation("store::from_json")
                .set_source(e)
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawType {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub comment_lines: Vec<String>,
    #[serde(default)]
    pub second_closest_comment_lines: Vec<String>,
    #[serde(default)]
    pub members: Vec<RawMember>,
    #[serde(default)]
    pub underlying: Option<String>,
    #[serde(default)]
    pub elem: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub const_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawMember {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub comment_lines: Vec<String>,
    #[serde(default)]
    pub embedded: bool,
}

/// Qualified name a declaration gets inside its package.
fn qualified_name(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}.{name}")
    }
}

/// Split `K]V` (the text after `map[`) into key and value spellings.
fn split_map_key(rest: &str) -> Option<(&str, &str)> {
    let mut depth = 1usize;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&rest[..idx], &rest[idx + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Split `[N]T` into the length and the element spelling.
fn split_array_len(name: &str) -> Option<(&str, &str)> {
    let (len, elem) = name.strip_prefix('[')?.split_once(']')?;
    (!len.is_empty() && len.bytes().all(|b| b.is_ascii_digit())).then_some((len, elem))
}

/// References of one declaration, resolved once every package is declared.
#[derive(Debug)]
struct PendingRefs {
    id: TypeId,
    package: String,
    members: Vec<RawMember>,
    elem: Option<String>,
    key: Option<String>,
    underlying: Option<String>,
}

#[derive(Debug, Default)]
pub struct UniverseBuilder {
    universe: Universe,
    pending: Vec<PendingRefs>,
}

impl UniverseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare every type and constant of `raw`. References are resolved in
    /// [`UniverseBuilder::finish`], so packages may be added in any order.
    pub fn add_package(&mut self, raw: RawPackage) -> Result<&mut Self> {
        let name = if raw.name.is_empty() {
            raw.path.rsplit('/').next().unwrap_or_default().to_string()
        } else {
            raw.name
        };

        let mut package = SourcePackage {
            path: raw.path,
            name,
            source_path: raw.source_path,
            comments: raw.comments,
            doc_comments: raw.doc_comments,
            types: Vec::with_capacity(raw.types.len()),
            constants: Vec::with_capacity(raw.constants.len()),
        };

        for ty in raw.types {
            let id = self.declare(&package.path, ty)?;
            package.types.push(id);
        }
        for constant in raw.constants {
            let id = self.declare(&package.path, constant)?;
            package.constants.push(id);
        }

        debug!(
            package = %package.path,
            types = package.types.len(),
            constants = package.constants.len(),
            "declared package"
        );
        self.universe.packages.push(package);
        Ok(self)
    }

    fn declare(&mut self, package: &str, raw: RawType) -> Result<TypeId> {
        let qualified = qualified_name(package, &raw.name);
        if self.universe.by_name.contains_key(&qualified) {
            return Err(Error::duplicate_type(qualified).with_operation("store::declare"));
        }

        let kind = TypeKind::from_str(&raw.kind).map_err(|_| {
            Error::unresolved_kind(
                qualified.clone(),
                format!("type {} has kind={:?} which is unhandled", qualified, raw.kind),
            )
            .with_operation("store::declare")
        })?;

        if kind == TypeKind::DeclarationOf && raw.const_value.is_none() {
            return Err(Error::unresolved_kind(
                qualified.clone(),
                format!("type {} is a non-const declaration, which is unhandled", qualified),
            )
            .with_operation("store::declare"));
        }
        if kind.is_wrapper() && raw.elem.is_none() {
            return Err(Error::new(
                ErrorKind::InvalidFormat,
                format!("{} type {} has no elem", kind, qualified),
            )
            .with_operation("store::declare")
            .with_context("type", qualified));
        }

        let name = if package.is_empty() {
            TypeName::parse(&qualified)
        } else {
            TypeName::new(package, raw.name)
        };
        let id = self.push(TypeDecl {
            id: TypeId::default(),
            name,
            kind,
            members: Vec::new(),
            elem: None,
            key: None,
            underlying: None,
            const_value: raw.const_value,
            comment_lines: raw.comment_lines,
            second_closest_comment_lines: raw.second_closest_comment_lines,
        });
        self.pending.push(PendingRefs {
            id,
            package: package.to_string(),
            members: raw.members,
            elem: raw.elem,
            key: raw.key,
            underlying: raw.underlying,
        });
        Ok(id)
    }

    fn push(&mut self, mut decl: TypeDecl) -> TypeId {
        let id = TypeId(self.universe.types.len() as u32);
        decl.id = id;
        self.universe.by_name.insert(decl.name.to_string(), id);
        self.universe.types.push(decl);
        id
    }

    /// Resolve a reference written inside `package`.
    ///
    /// Exact qualified names win, then names local to `package`. Wrappers
    /// and builtins are synthesized under their canonical spelling, so
    /// `[]Node` and `[]example.io/v1.Node` end up as one declaration.
    fn resolve(&mut self, package: &str, name: &str) -> Result<TypeId> {
        if let Some(id) = self.universe.lookup(name) {
            return Ok(id);
        }

        let (kind, elem, key) = if let Some(rest) = name.strip_prefix('*') {
            (TypeKind::Pointer, Some(self.resolve(package, rest)?), None)
        } else if let Some(rest) = name.strip_prefix("[]") {
            (TypeKind::Slice, Some(self.resolve(package, rest)?), None)
        } else if let Some((_, rest)) = split_array_len(name) {
            (TypeKind::Slice, Some(self.resolve(package, rest)?), None)
        } else if let Some(rest) = name.strip_prefix("map[") {
            let (key, value) = split_map_key(rest).ok_or_else(|| {
                Error::unknown_type_reference(name).with_operation("store::resolve")
            })?;
            let key = self.resolve(package, key)?;
            (TypeKind::Map, Some(self.resolve(package, value)?), Some(key))
        } else if BUILTINS.contains(&name) {
            (TypeKind::Builtin, None, None)
        } else if name.starts_with("struct{") {
            (TypeKind::Struct, None, None)
        } else if name.starts_with("interface{") {
            (TypeKind::Interface, None, None)
        } else {
            return self
                .universe
                .lookup(&qualified_name(package, name))
                .ok_or_else(|| {
                    Error::unknown_type_reference(name)
                        .with_operation("store::resolve")
                        .with_context("package", package.to_string())
                });
        };

        let spelled = |id: Option<TypeId>, universe: &Universe| {
            id.map(|id| universe.get(id).name.to_string())
                .unwrap_or_default()
        };
        let canonical = match kind {
            TypeKind::Pointer => format!("*{}", spelled(elem, &self.universe)),
            TypeKind::Slice => {
                let len = split_array_len(name).map_or("", |(len, _)| len);
                format!("[{}]{}", len, spelled(elem, &self.universe))
            }
            TypeKind::Map => format!(
                "map[{}]{}",
                spelled(key, &self.universe),
                spelled(elem, &self.universe)
            ),
            _ => name.to_string(),
        };
        if let Some(id) = self.universe.lookup(&canonical) {
            return Ok(id);
        }

        Ok(self.push(TypeDecl {
            id: TypeId::default(),
            name: TypeName::parse(&canonical),
            kind,
            members: Vec::new(),
            elem,
            key,
            underlying: None,
            const_value: None,
            comment_lines: Vec::new(),
            second_closest_comment_lines: Vec::new(),
        }))
    }

    fn resolve_opt(&mut self, package: &str, name: Option<&str>) -> Result<Option<TypeId>> {
        name.map(|name| self.resolve(package, name)).transpose()
    }

    /// Resolve every pending reference and validate the wrapper chains.
    pub fn finish(mut self) -> Result<Universe> {
        let pending = std::mem::take(&mut self.pending);
        for refs in pending {
            let mut members = Vec::with_capacity(refs.members.len());
            for member in refs.members {
                members.push(Member {
                    ty: self.resolve(&refs.package, &member.ty)?,
                    name: member.name,
                    tags: member.tags,
                    comment_lines: member.comment_lines,
                    embedded: member.embedded,
                });
            }
            let elem = self.resolve_opt(&refs.package, refs.elem.as_deref())?;
            let key = self.resolve_opt(&refs.package, refs.key.as_deref())?;
            let underlying = self.resolve_opt(&refs.package, refs.underlying.as_deref())?;

            let decl = &mut self.universe.types[refs.id.index()];
            decl.members = members;
            decl.elem = elem;
            decl.key = key;
            decl.underlying = underlying;
        }

        let limit = self.universe.types.len();
        for decl in &self.universe.types {
            self.check_chain(decl, "elem", limit, |d| d.elem)?;
            self.check_chain(decl, "underlying", limit, |d| d.underlying)?;
        }
        Ok(self.universe)
    }

    fn check_chain(
        &self,
        decl: &TypeDecl,
        label: &str,
        limit: usize,
        next: impl Fn(&TypeDecl) -> Option<TypeId>,
    ) -> Result<()> {
        let mut steps = 0usize;
        let mut current = next(decl);
        while let Some(id) = current {
            steps += 1;
            if steps > limit {
                return Err(Error::new(
                    ErrorKind::CyclicType,
                    format!("{} chain of {} never terminates", label, decl.name),
                )
                .with_operation("store::check_chain")
                .with_context("type", decl.name.to_string()));
            }
            current = next(self.universe.get(id));
        }
        Ok(())
    }
}

impl Universe {
    /// Build a universe from a set of manifests.
    pub fn from_packages(packages: impl IntoIterator<Item = RawPackage>) -> Result<Self> {
        let mut builder = UniverseBuilder::new();
        for package in packages {
            builder.add_package(package)?;
        }
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawPackage {
        serde_json::from_value(value).expect("valid manifest")
    }

    #[test]
    fn test_declares_and_resolves_members() {
        let universe = Universe::from_packages([raw(json!({
            "path": "example.io/apis/widgets/v1",
            "types": [
                {"name": "Widget", "kind": "struct", "members": [
                    {"name": "Spec", "type": "WidgetSpec", "tags": "json:\"spec\""},
                    {"name": "Parts", "type": "[]*example.io/apis/widgets/v1.Part"}
                ]},
                {"name": "WidgetSpec", "kind": "struct"},
                {"name": "Part", "kind": "struct"}
            ]
        }))])
        .unwrap();

        let package = &universe.packages()[0];
        assert_eq!(package.name, "v1");
        assert_eq!(package.types.len(), 3);

        let widget = universe.get(universe.lookup("example.io/apis/widgets/v1.Widget").unwrap());
        let spec = universe.get(widget.members[0].ty);
        assert_eq!(spec.name.to_string(), "example.io/apis/widgets/v1.WidgetSpec");

        let parts = universe.get(widget.members[1].ty);
        assert_eq!(parts.kind, TypeKind::Slice);
        assert_eq!(parts.name.name, "[]*example.io/apis/widgets/v1.Part");
        let pointer = universe.get(parts.elem.unwrap());
        assert_eq!(pointer.kind, TypeKind::Pointer);
        assert_eq!(
            universe.get(universe.dereference(parts.id)).name.name,
            "Part"
        );
    }

    #[test]
    fn test_synthesizes_maps_and_builtins() {
        let universe = Universe::from_packages([raw(json!({
            "path": "example.io/v1",
            "types": [{"name": "Labels", "kind": "struct", "members": [
                {"name": "Values", "type": "map[string][]int32"}
            ]}]
        }))])
        .unwrap();

        let labels = universe.get(universe.lookup("example.io/v1.Labels").unwrap());
        let map = universe.get(labels.members[0].ty);
        assert_eq!(map.kind, TypeKind::Map);
        assert_eq!(universe.get(map.key.unwrap()).kind, TypeKind::Builtin);
        assert_eq!(universe.get(map.elem.unwrap()).name.name, "[]int32");
        assert_eq!(universe.get(universe.dereference(map.id)).name.name, "int32");
    }

    #[test]
    fn test_unknown_reference_is_rejected() {
        let err = Universe::from_packages([raw(json!({
            "path": "example.io/v1",
            "types": [{"name": "Widget", "kind": "struct", "members": [
                {"name": "Spec", "type": "example.io/v1.Missing"}
            ]}]
        }))])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTypeReference);
    }

    #[test]
    fn test_duplicate_declaration_is_rejected() {
        let package = json!({
            "path": "example.io/v1",
            "types": [{"name": "Widget", "kind": "struct"}]
        });
        let err = Universe::from_packages([raw(package.clone()), raw(package)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateType);
    }

    #[test]
    fn test_unknown_kind_is_unresolved() {
        let err = Universe::from_packages([raw(json!({
            "path": "example.io/v1",
            "types": [{"name": "Events", "kind": "chan"}]
        }))])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedKind);
    }

    #[test]
    fn test_constant_without_value_is_unresolved() {
        let err = Universe::from_packages([raw(json!({
            "path": "example.io/v1",
            "types": [{"name": "Phase", "kind": "alias", "underlying": "string"}],
            "constants": [{"name": "PhaseRunning", "kind": "declarationOf", "underlying": "Phase"}]
        }))])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvedKind);
    }

    #[test]
    fn test_underlying_cycle_is_rejected() {
        let err = Universe::from_packages([raw(json!({
            "path": "example.io/v1",
            "types": [
                {"name": "A", "kind": "alias", "underlying": "B"},
                {"name": "B", "kind": "alias", "underlying": "A"}
            ]
        }))])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CyclicType);
    }

    #[test]
    fn test_self_reference_through_members_is_allowed() {
        let universe = Universe::from_packages([raw(json!({
            "path": "example.io/v1",
            "types": [{"name": "Node", "kind": "struct", "members": [
                {"name": "Children", "type": "[]Node"}
            ]}]
        }))]);
        assert!(universe.is_ok());
    }

    #[test]
    fn test_manifest_rejects_unknown_fields() {
        let err = RawPackage::from_json(r#"{"path": "example.io/v1", "typez": []}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeserializationFailed);
    }

    #[test]
    fn test_synthesizes_arrays_and_anonymous_literals() {
        let universe = Universe::from_packages([raw(json!({
            "path": "example.io/v1",
            "types": [
                {"name": "Digest", "kind": "struct", "members": [
                    {"name": "Sum", "type": "[16]byte"},
                    {"name": "Grid", "type": "[2][3]example.io/v1.Cell"},
                    {"name": "Extra", "type": "interface{}"},
                    {"name": "Marker", "type": "struct{}"},
                    {"name": "Again", "type": "map[string]interface{}"}
                ]},
                {"name": "Cell", "kind": "struct"}
            ]
        }))])
        .unwrap();

        let digest = universe.get(universe.lookup("example.io/v1.Digest").unwrap());
        let member = |idx: usize| universe.get(digest.members[idx].ty);

        let sum = member(0);
        assert_eq!(sum.kind, TypeKind::Slice);
        assert_eq!(sum.name.name, "[16]byte");
        assert_eq!(universe.get(sum.elem.unwrap()).kind, TypeKind::Builtin);

        let grid = member(1);
        assert_eq!(grid.name.name, "[2][3]example.io/v1.Cell");
        assert_eq!(universe.get(grid.elem.unwrap()).name.name, "[3]example.io/v1.Cell");
        assert_eq!(universe.get(universe.dereference(grid.id)).name.name, "Cell");

        let extra = member(2);
        assert_eq!(extra.kind, TypeKind::Interface);
        assert_eq!(extra.name, TypeName::new("", "interface{}"));
        assert!(extra.members.is_empty());
        assert_eq!(member(3).kind, TypeKind::Struct);
        assert_eq!(member(3).name.name, "struct{}");

        let again = member(4);
        assert_eq!(again.elem, Some(extra.id));
    }

    #[test]
    fn test_split_array_len() {
        assert_eq!(split_array_len("[16]byte"), Some(("16", "byte")));
        assert_eq!(split_array_len("[]byte"), None);
        assert_eq!(split_array_len("[N]byte"), None);
        assert_eq!(split_array_len("map[string]int"), None);
    }

    #[test]
    fn test_split_map_key() {
        assert_eq!(split_map_key("string]int"), Some(("string", "int")));
        assert_eq!(
            split_map_key("[2]string]bool"),
            Some(("[2]string", "bool"))
        );
        assert_eq!(split_map_key("string"), None);
    }
}
