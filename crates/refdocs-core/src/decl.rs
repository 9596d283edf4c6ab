//! Declaration universe: every type the store handed us, addressed by `TypeId`.

use std::collections::HashMap;
use std::fmt;

use strum_macros::{Display, EnumString, IntoStaticStr};

/// Stable handle to one declaration in a [`Universe`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct TypeId(pub u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of declaration kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, Display, Default,
)]
#[strum(serialize_all = "camelCase")]
pub enum TypeKind {
    Struct,
    Pointer,
    Slice,
    Map,
    Interface,
    Alias,
    Builtin,
    /// A named constant; carries `const_value`.
    DeclarationOf,
    #[default]
    Unsupported,
}

impl TypeKind {
    /// Kinds that link to external documentation when they are not local.
    pub fn is_linkable(self) -> bool {
        matches!(
            self,
            TypeKind::Struct | TypeKind::Pointer | TypeKind::Interface | TypeKind::Alias
        )
    }

    /// Kinds whose `elem` must be present.
    pub fn is_wrapper(self) -> bool {
        matches!(self, TypeKind::Pointer | TypeKind::Slice | TypeKind::Map)
    }
}

/// Qualified name of a declaration: package path plus local name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TypeName {
    pub package: String,
    pub name: String,
}

impl TypeName {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Split a qualified name the way the declaration store prints them.
    ///
    /// Anonymous types (`*T`, `[]T`, `[N]T`, `map[K]V`, `struct{...}`,
    /// `interface{...}`, `func(...)`, channels) keep their whole spelling as
    /// the name and have no package.
    /// Everything else splits at the last `.`.
    pub fn parse(qualified: &str) -> Self {
        const ANONYMOUS: [&str; 9] = [
            "struct{", "interface{", "<-chan", "chan<-", "chan ", "func(", "*", "map[", "[",
        ];
        if ANONYMOUS.iter().any(|prefix| qualified.starts_with(prefix)) {
            return Self::new("", qualified);
        }
        match qualified.rsplit_once('.') {
            Some((package, name)) => Self::new(package, name),
            None => Self::new("", qualified),
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}

/// A field of a struct (or method set entry of an interface).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub ty: TypeId,
    /// Raw struct tag, e.g. `json:"spec,omitempty"`.
    pub tags: String,
    pub comment_lines: Vec<String>,
    pub embedded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub id: TypeId,
    pub name: TypeName,
    pub kind: TypeKind,
    pub members: Vec<Member>,
    pub elem: Option<TypeId>,
    pub key: Option<TypeId>,
    pub underlying: Option<TypeId>,
    pub const_value: Option<String>,
    pub comment_lines: Vec<String>,
    pub second_closest_comment_lines: Vec<String>,
}

/// One source package as delivered by the declaration store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourcePackage {
    pub path: String,
    /// Local package name; by convention also the API version.
    pub name: String,
    pub source_path: String,
    pub comments: Vec<String>,
    pub doc_comments: Vec<String>,
    pub types: Vec<TypeId>,
    pub constants: Vec<TypeId>,
}

/// All declarations of one run.
///
/// Built once by [`crate::store::UniverseBuilder`]; read-only afterwards.
#[derive(Debug, Default)]
pub struct Universe {
    pub(crate) types: Vec<TypeDecl>,
    pub(crate) by_name: HashMap<String, TypeId>,
    pub(crate) packages: Vec<SourcePackage>,
}

impl Universe {
    pub fn get(&self, id: TypeId) -> &TypeDecl {
        &self.types[id.index()]
    }

    pub fn lookup(&self, qualified: &str) -> Option<TypeId> {
        self.by_name.get(qualified).copied()
    }

    pub fn packages(&self) -> &[SourcePackage] {
        &self.packages
    }

    pub fn package(&self, path: &str) -> Option<&SourcePackage> {
        self.packages.iter().find(|p| p.path == path)
    }

    /// Strip pointer, slice and map wrappers down to the base element.
    pub fn dereference(&self, mut id: TypeId) -> TypeId {
        while let Some(elem) = self.get(id).elem {
            id = elem;
        }
        id
    }

    /// Follow `underlying` until a type has none.
    pub fn final_underlying(&self, mut id: TypeId) -> TypeId {
        while let Some(underlying) = self.get(id).underlying {
            id = underlying;
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_qualified_name() {
        let name = TypeName::parse("k8s.io/api/core/v1.Container");
        assert_eq!(name.package, "k8s.io/api/core/v1");
        assert_eq!(name.name, "Container");
        assert_eq!(name.to_string(), "k8s.io/api/core/v1.Container");
    }

    #[test]
    fn test_parse_anonymous_names() {
        for raw in [
            "*k8s.io/api/core/v1.Container",
            "[]example.io/v1.Widget",
            "map[string]example.io/v1.Widget",
            "struct{}",
            "interface{ String() string }",
            "[16]byte",
        ] {
            let name = TypeName::parse(raw);
            assert_eq!(name.package, "", "{raw}");
            assert_eq!(name.name, raw);
            assert_eq!(name.to_string(), raw);
        }
    }

    #[test]
    fn test_parse_builtin() {
        let name = TypeName::parse("string");
        assert_eq!(name, TypeName::new("", "string"));
        assert_eq!(name.to_string(), "string");
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(TypeKind::from_str("struct").unwrap(), TypeKind::Struct);
        assert_eq!(
            TypeKind::from_str("declarationOf").unwrap(),
            TypeKind::DeclarationOf
        );
        assert!(TypeKind::from_str("chan").is_err());
        assert_eq!(TypeKind::DeclarationOf.to_string(), "declarationOf");
    }

    #[test]
    fn test_linkable_kinds() {
        assert!(TypeKind::Struct.is_linkable());
        assert!(TypeKind::Alias.is_linkable());
        assert!(!TypeKind::Builtin.is_linkable());
        assert!(!TypeKind::Map.is_linkable());
    }
}
