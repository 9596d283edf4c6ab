//! Template views of packages, types and members.
//!
//! Each object holds the shared model plus a handle (package position,
//! `TypeId`, member position); attributes are computed on access.

use std::fmt;
use std::sync::Arc;

use minijinja::value::{Enumerator, Object, Value};

use refdocs_core::{ApiPackage, DocOps, Member, TypeDecl, TypeId};

pub type SharedDocs = Arc<dyn DocOps>;

// ============================================================================
// Package
// ============================================================================

pub struct PackageObject {
    docs: SharedDocs,
    index: usize,
}

impl PackageObject {
    pub fn value(docs: &SharedDocs, index: usize) -> Value {
        Value::from_object(Self {
            docs: Arc::clone(docs),
            index,
        })
    }

    pub fn package(&self) -> &ApiPackage {
        &self.docs.packages()[self.index]
    }
}

impl fmt::Debug for PackageObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiPackage({})", self.package().identifier())
    }
}

impl Object for PackageObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let pkg = self.package();
        let value = match key.as_str()? {
            "group" => Value::from(pkg.group.as_str()),
            "version" => Value::from(pkg.version.as_str()),
            "identifier" => Value::from(pkg.identifier()),
            "types" => type_list(&self.docs, &pkg.types),
            "constants" => type_list(&self.docs, &pkg.constants),
            "sourcePackages" => Value::from_serialize(&pkg.source_packages),
            "docComments" => {
                let universe = self.docs.universe();
                let lines: Vec<&String> = pkg
                    .source_packages
                    .iter()
                    .filter_map(|path| universe.package(path))
                    .flat_map(|source| source.doc_comments.iter())
                    .collect();
                Value::from_serialize(lines)
            }
            _ => return None,
        };
        Some(value)
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&[
            "group",
            "version",
            "identifier",
            "types",
            "constants",
            "sourcePackages",
            "docComments",
        ])
    }
}

// ============================================================================
// Type
// ============================================================================

pub struct TypeObject {
    docs: SharedDocs,
    id: TypeId,
}

impl TypeObject {
    pub fn value(docs: &SharedDocs, id: TypeId) -> Value {
        Value::from_object(Self {
            docs: Arc::clone(docs),
            id,
        })
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    fn decl(&self) -> &TypeDecl {
        self.docs.universe().get(self.id)
    }
}

impl fmt::Debug for TypeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.decl().name)
    }
}

impl Object for TypeObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let decl = self.decl();
        let value = match key.as_str()? {
            "name" => Value::from(decl.name.name.as_str()),
            "package" => Value::from(decl.name.package.as_str()),
            "qualifiedName" => Value::from(decl.name.to_string()),
            "kind" => Value::from(<&'static str>::from(decl.kind)),
            "members" => Value::from(
                (0..decl.members.len())
                    .map(|index| MemberObject::value(&self.docs, self.id, index))
                    .collect::<Vec<_>>(),
            ),
            "commentLines" => Value::from_serialize(&decl.comment_lines),
            "secondClosestCommentLines" => Value::from_serialize(&decl.second_closest_comment_lines),
            "elem" => opt_type(&self.docs, decl.elem),
            "key" => opt_type(&self.docs, decl.key),
            "underlying" => opt_type(&self.docs, decl.underlying),
            "constValue" => decl.const_value.as_deref().map(Value::from).unwrap_or_default(),
            _ => return None,
        };
        Some(value)
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&[
            "name",
            "package",
            "qualifiedName",
            "kind",
            "members",
            "commentLines",
            "secondClosestCommentLines",
            "elem",
            "key",
            "underlying",
            "constValue",
        ])
    }
}

// ============================================================================
// Member
// ============================================================================

pub struct MemberObject {
    docs: SharedDocs,
    owner: TypeId,
    index: usize,
}

impl MemberObject {
    pub fn value(docs: &SharedDocs, owner: TypeId, index: usize) -> Value {
        Value::from_object(Self {
            docs: Arc::clone(docs),
            owner,
            index,
        })
    }

    pub fn member(&self) -> &Member {
        &self.docs.universe().get(self.owner).members[self.index]
    }
}

impl fmt::Debug for MemberObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Member({})", self.member().name)
    }
}

impl Object for MemberObject {
    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        let member = self.member();
        let value = match key.as_str()? {
            "name" => Value::from(member.name.as_str()),
            "type" => TypeObject::value(&self.docs, member.ty),
            "tags" => Value::from(member.tags.as_str()),
            "commentLines" => Value::from_serialize(&member.comment_lines),
            "embedded" => Value::from(member.embedded),
            _ => return None,
        };
        Some(value)
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Str(&["name", "type", "tags", "commentLines", "embedded"])
    }
}

pub fn type_list(docs: &SharedDocs, ids: &[TypeId]) -> Value {
    Value::from(
        ids.iter()
            .map(|id| TypeObject::value(docs, *id))
            .collect::<Vec<_>>(),
    )
}

fn opt_type(docs: &SharedDocs, id: Option<TypeId>) -> Value {
    id.map(|id| TypeObject::value(docs, id)).unwrap_or_default()
}
