pub mod comments;
pub mod config;
pub mod decl;
pub mod docs;
pub mod group;
pub mod index;
pub mod link;
pub mod naming;
pub mod references;
pub mod store;
pub mod tags;
pub mod visibility;


pub use config::{ExternalPackage, GeneratorConfig};
pub use decl::{Member, SourcePackage, TypeDecl, TypeId, TypeKind, TypeName, Universe};
pub use docs::{DocOps, Markup, ReferenceDocs};
pub use group::{ApiPackage, combine_packages, select_packages, sort_packages};
pub use index::TypePackageIndex;
pub use link::LinkResolver;
pub use naming::{Naming, safe_identifier};
pub use references::ReferenceGraph;
pub use store::{RawMember, RawPackage, RawType, UniverseBuilder};
pub use visibility::Visibility;
