//! Reverse "used by" edges between declarations.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::decl::{TypeId, Universe};
use crate::group::ApiPackage;

/// Maps a base type to the types that hold a member of that type.
///
/// Member types are dereferenced first, so a `[]*Part` field records an edge
/// from `Part`. Only direct member edges are stored; self and mutual
/// references are ordinary entries.
#[derive(Debug, Default, Clone)]
pub struct ReferenceGraph {
    edges: HashMap<TypeId, IndexSet<TypeId>>,
}

impl ReferenceGraph {
    pub fn build(universe: &Universe, packages: &[ApiPackage]) -> Self {
        let mut edges: HashMap<TypeId, IndexSet<TypeId>> = HashMap::new();
        for pkg in packages {
            for owner in &pkg.types {
                for member in &universe.get(*owner).members {
                    let base = universe.dereference(member.ty);
                    edges.entry(base).or_default().insert(*owner);
                }
            }
        }
        Self { edges }
    }

    /// Owners referencing `id`, in first-seen order.
    pub fn referrers(&self, id: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        self.edges.get(&id).into_iter().flatten().copied()
    }

    pub fn contains(&self, id: TypeId) -> bool {
        self.edges.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
