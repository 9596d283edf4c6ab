use std::collections::HashMap;

use crate::decl::TypeId;
use crate::group::ApiPackage;

/// Which API package documents a given declaration.
///
/// Keys are exact identities; wrappers are not dereferenced here.
#[derive(Debug, Default, Clone)]
pub struct TypePackageIndex {
    owners: HashMap<TypeId, usize>,
}

impl TypePackageIndex {
    /// Index types and constants of `packages`. Positions refer to that slice.
    pub fn build(packages: &[ApiPackage]) -> Self {
        let mut owners = HashMap::new();
        for (idx, pkg) in packages.iter().enumerate() {
            for id in pkg.types.iter().chain(pkg.constants.iter()) {
                owners.insert(*id, idx);
            }
        }
        Self { owners }
    }

    pub fn owner(&self, id: TypeId) -> Option<usize> {
        self.owners.get(&id).copied()
    }

    pub fn contains(&self, id: TypeId) -> bool {
        self.owners.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
