//! Repository metadata.
//!
//! The view of a repository interface that the bootstrap and query-derivation
//! layers need: which domain type it manages, which identifier type it uses,
//! and what each of its methods returns once the interface's generic
//! parameters are bound.

use tracing::debug;
use typeinfo_common::limits::MAX_SIGNATURE_NESTING;
use typeinfo_host::{RawType, well_known};
use typeinfo_solver::{
    Result, TypeCache, TypeDescriptor, TypeHandle, TypeInfoError, resolve, super_type_view,
};

/// Metadata for one repository interface, e.g. `PersonRepository extends
/// Repository<Person, Long>`.
#[derive(Clone, Debug)]
pub struct RepositoryMetadata {
    interface: RawType,
    descriptor: TypeDescriptor,
    root_view: TypeDescriptor,
}

impl RepositoryMetadata {
    /// Describe `interface` as a subtype of `repository_root`, whose first
    /// two type parameters are the domain and identifier types.
    pub fn new(interface: &RawType, repository_root: &RawType) -> Result<Self> {
        let descriptor = TypeCache::global().get(interface);
        let root_view = super_type_view(&descriptor, repository_root).ok_or_else(|| {
            TypeInfoError::NotARepository {
                interface: interface.name().to_string(),
                root: repository_root.name().to_string(),
            }
        })?;

        debug!(
            interface = %interface,
            root = %root_view,
            "repository metadata"
        );
        Ok(Self {
            interface: interface.clone(),
            descriptor,
            root_view,
        })
    }

    pub fn repository_interface(&self) -> &RawType {
        &self.interface
    }

    /// The interface viewed as the repository root, e.g.
    /// `Repository<Person, Long>`.
    pub fn root(&self) -> &TypeDescriptor {
        &self.root_view
    }

    /// The managed domain type. `Object` when the interface extends the root
    /// without arguments.
    pub fn domain_type(&self) -> TypeDescriptor {
        self.root_argument(0)
    }

    pub fn id_type(&self) -> TypeDescriptor {
        self.root_argument(1)
    }

    fn root_argument(&self, index: usize) -> TypeDescriptor {
        self.root_view
            .argument(index)
            .cloned()
            .unwrap_or_else(TypeDescriptor::object)
    }

    /// Declared return type of `method`, with the repository's bindings
    /// applied. The method may be declared on any super-interface.
    pub fn return_type(&self, method: &str) -> Result<TypeDescriptor> {
        let owner = self.declaring_type(method)?;
        let handle = TypeHandle::method_return(&owner, method)?;
        Ok(resolve(&handle, Some(&self.descriptor)))
    }

    /// The domain type `method` returns, unwrapping `Optional`, collections,
    /// arrays and maps (by value): `Optional<List<Person>>` yields `Person`.
    pub fn returned_domain_type(&self, method: &str) -> Result<TypeDescriptor> {
        let optional = &well_known().optional;
        let mut current = self.return_type(method)?;
        for _ in 0..MAX_SIGNATURE_NESTING {
            let next = if current.raw_type().is_subtype_of(optional) {
                super_type_view(&current, optional)
                    .and_then(|view| view.argument(0).cloned())
                    .unwrap_or_else(TypeDescriptor::object)
            } else if current.is_collection_like() || current.is_map() {
                current.actual_type()
            } else {
                break;
            };
            if next == current {
                break;
            }
            current = next;
        }
        Ok(current)
    }

    /// First type in the interface hierarchy that declares `method`.
    fn declaring_type(&self, method: &str) -> Result<RawType> {
        let mut queue = vec![self.interface.clone()];
        let mut index = 0;
        while let Some(raw) = queue.get(index).cloned() {
            if raw.method(method).is_some() {
                return Ok(raw);
            }
            for sup in raw.direct_supertypes() {
                if !queue.contains(&sup) {
                    queue.push(sup);
                }
            }
            index += 1;
        }
        Err(TypeInfoError::UnknownMember {
            owner: self.interface.name().to_string(),
            member: method.to_string(),
        })
    }
}

#[cfg(test)]
#[path = "tests/metadata_tests.rs"]
mod tests;
