//! Generic type introspection and specialization.
//!
//! Facade over the workspace crates:
//!
//! - [`typeinfo_host`]: loaders, declarations and generic signatures
//! - [`typeinfo_solver`]: descriptors, resolution, specialization, the cache
//!
//! plus the consumer-side [`RepositoryMetadata`] and tracing setup.
//!
//! ```ignore
//! let loader = TypeLoader::builder("app")
//!     .declare(DeclSpec::class("Person"))
//!     .declare(DeclSpec::interface("Repository<T, ID>").method("findAll", "List<T>", &[]))
//!     .declare(DeclSpec::interface("PersonRepository").extends("Repository<Person, Long>"))
//!     .build()?;
//!
//! let metadata = RepositoryMetadata::new(
//!     &loader.get("PersonRepository").unwrap(),
//!     &loader.get("Repository").unwrap(),
//! )?;
//! assert_eq!(metadata.return_type("findAll")?.to_string(), "List<Person>");
//! ```

pub mod metadata;
pub mod tracing_config;

pub use metadata::RepositoryMetadata;
pub use typeinfo_common::limits;
pub use typeinfo_host::{
    DeclKind, DeclSpec, HostError, LoaderBuilder, LoaderId, RawType, RawTypeKey, Shape,
    TypeLoader, WeakRawType, WellKnownTypes, well_known,
};
pub use typeinfo_solver::{
    AssignabilityPolicy, CacheStats, Result, Specializer, TypeCache, TypeDescriptor, TypeHandle,
    TypeInfoError, TypeVariable, TypeVariableId, VariableScope, WeakTypeDescriptor, resolve,
    super_type_view,
};
