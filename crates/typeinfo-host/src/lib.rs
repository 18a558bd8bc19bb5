//! Host type system model.
//!
//! Reflective metadata for declared types, reduced to what the introspection
//! engine needs:
//!
//! - **Loaders**: owners of declarations, the unit of loading and unloading
//! - **Raw types**: identities of declarations, with their generic parameters,
//!   bounds, supertypes and members
//! - **Signatures**: `TypeExpr` trees read from declarations, which may mention
//!   type variables
//! - **Well-known types**: the bootstrap loader every other loader sees
//!
//! Declarations are written as source-level signatures and parsed when a
//! loader is built, so a loader is always fully resolved once it exists.

mod decl;
mod error;
mod expr;
mod loader;
mod parser;
mod well_known;

pub use decl::{DeclKind, DeclSpec, Field, Method, MethodSpec, Shape, TypeDecl};
pub use error::HostError;
pub use expr::{DeclRef, TypeExpr, TypeParam, VarRef};
pub use loader::{LoaderBuilder, LoaderId, RawType, RawTypeKey, TypeLoader, WeakRawType};
pub use well_known::{WellKnownTypes, well_known};
