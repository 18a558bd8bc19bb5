//! Generic Type Introspection and Specialization
//!
//! Builds normalized descriptions of declared types and binds their type
//! variables against concrete use sites. It uses:
//!
//! - **`TypeDescriptor`**: immutable `Arc` trees with structural equality
//! - **Resolver**: walks declared signatures, with pass-scoped cycle detection
//! - **Specializer**: supertype views, variable rebinding and assignability
//! - **`TypeCache`**: process-wide, weakly held as-declared descriptors
//!
//! Resolution degrades instead of failing: an unbindable variable becomes a
//! placeholder carrying its bound.
mod cache;
mod descriptor;
mod error;
mod query_trace;
pub mod recursion;
mod resolver;
mod specializer;
pub use cache::{CacheStats, TypeCache};
pub use descriptor::{
    TypeDescriptor, TypeVariable, TypeVariableId, VariableScope, WeakTypeDescriptor,
};
pub use error::{Result, TypeInfoError};
pub use resolver::{TypeHandle, resolve};
pub use specializer::{AssignabilityPolicy, Specializer, super_type_view};
