//! Errors reported to callers of descriptor accessors and type handles.
//!
//! Degraded resolution (unbound variables, cyclic bounds) is never an error;
//! see the fallback rules in `resolver`.

use thiserror::Error;
use typeinfo_host::Shape;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeInfoError {
    #[error("`{accessor}` is not applicable to `{raw_type}` ({shape} shape)")]
    NotApplicableForShape {
        accessor: &'static str,
        raw_type: String,
        shape: Shape,
    },

    #[error("`{owner}` declares no member `{member}`")]
    UnknownMember { owner: String, member: String },

    #[error("method `{owner}.{method}` has no parameter at index {index}")]
    ParameterOutOfRange {
        owner: String,
        method: String,
        index: usize,
    },

    #[error("`{raw_type}` expects {expected} type argument(s) but {found} were given")]
    ArityMismatch {
        raw_type: String,
        expected: usize,
        found: usize,
    },

    #[error("`{owner}` has no declared supertype at index {index}")]
    SupertypeOutOfRange { owner: String, index: usize },

    #[error("`{interface}` does not extend `{root}`")]
    NotARepository { interface: String, root: String },
}

pub type Result<T> = std::result::Result<T, TypeInfoError>;
