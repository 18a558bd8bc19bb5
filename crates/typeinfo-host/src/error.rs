//! Errors raised while building a loader from declaration specs.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("syntax error in `{signature}` at offset {offset}: {message}")]
    Syntax {
        signature: String,
        offset: usize,
        message: String,
    },

    #[error("unknown type `{name}` referenced from `{context}`")]
    UnknownType { name: String, context: String },

    #[error("type `{name}` is declared more than once in loader `{loader}`")]
    DuplicateType { name: String, loader: String },

    #[error("member `{member}` is declared more than once on `{owner}`")]
    DuplicateMember { owner: String, member: String },

    #[error("`{name}` expects {expected} type argument(s) but {found} were given in `{context}`")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        context: String,
    },

    #[error("supertype `{signature}` of `{owner}` is not a declared type")]
    InvalidSupertype { owner: String, signature: String },

    #[error("signature `{signature}` nests deeper than {limit} levels")]
    NestingTooDeep { signature: String, limit: u32 },
}
