//! Generic signature trees.
//!
//! A `TypeExpr` is a type occurrence exactly as it was declared: it may name
//! type variables that only acquire meaning once the declaring type is used
//! with concrete arguments. Lowering from source text happens once, when the
//! owning loader is built.

use crate::loader::RawType;
use std::sync::Arc;

/// Reference from a signature to a declaration.
///
/// References inside one loader are positional so that a declaration can
/// mention itself (`Enum<E extends Enum<E>>`) or a sibling declared later
/// without creating reference cycles. References to parent loaders hold the
/// parent strongly; parents are always built first, so the loader graph stays
/// acyclic.
#[derive(Clone, Debug)]
pub enum DeclRef {
    Local(u32),
    External(RawType),
}

/// Reference to a type variable, by position in its declaring scope.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VarRef {
    /// The n-th type parameter of the type owning the signature.
    Type(u32),
    /// The n-th type parameter of the method owning the signature.
    Method(u32),
}

#[derive(Clone, Debug)]
pub enum TypeExpr {
    /// A declared type, with zero arguments for raw usage.
    Class {
        target: DeclRef,
        arguments: Vec<TypeExpr>,
    },
    Variable(VarRef),
    Array(Box<TypeExpr>),
    /// `?` or `? extends Upper`.
    Wildcard { upper: Option<Box<TypeExpr>> },
}

impl TypeExpr {
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// Returns `true` if any type variable occurs in this signature.
    pub fn mentions_variables(&self) -> bool {
        match self {
            Self::Class { arguments, .. } => arguments.iter().any(Self::mentions_variables),
            Self::Variable(_) => true,
            Self::Array(component) => component.mentions_variables(),
            Self::Wildcard { upper } => upper.as_ref().is_some_and(|u| u.mentions_variables()),
        }
    }
}

/// A declared generic parameter.
#[derive(Clone, Debug)]
pub struct TypeParam {
    pub name: Arc<str>,
    /// Declared upper bounds, in source order. Empty means the top type.
    pub bounds: Vec<TypeExpr>,
}

impl TypeParam {
    /// The bound that determines the parameter's erasure.
    pub fn bound(&self) -> Option<&TypeExpr> {
        self.bounds.first()
    }
}
