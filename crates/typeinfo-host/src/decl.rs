//! Type declarations and the specs they are built from.

use crate::expr::{TypeExpr, TypeParam};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Kind of declaration.
///
/// | Kind | Example |
/// |------|---------|
/// | Scalar | `String`, `Long` |
/// | Class | `ArrayList<E>`, `Person` |
/// | Interface | `Repository<T, ID>` |
/// | Array | the built-in `Array<E>` behind `Person[]` |
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Scalar,
    Class,
    Interface,
    Array,
}

/// Structural shape of a raw type, for component type extraction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Scalar,
    Aggregate,
    Sequence,
    Map,
    Array,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scalar => "scalar",
            Self::Aggregate => "aggregate",
            Self::Sequence => "sequence",
            Self::Map => "map",
            Self::Array => "array",
        })
    }
}

#[derive(Clone, Debug)]
pub struct Field {
    pub name: Arc<str>,
    pub ty: TypeExpr,
}

#[derive(Clone, Debug)]
pub struct Method {
    pub name: Arc<str>,
    pub type_params: Vec<TypeParam>,
    pub return_type: TypeExpr,
    pub parameters: Vec<TypeExpr>,
}

/// A fully lowered declaration, owned by its loader.
#[derive(Debug)]
pub struct TypeDecl {
    pub(crate) name: Arc<str>,
    pub(crate) kind: DeclKind,
    pub(crate) type_params: Vec<TypeParam>,
    pub(crate) supertypes: Vec<TypeExpr>,
    pub(crate) fields: IndexMap<Arc<str>, Field>,
    pub(crate) methods: IndexMap<Arc<str>, Method>,
}

// =============================================================================
// Declaration specs
// =============================================================================

/// Source-level description of a method, lowered when the loader is built.
#[derive(Clone, Debug)]
pub struct MethodSpec {
    pub(crate) name: String,
    pub(crate) type_params: Option<String>,
    pub(crate) returns: String,
    pub(crate) params: Vec<String>,
}

/// Source-level description of a declaration.
///
/// ```ignore
/// let spec = DeclSpec::interface("PersonRepository")
///     .extends("Repository<Person, Long>")
///     .method("findByLastname", "List<Person>", &["String"]);
/// ```
#[derive(Clone, Debug)]
pub struct DeclSpec {
    pub(crate) kind: DeclKind,
    pub(crate) header: String,
    pub(crate) extends: Vec<String>,
    pub(crate) fields: Vec<(String, String)>,
    pub(crate) methods: Vec<MethodSpec>,
}

impl DeclSpec {
    fn new(kind: DeclKind, header: &str) -> Self {
        Self {
            kind,
            header: header.to_string(),
            extends: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// A class declaration, e.g. `"Person"` or `"Page<T>"`.
    pub fn class(header: &str) -> Self {
        Self::new(DeclKind::Class, header)
    }

    pub fn interface(header: &str) -> Self {
        Self::new(DeclKind::Interface, header)
    }

    pub fn scalar(header: &str) -> Self {
        Self::new(DeclKind::Scalar, header)
    }

    pub(crate) fn array(header: &str) -> Self {
        Self::new(DeclKind::Array, header)
    }

    /// Add a supertype (superclass or implemented interface).
    pub fn extends(mut self, signature: &str) -> Self {
        self.extends.push(signature.to_string());
        self
    }

    pub fn field(mut self, name: &str, signature: &str) -> Self {
        self.fields.push((name.to_string(), signature.to_string()));
        self
    }

    pub fn method(mut self, name: &str, returns: &str, params: &[&str]) -> Self {
        self.methods.push(MethodSpec {
            name: name.to_string(),
            type_params: None,
            returns: returns.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    /// A method declaring its own type parameters, e.g.
    /// `generic_method("save", "S extends T", "S", &["S"])`.
    pub fn generic_method(
        mut self,
        name: &str,
        type_params: &str,
        returns: &str,
        params: &[&str],
    ) -> Self {
        self.methods.push(MethodSpec {
            name: name.to_string(),
            type_params: Some(type_params.to_string()),
            returns: returns.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
        });
        self
    }
}
