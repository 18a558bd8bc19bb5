//! Resolution of type handles into descriptors.
//!
//! A [`TypeHandle`] points at one type occurrence in a declaration: the
//! declaration itself, a field, a method's return type or parameter, or a
//! declared supertype. [`resolve`] walks the occurrence's signature and
//! produces a [`TypeDescriptor`], binding the declaring type's variables from
//! an optional enclosing context.
//!
//! ## Fallback
//!
//! Resolution never fails. A variable with no binding becomes a placeholder
//! carrying its declared bound (`Object` when unbounded). Method-level
//! variables never have a use-site binding. A bound that mentions its own
//! variable (`E extends Comparable<E>`) is expanded once; the inner
//! occurrence is cut at the erasure of the bound.

use crate::descriptor::{Arguments, TypeDescriptor, TypeVariable, TypeVariableId, VariableScope};
use crate::error::{Result, TypeInfoError};
use crate::query_trace;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::specializer::super_type_view;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};
use typeinfo_host::{Method, RawType, TypeExpr, VarRef, well_known};

#[derive(Clone, Debug)]
enum Site {
    Class,
    Field(Arc<str>),
    MethodReturn { name: Arc<str>, method: u32 },
    MethodParameter {
        name: Arc<str>,
        method: u32,
        index: usize,
    },
    Supertype(usize),
}

/// Reference to one type occurrence inside a declaration.
#[derive(Clone, Debug)]
pub struct TypeHandle {
    owner: RawType,
    site: Site,
}

impl TypeHandle {
    /// The declaration itself, with its own type variables as arguments.
    pub fn class(raw: &RawType) -> Self {
        Self {
            owner: raw.clone(),
            site: Site::Class,
        }
    }

    pub fn field(owner: &RawType, name: &str) -> Result<Self> {
        let field = owner
            .field(name)
            .ok_or_else(|| unknown_member(owner, name))?;
        Ok(Self {
            owner: owner.clone(),
            site: Site::Field(Arc::clone(&field.name)),
        })
    }

    pub fn method_return(owner: &RawType, name: &str) -> Result<Self> {
        let method = owner
            .method_index(name)
            .ok_or_else(|| unknown_member(owner, name))?;
        Ok(Self {
            owner: owner.clone(),
            site: Site::MethodReturn {
                name: Arc::from(name),
                method,
            },
        })
    }

    pub fn method_parameter(owner: &RawType, name: &str, index: usize) -> Result<Self> {
        let method = owner
            .method_index(name)
            .ok_or_else(|| unknown_member(owner, name))?;
        let arity = owner.method(name).map_or(0, |m| m.parameters.len());
        if index >= arity {
            return Err(TypeInfoError::ParameterOutOfRange {
                owner: owner.name().to_string(),
                method: name.to_string(),
                index,
            });
        }
        Ok(Self {
            owner: owner.clone(),
            site: Site::MethodParameter {
                name: Arc::from(name),
                method,
                index,
            },
        })
    }

    /// The `index`-th declared supertype of `owner`.
    pub fn supertype(owner: &RawType, index: usize) -> Result<Self> {
        if index >= owner.supertypes().len() {
            return Err(TypeInfoError::SupertypeOutOfRange {
                owner: owner.name().to_string(),
                index,
            });
        }
        Ok(Self {
            owner: owner.clone(),
            site: Site::Supertype(index),
        })
    }

    /// The declaration whose type variables the occurrence may mention.
    pub fn owner(&self) -> &RawType {
        &self.owner
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owner = self.owner.name();
        match &self.site {
            Site::Class => f.write_str(owner),
            Site::Field(name) => write!(f, "{owner}.{name}"),
            Site::MethodReturn { name, .. } => write!(f, "{owner}.{name}()"),
            Site::MethodParameter { name, index, .. } => write!(f, "{owner}.{name}(#{index})"),
            Site::Supertype(index) => write!(f, "{owner}^{index}"),
        }
    }
}

fn unknown_member(owner: &RawType, member: &str) -> TypeInfoError {
    TypeInfoError::UnknownMember {
        owner: owner.name().to_string(),
        member: member.to_string(),
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolve `handle`, binding its owner's type variables from `context`.
///
/// `context` may be the owner itself or any subtype of it: a method declared
/// on `Repository<T, ID>` resolved in the context of
/// `PersonRepository extends Repository<Person, Long>` sees `T = Person`.
pub fn resolve(handle: &TypeHandle, context: Option<&TypeDescriptor>) -> TypeDescriptor {
    let query_id = query_trace::enabled().then(query_trace::next_query_id);
    if let Some(query_id) = query_id {
        query_trace::unary_start(query_id, "resolve", &handle.to_string(), context.is_some());
    }

    let owner = &handle.owner;
    let view = context.and_then(|ctx| {
        let view = super_type_view(ctx, owner);
        if view.is_none() {
            debug!(
                handle = %handle,
                context = %ctx,
                "context does not extend the handle's owner; variables fall back to bounds"
            );
        }
        view
    });
    let bindings = view
        .as_ref()
        .map(TypeDescriptor::arguments)
        .filter(|args| !args.is_empty());

    let mut pass = ResolutionPass::new(owner, bindings);
    let result = match &handle.site {
        Site::Class => pass.declared(),
        Site::Field(name) => match owner.field(name) {
            Some(field) => pass.resolve(&field.ty),
            None => TypeDescriptor::object(),
        },
        Site::MethodReturn { name, method } => match owner.method(name) {
            Some(decl) => pass.in_method(*method, decl).resolve(&decl.return_type),
            None => TypeDescriptor::object(),
        },
        Site::MethodParameter {
            name,
            method,
            index,
        } => match owner.method(name).and_then(|m| Some((m, m.parameters.get(*index)?))) {
            Some((decl, param)) => pass.in_method(*method, decl).resolve(param),
            None => TypeDescriptor::object(),
        },
        Site::Supertype(index) => match owner.supertypes().get(*index) {
            Some(expr) => pass.resolve(expr),
            None => TypeDescriptor::object(),
        },
    };

    trace!(handle = %handle, result = %result, "resolved");
    if let Some(query_id) = query_id {
        query_trace::unary_end(query_id, "resolve", &result.to_string());
    }
    result
}

/// One resolution pass over signatures declared by `owner`.
///
/// The pass owns the in-progress set for type variables, so every
/// descriptor it produces shares one cycle check.
pub(crate) struct ResolutionPass<'a> {
    owner: &'a RawType,
    bindings: Option<&'a [TypeDescriptor]>,
    method: Option<(u32, &'a Method)>,
    guard: RecursionGuard<TypeVariableId>,
}

impl<'a> ResolutionPass<'a> {
    pub(crate) fn new(owner: &'a RawType, bindings: Option<&'a [TypeDescriptor]>) -> Self {
        Self {
            owner,
            bindings,
            method: None,
            guard: RecursionGuard::with_profile(RecursionProfile::TypeResolution),
        }
    }

    fn in_method(&mut self, index: u32, method: &'a Method) -> &mut Self {
        self.method = Some((index, method));
        self
    }

    /// The owner parameterized by its own variables.
    fn declared(&mut self) -> TypeDescriptor {
        let owner = self.owner;
        let arguments: Arguments = (0..owner.type_parameters().len() as u32)
            .map(|index| self.variable(VarRef::Type(index)))
            .collect();
        TypeDescriptor::new(owner.clone(), arguments)
    }

    pub(crate) fn resolve(&mut self, expr: &TypeExpr) -> TypeDescriptor {
        match expr {
            TypeExpr::Class { target, arguments } => {
                let raw = self.owner.resolve(target);
                let arguments: Arguments = arguments.iter().map(|arg| self.resolve(arg)).collect();
                TypeDescriptor::new(raw, arguments)
            }
            TypeExpr::Array(component) => TypeDescriptor::array_of(self.resolve(component)),
            TypeExpr::Wildcard { upper } => match upper {
                Some(upper) => self.resolve(upper),
                None => TypeDescriptor::object(),
            },
            TypeExpr::Variable(var) => self.variable(*var),
        }
    }

    fn variable(&mut self, var: VarRef) -> TypeDescriptor {
        let owner = self.owner;
        match var {
            VarRef::Type(index) => {
                if let Some(bound) = self.bindings.and_then(|args| args.get(index as usize)) {
                    return bound.clone();
                }
                let Some(param) = owner.type_parameters().get(index as usize) else {
                    return TypeDescriptor::object();
                };
                let variable =
                    TypeVariable::new(owner, VariableScope::Type, index, Arc::clone(&param.name));
                self.placeholder(variable, param.bound())
            }
            VarRef::Method(index) => {
                let Some((method, decl)) = self.method else {
                    return TypeDescriptor::object();
                };
                let Some(param) = decl.type_params.get(index as usize) else {
                    return TypeDescriptor::object();
                };
                let variable = TypeVariable::new(
                    owner,
                    VariableScope::Method(method),
                    index,
                    Arc::clone(&param.name),
                );
                self.placeholder(variable, param.bound())
            }
        }
    }

    fn placeholder(&mut self, variable: TypeVariable, bound: Option<&TypeExpr>) -> TypeDescriptor {
        let id = variable.id();
        match self.guard.enter(id) {
            RecursionResult::Entered => {
                let resolved = match bound {
                    Some(expr) => self.resolve(expr),
                    None => TypeDescriptor::object(),
                };
                self.guard.leave(id);
                TypeDescriptor::placeholder(&resolved, variable)
            }
            denied => {
                debug!(
                    variable = variable.name(),
                    owner = %variable.owner(),
                    reason = ?denied,
                    "recursive bound cut at its erasure"
                );
                let erased = match bound {
                    Some(expr) => self.erasure(expr),
                    None => TypeDescriptor::object(),
                };
                TypeDescriptor::placeholder(&erased, variable)
            }
        }
    }

    fn erasure(&self, expr: &TypeExpr) -> TypeDescriptor {
        match expr {
            TypeExpr::Class { target, .. } => TypeDescriptor::erased_of(&self.owner.resolve(target)),
            TypeExpr::Array(_) => TypeDescriptor::erased_of(&well_known().array),
            TypeExpr::Wildcard { upper: Some(upper) } => self.erasure(upper),
            TypeExpr::Wildcard { upper: None } | TypeExpr::Variable(_) => TypeDescriptor::object(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/resolver_tests.rs"]
mod tests;
