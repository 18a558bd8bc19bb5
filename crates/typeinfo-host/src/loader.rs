//! Type loaders and raw type identities.
//!
//! A `TypeLoader` plays the role of a class loader: it owns a set of
//! declarations and is the unit that gets dropped when an application module
//! is unloaded. A `RawType` is the identity of one declaration; holding one
//! keeps its loader alive, the same way a class keeps its loader reachable.
//!
//! ## Identity
//!
//! `RawTypeKey` is `(LoaderId, index)`. Loader ids come from a process-wide
//! counter and are never reused, so a key that outlives its loader can never
//! alias a type loaded later.

use crate::decl::{DeclKind, DeclSpec, Field, Method, Shape, TypeDecl};
use crate::error::HostError;
use crate::expr::{DeclRef, TypeExpr, TypeParam, VarRef};
use crate::parser::{self, Header, ParamNode, SigNode};
use crate::well_known::well_known;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};
use typeinfo_common::limits::MAX_SUPERTYPE_WALK;

/// Global counter for assigning unique ids to loaders.
static NEXT_LOADER_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(pub u32);

pub(crate) struct LoaderData {
    id: LoaderId,
    name: Arc<str>,
    bootstrap: bool,
    decls: IndexMap<Arc<str>, TypeDecl>,
    parents: Vec<TypeLoader>,
}

impl Drop for LoaderData {
    fn drop(&mut self) {
        trace!(loader_id = self.id.0, name = %self.name, "TypeLoader unloaded");
    }
}

// =============================================================================
// TypeLoader
// =============================================================================

/// Owner of a set of declarations.
///
/// Cheap to clone; all clones share the same declarations.
#[derive(Clone)]
pub struct TypeLoader {
    data: Arc<LoaderData>,
}

impl TypeLoader {
    pub fn builder(name: &str) -> LoaderBuilder {
        LoaderBuilder {
            name: name.to_string(),
            parents: Vec::new(),
            specs: Vec::new(),
            bootstrap: false,
        }
    }

    pub fn id(&self) -> LoaderId {
        self.data.id
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn is_bootstrap(&self) -> bool {
        self.data.bootstrap
    }

    /// Number of declarations owned by this loader.
    pub fn len(&self) -> usize {
        self.data.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.decls.is_empty()
    }

    /// Look up a declaration owned by this loader.
    pub fn get(&self, name: &str) -> Option<RawType> {
        self.data.decls.get_index_of(name).map(|index| RawType {
            loader: Arc::clone(&self.data),
            index: index as u32,
        })
    }

    /// Look up a type visible from this loader: its own declarations, then
    /// its parents in order, then the well-known types.
    pub fn lookup(&self, name: &str) -> Option<RawType> {
        self.get(name)
            .or_else(|| self.data.parents.iter().find_map(|p| p.lookup(name)))
            .or_else(|| {
                if self.data.bootstrap {
                    None
                } else {
                    well_known().loader.get(name)
                }
            })
    }

    /// All declarations owned by this loader, in declaration order.
    pub fn types(&self) -> impl Iterator<Item = RawType> + '_ {
        (0..self.data.decls.len()).map(|index| RawType {
            loader: Arc::clone(&self.data),
            index: index as u32,
        })
    }
}

impl fmt::Debug for TypeLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeLoader")
            .field("id", &self.data.id)
            .field("name", &self.data.name)
            .field("types", &self.data.decls.len())
            .finish()
    }
}

// =============================================================================
// RawType
// =============================================================================

/// Identity of a declared type, independent of any parameterization.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawTypeKey {
    pub loader: LoaderId,
    pub index: u32,
}

/// A declared type: the erased shape behind every use of it.
#[derive(Clone)]
pub struct RawType {
    loader: Arc<LoaderData>,
    index: u32,
}

impl RawType {
    pub fn key(&self) -> RawTypeKey {
        RawTypeKey {
            loader: self.loader.id,
            index: self.index,
        }
    }

    fn decl(&self) -> &TypeDecl {
        &self.loader.decls[self.index as usize]
    }

    pub fn name(&self) -> &str {
        &self.decl().name
    }

    pub fn kind(&self) -> DeclKind {
        self.decl().kind
    }

    pub fn loader(&self) -> TypeLoader {
        TypeLoader {
            data: Arc::clone(&self.loader),
        }
    }

    pub fn type_parameters(&self) -> &[TypeParam] {
        &self.decl().type_params
    }

    pub fn is_generic(&self) -> bool {
        !self.decl().type_params.is_empty()
    }

    /// Declared bound of the `index`-th type parameter, if it has one.
    pub fn bound_of(&self, index: usize) -> Option<&TypeExpr> {
        self.decl().type_params.get(index).and_then(TypeParam::bound)
    }

    /// Declared supertypes, as written (`Repository<Person, Long>`).
    pub fn supertypes(&self) -> &[TypeExpr] {
        &self.decl().supertypes
    }

    /// Raw identities of the declared supertypes.
    pub fn direct_supertypes(&self) -> impl Iterator<Item = RawType> + '_ {
        self.decl().supertypes.iter().filter_map(|sup| match sup {
            TypeExpr::Class { target, .. } => Some(self.resolve(target)),
            _ => None,
        })
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.decl().fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> + '_ {
        self.decl().fields.values()
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.decl().methods.get(name)
    }

    /// Declaration-order position of a method, stable for the loader's lifetime.
    pub fn method_index(&self, name: &str) -> Option<u32> {
        self.decl().methods.get_index_of(name).map(|i| i as u32)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> + '_ {
        self.decl().methods.values()
    }

    /// Resolve a reference found in one of this type's signatures.
    pub fn resolve(&self, target: &DeclRef) -> RawType {
        match target {
            DeclRef::Local(index) => RawType {
                loader: Arc::clone(&self.loader),
                index: *index,
            },
            DeclRef::External(raw) => raw.clone(),
        }
    }

    /// Returns `true` for the top type every other type is a subtype of.
    pub fn is_object(&self) -> bool {
        *self == well_known().object
    }

    /// Raw (erased) subtyping: reflexive, everything is a subtype of `Object`,
    /// otherwise the transitive closure over declared supertypes.
    pub fn is_subtype_of(&self, other: &RawType) -> bool {
        if self == other || other.is_object() {
            return true;
        }

        let mut visited: FxHashSet<RawTypeKey> = FxHashSet::default();
        let mut stack = vec![self.clone()];
        while let Some(current) = stack.pop() {
            if !visited.insert(current.key()) {
                continue;
            }
            if visited.len() as u32 > MAX_SUPERTYPE_WALK {
                debug!(
                    from = self.name(),
                    to = other.name(),
                    "supertype walk limit reached"
                );
                return false;
            }
            for sup in current.direct_supertypes() {
                if sup == *other {
                    return true;
                }
                stack.push(sup);
            }
        }
        false
    }

    /// Structural shape, derived from the declaration and its supertypes.
    pub fn shape(&self) -> Shape {
        if self.kind() == DeclKind::Array {
            return Shape::Array;
        }
        let wk = well_known();
        if self.is_subtype_of(&wk.map) {
            Shape::Map
        } else if self.is_subtype_of(&wk.iterable) {
            Shape::Sequence
        } else if self.kind() == DeclKind::Scalar {
            Shape::Scalar
        } else {
            Shape::Aggregate
        }
    }

    pub fn downgrade(&self) -> WeakRawType {
        WeakRawType {
            loader: Arc::downgrade(&self.loader),
            key: self.key(),
        }
    }
}

impl PartialEq for RawType {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && Arc::ptr_eq(&self.loader, &other.loader)
    }
}

impl Eq for RawType {}

impl Hash for RawType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RawType({}#{}:{})",
            self.name(),
            self.loader.id.0,
            self.index
        )
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Non-owning handle to a raw type. Does not keep the loader alive.
#[derive(Clone, Debug)]
pub struct WeakRawType {
    loader: Weak<LoaderData>,
    key: RawTypeKey,
}

impl WeakRawType {
    pub fn key(&self) -> RawTypeKey {
        self.key
    }

    pub fn upgrade(&self) -> Option<RawType> {
        self.loader.upgrade().map(|loader| RawType {
            loader,
            index: self.key.index,
        })
    }

    /// Returns `true` while the owning loader is still reachable.
    pub fn is_live(&self) -> bool {
        self.loader.strong_count() > 0
    }
}

// =============================================================================
// LoaderBuilder
// =============================================================================

/// Collects declaration specs and lowers them into a loader.
///
/// Names inside signatures resolve, in order, to: the enclosing method's type
/// parameters, the declaring type's parameters, declarations of the loader
/// being built (in any order), the parents' visible types, the well-known
/// types.
pub struct LoaderBuilder {
    name: String,
    parents: Vec<TypeLoader>,
    specs: Vec<DeclSpec>,
    bootstrap: bool,
}

impl LoaderBuilder {
    pub fn parent(mut self, parent: &TypeLoader) -> Self {
        self.parents.push(parent.clone());
        self
    }

    pub fn declare(mut self, spec: DeclSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub(crate) fn bootstrap(mut self) -> Self {
        self.bootstrap = true;
        self
    }

    pub fn build(self) -> Result<TypeLoader, HostError> {
        // Pass 1: headers, so declarations can reference each other in any order.
        let mut locals: IndexMap<Arc<str>, usize> = IndexMap::with_capacity(self.specs.len());
        let mut headers = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            let header = parser::parse_header(&spec.header)?;
            if locals
                .insert(Arc::from(header.name.as_str()), header.params.len())
                .is_some()
            {
                return Err(HostError::DuplicateType {
                    name: header.name,
                    loader: self.name,
                });
            }
            headers.push(header);
        }

        // Pass 2: lower every signature.
        let mut decls = IndexMap::with_capacity(self.specs.len());
        for (spec, header) in self.specs.iter().zip(headers) {
            let decl = self.lower_decl(spec, header, &locals)?;
            decls.insert(Arc::clone(&decl.name), decl);
        }

        let id = LoaderId(NEXT_LOADER_ID.fetch_add(1, Ordering::SeqCst));
        debug!(
            loader_id = id.0,
            name = %self.name,
            types = decls.len(),
            parents = self.parents.len(),
            "TypeLoader::build"
        );

        Ok(TypeLoader {
            data: Arc::new(LoaderData {
                id,
                name: Arc::from(self.name),
                bootstrap: self.bootstrap,
                decls,
                parents: self.parents,
            }),
        })
    }

    fn lower_decl(
        &self,
        spec: &DeclSpec,
        header: Header,
        locals: &IndexMap<Arc<str>, usize>,
    ) -> Result<TypeDecl, HostError> {
        let type_names = param_names(&header.params);
        let scope = Scope {
            builder: self,
            locals,
            type_params: &type_names,
            method_params: &[],
            context: &header.name,
        };

        let type_params = scope.lower_params(&header.params, &type_names)?;

        let mut supertypes = Vec::with_capacity(spec.extends.len());
        for signature in &spec.extends {
            match scope.lower(&parser::parse_type(signature)?)? {
                expr @ TypeExpr::Class { .. } => supertypes.push(expr),
                _ => {
                    return Err(HostError::InvalidSupertype {
                        owner: header.name.clone(),
                        signature: signature.clone(),
                    });
                }
            }
        }

        let mut fields = IndexMap::with_capacity(spec.fields.len());
        for (name, signature) in &spec.fields {
            if fields.contains_key(name.as_str()) {
                return Err(duplicate_member(&header.name, name));
            }
            let name: Arc<str> = Arc::from(name.as_str());
            let ty = scope.lower(&parser::parse_type(signature)?)?;
            fields.insert(Arc::clone(&name), Field { name, ty });
        }

        let mut methods = IndexMap::with_capacity(spec.methods.len());
        for method in &spec.methods {
            let nodes = match &method.type_params {
                Some(src) => parser::parse_type_params(src)?,
                None => Vec::new(),
            };
            let method_names = param_names(&nodes);
            let method_scope = Scope {
                method_params: &method_names,
                ..scope
            };
            let type_params = method_scope.lower_params(&nodes, &method_names)?;
            let return_type = method_scope.lower(&parser::parse_type(&method.returns)?)?;
            let parameters = method
                .params
                .iter()
                .map(|p| method_scope.lower(&parser::parse_type(p)?))
                .collect::<Result<Vec<_>, _>>()?;

            let name: Arc<str> = Arc::from(method.name.as_str());
            let lowered = Method {
                name: Arc::clone(&name),
                type_params,
                return_type,
                parameters,
            };
            if methods.insert(name, lowered).is_some() {
                return Err(duplicate_member(&header.name, &method.name));
            }
        }

        trace!(
            name = %header.name,
            kind = ?spec.kind,
            type_params = type_params.len(),
            supertypes = supertypes.len(),
            "lowered declaration"
        );

        Ok(TypeDecl {
            name: Arc::from(header.name.as_str()),
            kind: spec.kind,
            type_params,
            supertypes,
            fields,
            methods,
        })
    }
}

fn param_names(params: &[ParamNode]) -> Vec<Arc<str>> {
    params.iter().map(|p| Arc::from(p.name.as_str())).collect()
}

fn duplicate_member(owner: &str, member: &str) -> HostError {
    HostError::DuplicateMember {
        owner: owner.to_string(),
        member: member.to_string(),
    }
}

/// Name resolution scope for one declaration or method.
#[derive(Clone, Copy)]
struct Scope<'a> {
    builder: &'a LoaderBuilder,
    locals: &'a IndexMap<Arc<str>, usize>,
    type_params: &'a [Arc<str>],
    method_params: &'a [Arc<str>],
    context: &'a str,
}

impl Scope<'_> {
    fn variable(&self, name: &str) -> Option<VarRef> {
        if let Some(i) = self.method_params.iter().position(|p| &**p == name) {
            return Some(VarRef::Method(i as u32));
        }
        self.type_params
            .iter()
            .position(|p| &**p == name)
            .map(|i| VarRef::Type(i as u32))
    }

    fn declaration(&self, name: &str) -> Result<(DeclRef, usize), HostError> {
        if let Some(index) = self.locals.get_index_of(name) {
            return Ok((DeclRef::Local(index as u32), self.locals[index]));
        }
        let visible = self
            .builder
            .parents
            .iter()
            .find_map(|parent| parent.lookup(name))
            .or_else(|| {
                if self.builder.bootstrap {
                    None
                } else {
                    well_known().loader.get(name)
                }
            });
        match visible {
            Some(raw) => {
                let arity = raw.type_parameters().len();
                Ok((DeclRef::External(raw), arity))
            }
            None => Err(HostError::UnknownType {
                name: name.to_string(),
                context: self.context.to_string(),
            }),
        }
    }

    fn lower(&self, node: &SigNode) -> Result<TypeExpr, HostError> {
        match node {
            SigNode::Named { name, arguments } => {
                if let Some(var) = self.variable(name) {
                    if !arguments.is_empty() {
                        return Err(self.arity_mismatch(name, 0, arguments.len()));
                    }
                    return Ok(TypeExpr::Variable(var));
                }

                let (target, arity) = self.declaration(name)?;
                // Zero arguments is raw usage and always allowed.
                if !arguments.is_empty() && arguments.len() != arity {
                    return Err(self.arity_mismatch(name, arity, arguments.len()));
                }
                let arguments = arguments
                    .iter()
                    .map(|arg| self.lower(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TypeExpr::Class { target, arguments })
            }
            SigNode::Array(component) => Ok(TypeExpr::Array(Box::new(self.lower(component)?))),
            SigNode::Wildcard(upper) => {
                let upper = match upper {
                    Some(upper) => Some(Box::new(self.lower(upper)?)),
                    None => None,
                };
                Ok(TypeExpr::Wildcard { upper })
            }
        }
    }

    fn lower_params(
        &self,
        nodes: &[ParamNode],
        names: &[Arc<str>],
    ) -> Result<Vec<TypeParam>, HostError> {
        nodes
            .iter()
            .zip(names)
            .map(|(node, name)| {
                let bounds = node
                    .bounds
                    .iter()
                    .map(|bound| self.lower(bound))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TypeParam {
                    name: Arc::clone(name),
                    bounds,
                })
            })
            .collect()
    }

    fn arity_mismatch(&self, name: &str, expected: usize, found: usize) -> HostError {
        HostError::ArityMismatch {
            name: name.to_string(),
            expected,
            found,
            context: self.context.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/loader_tests.rs"]
mod tests;
