//! Type descriptors.
//!
//! A `TypeDescriptor` is the immutable, tree-shaped description of one type
//! occurrence: a raw type plus its ordered type arguments. Descriptors are
//! cheap to clone (one `Arc`) and compare structurally.
//!
//! ## Placeholders
//!
//! A type variable that has no binding is represented by a *placeholder*: a
//! descriptor whose raw type and arguments are those of the variable's bound,
//! tagged with the variable it stands for. `List<E>` read straight from its
//! declaration is `List<E: Object>`. The tag lets the specializer rebind the
//! position once a concrete subtype supplies an argument.

use crate::error::{Result, TypeInfoError};
use crate::specializer::{Specializer, super_type_view};
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};
use typeinfo_host::{DeclKind, RawType, RawTypeKey, Shape, WeakRawType, well_known};

/// Where a type variable is declared.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VariableScope {
    /// A type parameter of the owning declaration.
    Type,
    /// A type parameter of the owning declaration's method, by method index.
    Method(u32),
}

/// Identity of a declared type variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeVariableId {
    pub owner: RawTypeKey,
    pub scope: VariableScope,
    pub index: u32,
}

/// A type variable together with its declaring type.
#[derive(Clone)]
pub struct TypeVariable {
    id: TypeVariableId,
    name: Arc<str>,
    owner: RawType,
}

impl TypeVariable {
    pub(crate) fn new(owner: &RawType, scope: VariableScope, index: u32, name: Arc<str>) -> Self {
        Self {
            id: TypeVariableId {
                owner: owner.key(),
                scope,
                index,
            },
            name,
            owner: owner.clone(),
        }
    }

    pub fn id(&self) -> TypeVariableId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declaration that introduces this variable.
    pub fn owner(&self) -> &RawType {
        &self.owner
    }

    pub fn scope(&self) -> VariableScope {
        self.id.scope
    }

    pub fn index(&self) -> u32 {
        self.id.index
    }
}

impl PartialEq for TypeVariable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeVariable {}

impl fmt::Debug for TypeVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owner.name(), self.name)
    }
}

pub(crate) type Arguments = SmallVec<[TypeDescriptor; 2]>;

struct DescriptorData {
    raw: RawType,
    arguments: Arguments,
    variable: Option<TypeVariable>,
}

// =============================================================================
// TypeDescriptor
// =============================================================================

#[derive(Clone)]
pub struct TypeDescriptor {
    data: Arc<DescriptorData>,
}

impl TypeDescriptor {
    pub(crate) fn new(raw: RawType, arguments: Arguments) -> Self {
        Self {
            data: Arc::new(DescriptorData {
                raw,
                arguments,
                variable: None,
            }),
        }
    }

    pub(crate) fn placeholder(bound: &TypeDescriptor, variable: TypeVariable) -> Self {
        Self {
            data: Arc::new(DescriptorData {
                raw: bound.data.raw.clone(),
                arguments: bound.data.arguments.clone(),
                variable: Some(variable),
            }),
        }
    }

    /// The erased (argument-free) descriptor of `raw`.
    pub fn erased_of(raw: &RawType) -> Self {
        Self::new(raw.clone(), SmallVec::new())
    }

    /// The descriptor of the top type.
    pub fn object() -> Self {
        Self::erased_of(&well_known().object)
    }

    /// Parameterize `raw` with explicit arguments.
    ///
    /// An empty argument list yields the erased descriptor; otherwise the
    /// count must match the declared parameter count.
    pub fn parameterized(
        raw: &RawType,
        arguments: impl IntoIterator<Item = TypeDescriptor>,
    ) -> Result<Self> {
        let arguments: Arguments = arguments.into_iter().collect();
        let expected = raw.type_parameters().len();
        if !arguments.is_empty() && arguments.len() != expected {
            return Err(TypeInfoError::ArityMismatch {
                raw_type: raw.name().to_string(),
                expected,
                found: arguments.len(),
            });
        }
        Ok(Self::new(raw.clone(), arguments))
    }

    /// `component[]`, as the built-in array type.
    pub fn array_of(component: TypeDescriptor) -> Self {
        let mut arguments = SmallVec::new();
        arguments.push(component);
        Self::new(well_known().array.clone(), arguments)
    }

    pub fn raw_type(&self) -> &RawType {
        &self.data.raw
    }

    /// Type arguments in declaration order; empty for non-generic or raw usage.
    pub fn arguments(&self) -> &[TypeDescriptor] {
        &self.data.arguments
    }

    pub fn argument(&self, index: usize) -> Option<&TypeDescriptor> {
        self.data.arguments.get(index)
    }

    /// The variable this descriptor stands in for, if it is a placeholder.
    pub fn type_variable(&self) -> Option<&TypeVariable> {
        self.data.variable.as_ref()
    }

    pub fn is_placeholder(&self) -> bool {
        self.data.variable.is_some()
    }

    /// Returns `true` for a generic raw type used without arguments.
    pub fn is_erased(&self) -> bool {
        self.data.arguments.is_empty() && self.data.raw.is_generic()
    }

    pub fn has_unbound_variables(&self) -> bool {
        self.is_placeholder() || self.arguments().iter().any(Self::has_unbound_variables)
    }

    pub fn shape(&self) -> Shape {
        self.data.raw.shape()
    }

    /// Sequences and arrays.
    pub fn is_collection_like(&self) -> bool {
        matches!(self.shape(), Shape::Sequence | Shape::Array)
    }

    pub fn is_map(&self) -> bool {
        self.shape() == Shape::Map
    }

    pub fn is_array(&self) -> bool {
        self.data.raw.kind() == DeclKind::Array
    }

    /// Same raw type, no arguments, no variable origin.
    pub fn erased(&self) -> Self {
        Self::erased_of(&self.data.raw)
    }

    // -------------------------------------------------------------------------
    // Shape accessors
    // -------------------------------------------------------------------------

    /// Element type of a sequence or array. For maps this is the key type.
    pub fn component_type(&self) -> Result<Self> {
        match self.shape() {
            Shape::Array => Ok(self.argument(0).cloned().unwrap_or_else(Self::object)),
            Shape::Sequence => Ok(self.viewed_argument(&well_known().iterable, 0)),
            Shape::Map => self.map_key_type(),
            shape => Err(self.not_applicable("component_type", shape)),
        }
    }

    pub fn map_key_type(&self) -> Result<Self> {
        self.map_argument("map_key_type", 0)
    }

    pub fn map_value_type(&self) -> Result<Self> {
        self.map_argument("map_value_type", 1)
    }

    /// Like [`component_type`](Self::component_type), but `Object` where the
    /// shape has no component.
    pub fn component_type_or_any(&self) -> Self {
        self.component_type().unwrap_or_else(|_| Self::object())
    }

    pub fn map_key_type_or_any(&self) -> Self {
        self.map_key_type().unwrap_or_else(|_| Self::object())
    }

    pub fn map_value_type_or_any(&self) -> Self {
        self.map_value_type().unwrap_or_else(|_| Self::object())
    }

    /// The type a query would actually materialize: the value type of a map,
    /// the element type of a collection or array, otherwise `self`.
    pub fn actual_type(&self) -> Self {
        match self.shape() {
            Shape::Map => self.map_value_type_or_any(),
            Shape::Sequence | Shape::Array => self.component_type_or_any(),
            Shape::Scalar | Shape::Aggregate => self.clone(),
        }
    }

    fn map_argument(&self, accessor: &'static str, index: usize) -> Result<Self> {
        match self.shape() {
            Shape::Map => Ok(self.viewed_argument(&well_known().map, index)),
            shape => Err(self.not_applicable(accessor, shape)),
        }
    }

    /// Argument `index` of `self` viewed as its supertype `target`, falling
    /// back to `Object` for erased views.
    fn viewed_argument(&self, target: &RawType, index: usize) -> Self {
        super_type_view(self, target)
            .and_then(|view| view.argument(index).cloned())
            .unwrap_or_else(Self::object)
    }

    fn not_applicable(&self, accessor: &'static str, shape: Shape) -> TypeInfoError {
        TypeInfoError::NotApplicableForShape {
            accessor,
            raw_type: self.to_string(),
            shape,
        }
    }

    // -------------------------------------------------------------------------
    // Relations
    // -------------------------------------------------------------------------

    /// Whether a value of type `candidate` can be used where `self` is
    /// expected, under the default covariant policy.
    pub fn is_assignable_from(&self, candidate: &TypeDescriptor) -> bool {
        Specializer::new().is_assignable_from(candidate, self)
    }

    /// Identity of the shared node, not structural equality.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub fn downgrade(&self) -> WeakTypeDescriptor {
        WeakTypeDescriptor {
            data: Arc::downgrade(&self.data),
        }
    }

    /// Copy of the tree that holds every raw type weakly.
    pub(crate) fn detach(&self) -> DetachedDescriptor {
        DetachedDescriptor {
            raw: self.data.raw.downgrade(),
            arguments: self.data.arguments.iter().map(Self::detach).collect(),
            variable: self.data.variable.as_ref().map(|var| DetachedVariable {
                owner: var.owner.downgrade(),
                scope: var.id.scope,
                index: var.id.index,
                name: Arc::clone(&var.name),
            }),
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.data.raw == other.data.raw
            && self.data.variable == other.data.variable
            && self.data.arguments == other.data.arguments
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.raw.hash(state);
        self.data.variable.as_ref().map(TypeVariable::id).hash(state);
        self.data.arguments.hash(state);
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(var) = &self.data.variable {
            return f.write_str(var.name());
        }
        if self.is_array() {
            return match self.argument(0) {
                Some(component) => write!(f, "{component}[]"),
                None => f.write_str(self.data.raw.name()),
            };
        }
        f.write_str(self.data.raw.name())?;
        if let Some((first, rest)) = self.data.arguments.split_first() {
            write!(f, "<{first}")?;
            for arg in rest {
                write!(f, ", {arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data.variable {
            Some(var) => write!(f, "TypeDescriptor({var:?} extends ")?,
            None => f.write_str("TypeDescriptor(")?,
        }
        write!(f, "{}", self.data.raw.name())?;
        if !self.data.arguments.is_empty() {
            f.debug_list().entries(self.data.arguments.iter()).finish()?;
        }
        f.write_str(")")
    }
}

/// Non-owning handle to a descriptor.
#[derive(Clone)]
pub struct WeakTypeDescriptor {
    data: Weak<DescriptorData>,
}

impl WeakTypeDescriptor {
    pub fn upgrade(&self) -> Option<TypeDescriptor> {
        self.data.upgrade().map(|data| TypeDescriptor { data })
    }

    pub fn is_live(&self) -> bool {
        self.data.strong_count() > 0
    }
}

impl fmt::Debug for WeakTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(descriptor) => write!(f, "WeakTypeDescriptor({descriptor})"),
            None => f.write_str("WeakTypeDescriptor(<dropped>)"),
        }
    }
}

/// A descriptor tree that does not keep any loader reachable.
///
/// [`attach`](Self::attach) rebuilds an equal descriptor while every raw type
/// it names is still loaded.
pub(crate) struct DetachedDescriptor {
    raw: WeakRawType,
    arguments: Box<[DetachedDescriptor]>,
    variable: Option<DetachedVariable>,
}

struct DetachedVariable {
    owner: WeakRawType,
    scope: VariableScope,
    index: u32,
    name: Arc<str>,
}

impl DetachedDescriptor {
    pub(crate) fn attach(&self) -> Option<TypeDescriptor> {
        let raw = self.raw.upgrade()?;
        let arguments = self
            .arguments
            .iter()
            .map(Self::attach)
            .collect::<Option<Arguments>>()?;
        let variable = match &self.variable {
            Some(var) => Some(TypeVariable::new(
                &var.owner.upgrade()?,
                var.scope,
                var.index,
                Arc::clone(&var.name),
            )),
            None => None,
        };
        Some(TypeDescriptor {
            data: Arc::new(DescriptorData {
                raw,
                arguments,
                variable,
            }),
        })
    }
}

#[cfg(test)]
#[path = "../tests/descriptor_tests.rs"]
mod tests;
