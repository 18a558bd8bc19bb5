//! Specialization and assignability.
//!
//! Everything that depends on variance lives here, behind
//! [`AssignabilityPolicy`]. The resolver and the cache never compare
//! arguments themselves.

use crate::descriptor::{Arguments, TypeDescriptor, VariableScope};
use crate::query_trace;
use crate::recursion::{DepthCounter, RecursionGuard, RecursionProfile, RecursionResult};
use crate::resolver::ResolutionPass;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};
use typeinfo_host::{RawType, RawTypeKey, TypeExpr};

/// How type arguments are compared once raw types are compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssignabilityPolicy {
    /// `List<Integer>` is assignable to `List<Number>`.
    #[default]
    Covariant,
    /// Arguments must be structurally equal.
    Invariant,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Specializer {
    policy: AssignabilityPolicy,
}

impl Specializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: AssignabilityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AssignabilityPolicy {
        self.policy
    }

    /// Bind the type variables left in `generic` using the arguments that
    /// `concrete` supplies for their declaring types.
    ///
    /// A placeholder owned by `concrete`'s raw type binds positionally; one
    /// owned by a supertype binds through [`super_type_view`]. Positions that
    /// cannot be bound keep their placeholder, which already carries the
    /// declared bound.
    pub fn specialize(&self, generic: &TypeDescriptor, concrete: &TypeDescriptor) -> TypeDescriptor {
        let query_id = query_trace::enabled().then(query_trace::next_query_id);
        if let Some(query_id) = query_id {
            query_trace::relation_start(
                query_id,
                "specialize",
                &generic.to_string(),
                &concrete.to_string(),
            );
        }

        let mut rebinder = Rebinder {
            concrete,
            views: FxHashMap::default(),
            depth: DepthCounter::with_profile(RecursionProfile::ArgumentDescent),
        };
        let result = rebinder.rebind(generic);

        trace!(generic = %generic, concrete = %concrete, result = %result, "specialized");
        if let Some(query_id) = query_id {
            query_trace::unary_end(query_id, "specialize", &result.to_string());
        }
        result
    }

    /// Whether a value of type `candidate` can be used where `target` is
    /// expected.
    ///
    /// Raw types must be related by subtyping. An erased target accepts any
    /// parameterization, and so does an erased candidate. A placeholder
    /// argument on either side accepts any argument within its bound.
    pub fn is_assignable_from(&self, candidate: &TypeDescriptor, target: &TypeDescriptor) -> bool {
        let query_id = query_trace::enabled().then(query_trace::next_query_id);
        if let Some(query_id) = query_id {
            query_trace::relation_start(
                query_id,
                "is_assignable_from",
                &candidate.to_string(),
                &target.to_string(),
            );
        }

        let mut depth = DepthCounter::with_profile(RecursionProfile::ArgumentDescent);
        let result = self.assignable(candidate, target, &mut depth);

        if let Some(query_id) = query_id {
            query_trace::relation_end(query_id, "is_assignable_from", result);
        }
        result
    }

    /// `descriptor` viewed as its supertype `target`.
    pub fn super_type_view(
        &self,
        descriptor: &TypeDescriptor,
        target: &RawType,
    ) -> Option<TypeDescriptor> {
        super_type_view(descriptor, target)
    }

    fn assignable(
        &self,
        candidate: &TypeDescriptor,
        target: &TypeDescriptor,
        depth: &mut DepthCounter,
    ) -> bool {
        if candidate == target {
            return true;
        }
        if !candidate.raw_type().is_subtype_of(target.raw_type()) {
            return false;
        }
        if target.arguments().is_empty() || target.raw_type().is_object() {
            return true;
        }

        let Some(view) = super_type_view(candidate, target.raw_type()) else {
            return false;
        };
        if view.arguments().is_empty() {
            return true;
        }
        if view.arguments().len() != target.arguments().len() {
            return false;
        }

        if !depth.enter() {
            debug!(
                candidate = %candidate,
                target = %target,
                "argument nesting limit reached; accepting on raw types"
            );
            return true;
        }
        let result = view
            .arguments()
            .iter()
            .zip(target.arguments())
            .all(|(c, t)| self.argument_assignable(c, t, depth));
        depth.leave();
        result
    }

    fn argument_assignable(
        &self,
        candidate: &TypeDescriptor,
        target: &TypeDescriptor,
        depth: &mut DepthCounter,
    ) -> bool {
        if candidate == target {
            return true;
        }
        let (c_raw, t_raw) = (candidate.raw_type(), target.raw_type());
        if target.is_placeholder() {
            return c_raw.is_subtype_of(t_raw);
        }
        if candidate.is_placeholder() {
            return c_raw.is_subtype_of(t_raw) || t_raw.is_subtype_of(c_raw);
        }
        match self.policy {
            AssignabilityPolicy::Covariant => self.assignable(candidate, target, depth),
            AssignabilityPolicy::Invariant => false,
        }
    }
}

/// Rebinds placeholders against one concrete descriptor, viewing it as each
/// variable's owner at most once.
struct Rebinder<'a> {
    concrete: &'a TypeDescriptor,
    views: FxHashMap<RawTypeKey, Option<TypeDescriptor>>,
    depth: DepthCounter,
}

impl Rebinder<'_> {
    fn rebind(&mut self, descriptor: &TypeDescriptor) -> TypeDescriptor {
        if let Some(var) = descriptor.type_variable() {
            if var.scope() == VariableScope::Type {
                let concrete = self.concrete;
                let view = self
                    .views
                    .entry(var.owner().key())
                    .or_insert_with(|| super_type_view(concrete, var.owner()));
                if let Some(bound) = view
                    .as_ref()
                    .and_then(|view| view.argument(var.index() as usize))
                {
                    return bound.clone();
                }
            }
            return descriptor.clone();
        }

        if descriptor.arguments().is_empty() {
            return descriptor.clone();
        }
        if !self.depth.enter() {
            debug!(descriptor = %descriptor, "argument nesting limit reached; left unspecialized");
            return descriptor.clone();
        }
        let arguments: Arguments = descriptor
            .arguments()
            .iter()
            .map(|arg| self.rebind(arg))
            .collect();
        self.depth.leave();

        let unchanged = arguments
            .iter()
            .zip(descriptor.arguments())
            .all(|(new, old)| new.ptr_eq(old));
        if unchanged {
            descriptor.clone()
        } else {
            TypeDescriptor::new(descriptor.raw_type().clone(), arguments)
        }
    }
}

// =============================================================================
// Supertype views
// =============================================================================

/// `descriptor` as parameterized through its declared supertypes, seen as
/// `target`. `None` when `target` is not a supertype of `descriptor`'s raw
/// type. An erased descriptor has an erased view.
///
/// `ArrayList<String>` viewed as `Iterable` is `Iterable<String>`.
pub fn super_type_view(descriptor: &TypeDescriptor, target: &RawType) -> Option<TypeDescriptor> {
    let raw = descriptor.raw_type();
    if raw == target {
        return Some(descriptor.clone());
    }
    if !raw.is_subtype_of(target) {
        return None;
    }
    if target.is_object() {
        return Some(TypeDescriptor::object());
    }
    let mut guard = RecursionGuard::with_profile(RecursionProfile::SupertypeView);
    view_step(descriptor, target, &mut guard)
}

fn view_step(
    descriptor: &TypeDescriptor,
    target: &RawType,
    guard: &mut RecursionGuard<RawTypeKey>,
) -> Option<TypeDescriptor> {
    let raw = descriptor.raw_type();
    if raw == target {
        return Some(descriptor.clone());
    }
    if descriptor.is_erased() {
        return Some(TypeDescriptor::erased_of(target));
    }

    let key = raw.key();
    match guard.enter(key) {
        RecursionResult::Entered => {}
        denied => {
            debug!(raw_type = %raw, target = %target, reason = ?denied, "supertype view cut");
            return None;
        }
    }

    let bindings = Some(descriptor.arguments()).filter(|args| !args.is_empty());
    let mut found = None;
    for expr in raw.supertypes() {
        let TypeExpr::Class { target: decl, .. } = expr else {
            continue;
        };
        if !raw.resolve(decl).is_subtype_of(target) {
            continue;
        }
        let supertype = ResolutionPass::new(raw, bindings).resolve(expr);
        found = view_step(&supertype, target, guard);
        if found.is_some() {
            break;
        }
    }

    guard.leave(key);
    found
}

#[cfg(test)]
#[path = "../tests/specializer_tests.rs"]
mod tests;
