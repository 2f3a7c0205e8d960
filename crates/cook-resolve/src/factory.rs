//! Binding construction and the lattice algebra over type expressions.
//!
//! [`BindingFactory::balance`] is the shared structural traversal: it walks two type
//! expressions side by side and, wherever exactly one side is a bare variable, asks a
//! [`Balancer`] what to bind. [`Rise`] and [`Sink`] are the two strategies the resolver tree
//! branches on. [`BindingFactory::union`] and [`BindingFactory::intersect`] compute joins and
//! meets by consulting the class hierarchy.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use cook_types::{
    greatest_lower_classes, instantiate_as_subtype, instantiate_as_supertype, is_subclass,
    least_upper_classes, ClassId, ClassType, Type, TypeEnv, VarId, WildcardBound,
};

use crate::{Binding, ConstraintSystem};

/// What to bind when exactly one side of a pair is a bare variable.
pub trait Balancer {
    /// `var <: ty`
    fn var_type(&self, factory: &BindingFactory, var: VarId, ty: &Type) -> Option<Binding>;
    /// `ty <: var`
    fn type_var(&self, factory: &BindingFactory, ty: &Type, var: VarId) -> Option<Binding>;
}

/// Generalize the variable to the concrete type it is paired with.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rise;

impl Balancer for Rise {
    fn var_type(&self, factory: &BindingFactory, var: VarId, ty: &Type) -> Option<Binding> {
        Some(factory.create_singleton(var, ty.clone()))
    }

    fn type_var(&self, factory: &BindingFactory, ty: &Type, var: VarId) -> Option<Binding> {
        Some(factory.create_singleton(var, ty.clone()))
    }
}

/// Keep the concrete type for `var <: T`, but drive the variable to `Bottom` for `T <: var`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sink;

impl Balancer for Sink {
    fn var_type(&self, factory: &BindingFactory, var: VarId, ty: &Type) -> Option<Binding> {
        Some(factory.create_singleton(var, ty.clone()))
    }

    fn type_var(&self, factory: &BindingFactory, _ty: &Type, var: VarId) -> Option<Binding> {
        Some(factory.create_singleton(var, Type::Bottom))
    }
}

struct Shared {
    variable_count: usize,
    bound: BTreeSet<usize>,
    env: Arc<dyn TypeEnv + Send + Sync>,
}

/// Creates bindings for one resolution run and implements `rise`, `sink`, `union` and
/// `intersect`.
///
/// Immutable after construction; clones share the same state.
#[derive(Clone)]
pub struct BindingFactory {
    shared: Arc<Shared>,
}

impl BindingFactory {
    pub fn new(
        variable_count: usize,
        bound: impl IntoIterator<Item = usize>,
        env: Arc<dyn TypeEnv + Send + Sync>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                variable_count,
                bound: bound.into_iter().collect(),
                env,
            }),
        }
    }

    pub fn for_system(system: &ConstraintSystem, env: Arc<dyn TypeEnv + Send + Sync>) -> Self {
        Self::new(system.variable_count(), system.bound().iter().copied(), env)
    }

    pub fn variable_count(&self) -> usize {
        self.shared.variable_count
    }

    /// Indices of the variables whose values are reported.
    pub fn bound(&self) -> &BTreeSet<usize> {
        &self.shared.bound
    }

    pub fn env(&self) -> &dyn TypeEnv {
        &*self.shared.env
    }

    pub fn create(&self) -> Binding {
        Binding::empty(self.clone())
    }

    /// `var -> ty`. A type that mentions `var` itself binds `var` to `Bottom` instead.
    pub fn create_singleton(&self, var: VarId, ty: Type) -> Binding {
        if !ty.is_var() && ty.mentions_var(var) {
            return Binding::singleton(self.clone(), var, Type::Bottom);
        }
        Binding::singleton(self.clone(), var, ty)
    }

    pub fn rise(&self, x: &Type, y: &Type) -> Option<Binding> {
        self.balance(x, y, &Rise)
    }

    pub fn sink(&self, x: &Type, y: &Type) -> Option<Binding> {
        self.balance(x, y, &Sink)
    }

    /// Find a binding under which `x <: y` holds, using `strategy` for lone variables.
    pub fn balance(&self, x: &Type, y: &Type, strategy: &dyn Balancer) -> Option<Binding> {
        match (x, y) {
            (Type::Var(a), Type::Var(b)) => Some(self.link(*a, *b)),
            (Type::Var(var), _) => strategy.var_type(self, *var, y),
            (_, Type::Var(var)) => strategy.type_var(self, x, *var),
            (Type::Bottom, _) | (_, Type::Bottom) => Some(self.create()),
            (Type::Wildcard(wx), Type::Wildcard(wy)) => self.balance_wildcards(wx, wy, strategy),
            (Type::Wildcard(WildcardBound::Extends(bound)), _) => {
                self.balance(bound, y, strategy)
            }
            (Type::Wildcard(_), _) => self.is_root(y).then(|| self.create()),
            (_, Type::Wildcard(WildcardBound::Unbounded)) => Some(self.create()),
            (_, Type::Wildcard(WildcardBound::Extends(bound))) => self.balance(x, bound, strategy),
            (_, Type::Wildcard(WildcardBound::Super(bound))) => self.balance(bound, x, strategy),
            (Type::Array(a), Type::Array(b)) => self.balance(a, b, strategy),
            (Type::Array(_), Type::Class(ClassType { def, args })) => {
                let universal = self.env().well_known().array_supertypes().contains(def);
                (universal && args.is_empty()).then(|| self.create())
            }
            (Type::Class(_), Type::Class(ClassType { def, args })) => {
                let Some(Type::Class(view)) = instantiate_as_supertype(self.env(), x, *def) else {
                    return None;
                };
                if view.args.is_empty() || args.is_empty() || view.args.len() != args.len() {
                    return Some(self.create());
                }
                self.unify_all(&view.args, args, strategy)
            }
            _ => (x == y).then(|| self.create()),
        }
    }

    /// Canonical binding between two variables: the larger index points at the smaller one.
    fn link(&self, a: VarId, b: VarId) -> Binding {
        match a.cmp(&b) {
            std::cmp::Ordering::Equal => self.create(),
            std::cmp::Ordering::Greater => self.create_singleton(a, Type::Var(b)),
            std::cmp::Ordering::Less => self.create_singleton(b, Type::Var(a)),
        }
    }

    fn balance_wildcards(
        &self,
        x: &WildcardBound,
        y: &WildcardBound,
        strategy: &dyn Balancer,
    ) -> Option<Binding> {
        match (x, y) {
            (_, WildcardBound::Unbounded) => Some(self.create()),
            (WildcardBound::Extends(a), WildcardBound::Extends(b)) => self.balance(a, b, strategy),
            (WildcardBound::Super(a), WildcardBound::Super(b)) => self.balance(b, a, strategy),
            (WildcardBound::Unbounded, WildcardBound::Extends(b)) => {
                self.is_root(b).then(|| self.create())
            }
            _ => None,
        }
    }

    /// Type arguments are invariant: only wildcards and variables introduce slack.
    fn unify(&self, x: &Type, y: &Type, strategy: &dyn Balancer) -> Option<Binding> {
        match (x, y) {
            (Type::Var(_) | Type::Wildcard(_), _) | (_, Type::Var(_) | Type::Wildcard(_)) => {
                self.balance(x, y, strategy)
            }
            (Type::Bottom, _) | (_, Type::Bottom) => Some(self.create()),
            (Type::Array(a), Type::Array(b)) => self.unify(a, b, strategy),
            (Type::Class(a), Type::Class(b)) => {
                if a.def != b.def {
                    return None;
                }
                if a.args.is_empty() || b.args.is_empty() || a.args.len() != b.args.len() {
                    return Some(self.create());
                }
                self.unify_all(&a.args, &b.args, strategy)
            }
            _ => (x == y).then(|| self.create()),
        }
    }

    /// Unify argument pairs left to right. Each pair sees the substitutions found so far.
    fn unify_all(&self, xs: &[Type], ys: &[Type], strategy: &dyn Balancer) -> Option<Binding> {
        let mut acc = self.create();
        for (x, y) in xs.iter().zip(ys) {
            let step = self.unify(&acc.apply(x)?, &acc.apply(y)?, strategy)?;
            acc = acc.compose(&step)?;
        }
        Some(acc)
    }

    fn is_root(&self, ty: &Type) -> bool {
        matches!(ty, Type::Class(ClassType { def, .. }) if *def == self.env().well_known().object)
    }

    /// Joins of `x` and `y`, each with the binding that produced it.
    ///
    /// Unrelated classes yield one join per minimal common superclass, so the result may hold
    /// several incomparable candidates. `Bottom` is the identity.
    pub fn union(&self, x: &Type, y: &Type) -> Vec<(Type, Binding)> {
        let mut out = Vec::new();
        match (x, y) {
            (Type::Bottom, _) => out.push((y.clone(), self.create())),
            (_, Type::Bottom) => out.push((x.clone(), self.create())),
            _ if x == y => out.push((x.clone(), self.create())),
            (Type::Var(_) | Type::Wildcard(_), _) | (_, Type::Var(_) | Type::Wildcard(_)) => {
                out.extend(self.rise_to(x, y));
            }
            (Type::Array(a), Type::Array(b)) => {
                out.extend(
                    self.union(a, b)
                        .into_iter()
                        .map(|(component, binding)| (Type::array(component), binding)),
                );
                if out.is_empty() {
                    out.extend(self.array_join(None));
                }
            }
            (Type::Array(_), Type::Class(class)) | (Type::Class(class), Type::Array(_)) => {
                out.extend(self.array_join(Some(class)));
            }
            (Type::Class(a), Type::Class(b)) if a.def == b.def => {
                out.push(self.merge_same_class(x, y, a.def));
            }
            (Type::Class(a), Type::Class(b)) => {
                let env = self.env();
                for ancestor in least_upper_classes(env, a.def, b.def) {
                    let (Some(vx), Some(vy)) = (
                        instantiate_as_supertype(env, x, ancestor),
                        instantiate_as_supertype(env, y, ancestor),
                    ) else {
                        continue;
                    };
                    out.extend(self.union(&vx, &vy));
                }
            }
            _ => {}
        }
        dedup_by_type(out)
    }

    /// Meets of `x` and `y`, each with the binding that produced it.
    ///
    /// An array meets a class only when the class is one of the universal array supertypes;
    /// any other class has no common subtype with an array. More specific
    /// common subclasses are preferred over the root class. `Bottom` is the zero.
    pub fn intersect(&self, x: &Type, y: &Type) -> Vec<(Type, Binding)> {
        let mut out = Vec::new();
        match (x, y) {
            (Type::Bottom, _) | (_, Type::Bottom) => out.push((Type::Bottom, self.create())),
            _ if x == y => out.push((x.clone(), self.create())),
            (Type::Var(_) | Type::Wildcard(_), _) | (_, Type::Var(_) | Type::Wildcard(_)) => {
                out.extend(self.rise_to(x, y));
            }
            (Type::Array(a), Type::Array(b)) => {
                out.extend(
                    self.intersect(a, b)
                        .into_iter()
                        .map(|(component, binding)| (Type::array(component), binding)),
                );
            }
            (Type::Array(_), Type::Class(class)) | (Type::Class(class), Type::Array(_)) => {
                let array = if matches!(x, Type::Array(_)) { x } else { y };
                let universal = self.env().well_known().array_supertypes().contains(&class.def);
                if universal && class.args.is_empty() {
                    out.push((array.clone(), self.create()));
                }
            }
            (Type::Class(a), Type::Class(b)) if a.def == b.def => {
                out.push(self.merge_same_class(x, y, a.def));
            }
            (Type::Class(a), Type::Class(b)) => {
                let env = self.env();
                let object = env.well_known().object;
                let mut candidates = greatest_lower_classes(env, a.def, b.def);
                if candidates.len() > 1 {
                    candidates.retain(|c| *c != object);
                }
                for candidate in candidates {
                    let (Some(vx), Some(vy)) = (
                        instantiate_as_subtype(env, x, candidate),
                        instantiate_as_subtype(env, y, candidate),
                    ) else {
                        continue;
                    };
                    out.extend(self.intersect(&vx, &vy));
                }
            }
            _ => {}
        }
        dedup_by_type(out)
    }

    fn rise_to(&self, x: &Type, y: &Type) -> Option<(Type, Binding)> {
        let binding = self.rise(x, y)?;
        Some((binding.apply(x)?, binding))
    }

    /// Two instantiations of one declaration: reconcile the arguments, or fall back to the raw
    /// declaration.
    fn merge_same_class(&self, x: &Type, y: &Type, def: ClassId) -> (Type, Binding) {
        self.rise_to(x, y)
            .unwrap_or_else(|| (Type::class(def, vec![]), self.create()))
    }

    /// Minimal universal array supertypes, optionally restricted to those `class` inherits.
    fn array_join(&self, class: Option<&ClassType>) -> Vec<(Type, Binding)> {
        let env = self.env();
        let wk = env.well_known();
        let shared: Vec<_> = wk
            .array_supertypes()
            .into_iter()
            .filter(|sup| class.map_or(true, |c| is_subclass(env, c.def, *sup)))
            .collect();
        let minimal: Vec<_> = if shared.len() > 1 {
            shared.into_iter().filter(|c| *c != wk.object).collect()
        } else {
            shared
        };
        minimal
            .into_iter()
            .map(|sup| (Type::class(sup, vec![]), self.create()))
            .collect()
    }
}

fn dedup_by_type(candidates: Vec<(Type, Binding)>) -> Vec<(Type, Binding)> {
    let mut out: Vec<(Type, Binding)> = Vec::with_capacity(candidates.len());
    for (ty, binding) in candidates {
        if !out.iter().any(|(seen, _)| *seen == ty) {
            out.push((ty, binding));
        }
    }
    out
}

impl fmt::Debug for BindingFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingFactory")
            .field("variable_count", &self.shared.variable_count)
            .field("bound", &self.shared.bound)
            .finish_non_exhaustive()
    }
}
