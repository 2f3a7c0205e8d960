use std::collections::HashSet;
use std::fmt;

use cook_types::{format_type, is_subclass, ClassType, Type, TypeEnv, VarId, WildcardBound};

use crate::{ApplyError, BindingFactory};

/// Outcome of comparing two candidate solutions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Preference {
    Same,
    /// The left solution is more specific.
    Better,
    Worse,
    NonComparable,
}

impl Preference {
    pub fn reverse(self) -> Self {
        match self {
            Preference::Better => Preference::Worse,
            Preference::Worse => Preference::Better,
            other => other,
        }
    }

    /// Combine per-position results: the first non-`Same` result sets the direction and any
    /// disagreement afterwards is `NonComparable`.
    fn then(self, next: Preference) -> Preference {
        match (self, next) {
            (current, Preference::Same) => current,
            (Preference::Same, next) => next,
            (current, next) if current == next => current,
            _ => Preference::NonComparable,
        }
    }
}

/// A partial substitution from unification variables to type expressions.
///
/// Dense over the factory's variable count. Bindings are values: every operation that changes
/// the mapping returns a new binding.
#[derive(Clone)]
pub struct Binding {
    entries: Vec<Option<Type>>,
    cyclic: bool,
    factory: BindingFactory,
}

impl Binding {
    pub(crate) fn empty(factory: BindingFactory) -> Self {
        Self {
            entries: vec![None; factory.variable_count()],
            cyclic: false,
            factory,
        }
    }

    pub(crate) fn singleton(factory: BindingFactory, var: VarId, ty: Type) -> Self {
        let mut binding = Self::empty(factory);
        debug_assert!(
            var.index() < binding.entries.len(),
            "{var:?} outside a binding of {} variables",
            binding.entries.len()
        );
        if let Some(slot) = binding.entries.get_mut(var.index()) {
            binding.cyclic = ty.is_var();
            *slot = Some(ty);
        }
        binding
    }

    pub fn factory(&self) -> &BindingFactory {
        &self.factory
    }

    pub fn variable_count(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, index: usize) -> Option<&Type> {
        self.entries.get(index)?.as_ref()
    }

    pub fn is_bound(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// `true` when the most recently introduced entry maps a variable to another variable.
    pub fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    /// Defined entries in index order.
    pub fn entries(&self) -> impl Iterator<Item = (VarId, &Type)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| Some((VarId::from(idx), entry.as_ref()?)))
    }

    /// Rewrite `ty`, replacing bound variables by their values.
    pub fn try_apply(&self, ty: &Type) -> Result<Type, ApplyError> {
        self.rewrite(self.factory.env(), ty)
    }

    pub fn apply(&self, ty: &Type) -> Option<Type> {
        self.try_apply(ty).ok()
    }

    fn rewrite(&self, env: &dyn TypeEnv, ty: &Type) -> Result<Type, ApplyError> {
        let rewritten = match ty {
            Type::Var(var) => self.get(var.index()).cloned().unwrap_or(Type::Var(*var)),
            Type::Array(component) => Type::array(self.rewrite(env, component)?),
            Type::Class(ClassType { def, args }) => {
                if env.class(*def).is_none() {
                    return Err(ApplyError::UnknownClass(*def));
                }
                let args = args
                    .iter()
                    .map(|arg| self.rewrite(env, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                Type::class(*def, args)
            }
            Type::Wildcard(WildcardBound::Extends(bound)) => {
                Type::extends(self.rewrite_bound(env, bound)?)
            }
            Type::Wildcard(WildcardBound::Super(bound)) => {
                Type::super_of(self.rewrite_bound(env, bound)?)
            }
            Type::Wildcard(WildcardBound::Unbounded)
            | Type::Bottom
            | Type::Primitive(_)
            | Type::TypeParam(_) => ty.clone(),
        };
        Ok(rewritten)
    }

    fn rewrite_bound(&self, env: &dyn TypeEnv, bound: &Type) -> Result<Type, ApplyError> {
        match self.rewrite(env, bound)? {
            Type::Wildcard(_) => Err(ApplyError::NestedWildcard),
            ty => Ok(ty),
        }
    }

    /// Merge `other` (the newer substitution) into `self`.
    ///
    /// Entries defined on one side only are carried over, rewritten through the other side.
    /// Entries defined on both sides with different values are reconciled with
    /// [`BindingFactory::rise`]; if that fails the bindings are incompatible and `None` is
    /// returned. Rewriting failures are folded into `None`; use [`Binding::try_compose`] to
    /// tell them apart.
    pub fn compose(&self, other: &Binding) -> Option<Binding> {
        self.try_compose(other).ok().flatten()
    }

    /// Like [`Binding::compose`], but reports an entry that cannot be rewritten as an
    /// [`ApplyError`] instead of treating it as a conflict.
    pub fn try_compose(&self, other: &Binding) -> Result<Option<Binding>, ApplyError> {
        let count = self.entries.len().max(other.entries.len());
        let mut entries = Vec::with_capacity(count);
        for idx in 0..count {
            let mine = self.entries.get(idx).and_then(Option::as_ref);
            let theirs = other.entries.get(idx).and_then(Option::as_ref);
            let entry = match (mine, theirs) {
                (None, None) => None,
                (Some(ty), None) => Some(other.try_apply(ty)?),
                (None, Some(ty)) => Some(self.try_apply(ty)?),
                (Some(a), Some(b)) if a == b => Some(a.clone()),
                (Some(a), Some(b)) => match self.factory.rise(a, b) {
                    Some(risen) => Some(risen.try_apply(a)?),
                    None => return Ok(None),
                },
            };
            entries.push(entry);
        }

        Ok(Some(Binding {
            entries,
            cyclic: if other.is_empty() {
                self.cyclic
            } else {
                other.cyclic
            },
            factory: self.factory.clone(),
        }))
    }

    /// Break self-references among the reported variables.
    ///
    /// Every bound index whose value still reaches the index itself through the substitution
    /// is rebound to `Bottom`; every reported value is then rewritten once through the repaired
    /// binding.
    pub fn reduce_recursive(&self) -> Binding {
        let mut repaired = self.clone();
        for &idx in self.factory.bound() {
            let Some(value) = self.get(idx) else {
                continue;
            };
            let var = VarId::from(idx);
            if self.reaches(value, var, &mut HashSet::new()) {
                tracing::trace!(
                    target: cook_config::RESOLVER_TARGET,
                    var = idx,
                    "breaking recursive binding"
                );
                if let Some(slot) = repaired.entries.get_mut(idx) {
                    *slot = Some(Type::Bottom);
                }
            }
        }

        let mut out = repaired.clone();
        for &idx in self.factory.bound() {
            let Some(value) = repaired.get(idx) else {
                continue;
            };
            match repaired.try_apply(value) {
                Ok(rewritten) => {
                    if let Some(slot) = out.entries.get_mut(idx) {
                        *slot = Some(rewritten);
                    }
                }
                Err(err) => tracing::warn!(
                    target: cook_config::RESOLVER_TARGET,
                    var = idx,
                    %err,
                    "keeping unreduced value"
                ),
            }
        }
        out.cyclic = false;
        out
    }

    fn reaches(&self, ty: &Type, target: VarId, seen: &mut HashSet<VarId>) -> bool {
        ty.vars().into_iter().any(|var| {
            var == target
                || (seen.insert(var)
                    && self
                        .get(var.index())
                        .is_some_and(|next| self.reaches(next, target, seen)))
        })
    }

    /// Rank two solutions over the reported variables; `Better` means `self` is more specific.
    pub fn compare(&self, other: &Binding) -> Preference {
        let env = self.factory.env();
        let mut result = Preference::Same;
        for &idx in self.factory.bound() {
            let left = normalize(self.get(idx));
            let right = normalize(other.get(idx));
            result = result.then(compare_types(env, &left, &right));
            if result == Preference::NonComparable {
                break;
            }
        }
        result
    }
}

/// Leftover variables carry no information; a wildcard is ranked by its bound.
fn normalize(ty: Option<&Type>) -> Type {
    match ty {
        None | Some(Type::Var(_)) => Type::Bottom,
        Some(Type::Wildcard(bound)) => normalize(bound.bound()),
        Some(ty) => ty.clone(),
    }
}

fn tier(ty: &Type) -> u8 {
    match ty {
        Type::Bottom | Type::Var(_) | Type::Wildcard(_) => 0,
        Type::Primitive(_) => 1,
        Type::Array(_) => 2,
        Type::Class(_) => 3,
        Type::TypeParam(_) => 4,
    }
}

fn compare_types(env: &dyn TypeEnv, left: &Type, right: &Type) -> Preference {
    if left == right {
        return Preference::Same;
    }
    let (lt, rt) = (tier(left), tier(right));
    if lt != rt {
        return if lt > rt {
            Preference::Better
        } else {
            Preference::Worse
        };
    }

    match (left, right) {
        (Type::Array(a), Type::Array(b)) => {
            compare_types(env, &normalize(Some(a)), &normalize(Some(b)))
        }
        (Type::Class(a), Type::Class(b)) if a.def == b.def => {
            match (a.args.is_empty(), b.args.is_empty()) {
                (false, true) => return Preference::Better,
                (true, false) => return Preference::Worse,
                _ => {}
            }
            if a.args.len() != b.args.len() {
                return Preference::NonComparable;
            }
            a.args
                .iter()
                .zip(&b.args)
                .fold(Preference::Same, |acc, (x, y)| {
                    acc.then(compare_types(env, &normalize(Some(x)), &normalize(Some(y))))
                })
        }
        (Type::Class(a), Type::Class(b)) => {
            if is_subclass(env, a.def, b.def) {
                Preference::Better
            } else if is_subclass(env, b.def, a.def) {
                Preference::Worse
            } else {
                Preference::NonComparable
            }
        }
        _ => Preference::NonComparable,
    }
}

impl PartialEq for Binding {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Binding {}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries().map(|(var, ty)| (var.0, ty)))
            .finish()
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let env = self.factory.env();
        f.write_str("{")?;
        for (idx, (var, ty)) in self.entries().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "'{} -> {}", var.0, format_type(env, ty))?;
        }
        f.write_str("}")
    }
}
