//! Class-hierarchy queries: subclassing, supertype/subtype translation, joins and meets of
//! declarations, and subtyping between type expressions.
//!
//! Every query is best-effort: missing class metadata never panics, it simply makes the
//! relation fail (`false` / `None` / no candidates).

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{substitute, ClassId, ClassType, Type, TypeEnv, TypeParamId, WildcardBound};

/// Direct supertypes of an instantiation, with the instantiation's arguments substituted into
/// the declared supertype clauses. Raw instantiations yield raw supertypes.
fn direct_supertypes(env: &dyn TypeEnv, def: ClassId, args: &[Type]) -> Vec<Type> {
    let Some(class_def) = env.class(def) else {
        return Vec::new();
    };
    let object = env.well_known().object;

    let raw = args.is_empty() && !class_def.type_params.is_empty();
    let mut subst: HashMap<TypeParamId, Type> =
        HashMap::with_capacity(class_def.type_params.len());
    for (idx, formal) in class_def.type_params.iter().copied().enumerate() {
        subst.insert(formal, args.get(idx).cloned().unwrap_or(Type::Bottom));
    }

    let translate = |ty: &Type| -> Option<Type> {
        match ty {
            Type::Class(ClassType { def, .. }) if raw => Some(Type::class(*def, vec![])),
            Type::Class(_) => Some(substitute(ty, &subst)),
            _ => None,
        }
    };

    let mut out = Vec::new();
    // Classes without a declared superclass (interfaces included) sit directly below `Object`.
    match &class_def.super_class {
        Some(sc) => out.extend(translate(sc)),
        None if def != object => out.push(Type::class(object, vec![])),
        None => {}
    }
    out.extend(class_def.interfaces.iter().filter_map(translate));
    out
}

fn is_class(ty: &Type, id: ClassId) -> bool {
    matches!(ty, Type::Class(ClassType { def, .. }) if *def == id)
}

/// All superclasses of `def` (including `def`), nearest first.
fn superclasses(env: &dyn TypeEnv, def: ClassId) -> Vec<ClassId> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::from([def]);
    while let Some(current) = queue.pop_front() {
        if !seen.insert(current) {
            continue;
        }
        out.push(current);
        for sup in direct_supertypes(env, current, &[]) {
            if let Type::Class(ClassType { def, .. }) = sup {
                queue.push_back(def);
            }
        }
    }
    out
}

/// `true` when `sub` is `sup` or inherits from it, directly or transitively.
pub fn is_subclass(env: &dyn TypeEnv, sub: ClassId, sup: ClassId) -> bool {
    if sub == sup {
        return true;
    }
    if sup == env.well_known().object {
        return env.class(sub).is_some();
    }
    superclasses(env, sub).contains(&sup)
}

/// Return `ty` viewed as `target` by walking the supertype graph and applying type argument
/// substitution along the way.
///
/// Example: `ArrayList<String>` instantiated as `List` returns `List<String>`; a raw
/// `ArrayList` yields a raw `List`. Arrays can be viewed as any of the universal array
/// supertypes.
pub fn instantiate_as_supertype(env: &dyn TypeEnv, ty: &Type, target: ClassId) -> Option<Type> {
    let (def, args) = match ty {
        Type::Array(_) => {
            return env
                .well_known()
                .array_supertypes()
                .contains(&target)
                .then(|| Type::class(target, vec![]));
        }
        Type::Class(ClassType { def, args }) => (*def, args.clone()),
        _ => return None,
    };

    let mut queue: VecDeque<Type> = VecDeque::new();
    let mut seen: HashSet<(ClassId, Vec<Type>)> = HashSet::new();
    queue.push_back(Type::class(def, args));

    while let Some(current) = queue.pop_front() {
        let Type::Class(ClassType { def, args }) = &current else {
            continue;
        };
        if !seen.insert((*def, args.clone())) {
            continue;
        }
        if *def == target {
            return Some(current);
        }
        queue.extend(direct_supertypes(env, *def, args));
    }

    None
}

/// Instantiate the subclass `target` so that viewing it as `ty`'s class reproduces `ty`'s type
/// arguments.
///
/// Formal parameters of `target` that do not flow into `ty`'s class are instantiated with
/// [`Type::Bottom`]. A raw `ty` yields a raw `target`. Returns `None` if `target` is not a
/// subclass of `ty`'s class.
pub fn instantiate_as_subtype(env: &dyn TypeEnv, ty: &Type, target: ClassId) -> Option<Type> {
    let Type::Class(ClassType { def, args }) = ty else {
        return None;
    };
    if !is_subclass(env, target, *def) {
        return None;
    }
    let target_def = env.class(target)?;
    if args.is_empty() || target_def.type_params.is_empty() {
        return Some(Type::class(target, vec![]));
    }

    let formals: Vec<Type> = target_def
        .type_params
        .iter()
        .map(|p| Type::TypeParam(*p))
        .collect();
    let viewed = instantiate_as_supertype(env, &Type::class(target, formals), *def)?;
    let Type::Class(ClassType { args: viewed_args, .. }) = viewed else {
        return None;
    };

    let mut assigned: HashMap<TypeParamId, Type> = HashMap::new();
    for (formal, actual) in viewed_args.iter().zip(args) {
        if let Type::TypeParam(p) = formal {
            assigned.entry(*p).or_insert_with(|| actual.clone());
        }
    }

    let new_args = target_def
        .type_params
        .iter()
        .map(|p| assigned.get(p).cloned().unwrap_or(Type::Bottom))
        .collect();
    Some(Type::class(target, new_args))
}

/// Minimal common superclasses of `a` and `b`.
///
/// For known classes the result is never empty because the hierarchy root is common to all
/// classes. The order follows `a`'s supertype walk, nearest first.
pub fn least_upper_classes(env: &dyn TypeEnv, a: ClassId, b: ClassId) -> Vec<ClassId> {
    if is_subclass(env, a, b) {
        return vec![b];
    }
    if is_subclass(env, b, a) {
        return vec![a];
    }

    let b_supers: HashSet<ClassId> = superclasses(env, b).into_iter().collect();
    let common: Vec<ClassId> = superclasses(env, a)
        .into_iter()
        .filter(|c| b_supers.contains(c))
        .collect();

    let minimal: Vec<ClassId> = common
        .iter()
        .copied()
        .filter(|c| {
            !common
                .iter()
                .any(|other| other != c && is_subclass(env, *other, *c))
        })
        .collect();

    if minimal.is_empty() {
        vec![env.well_known().object]
    } else {
        minimal
    }
}

/// Maximal classes inheriting from both `a` and `b`.
///
/// If one class inherits from the other, the more specific one is the only result. Otherwise
/// every declared class is considered; the result may be empty.
pub fn greatest_lower_classes(env: &dyn TypeEnv, a: ClassId, b: ClassId) -> Vec<ClassId> {
    if is_subclass(env, a, b) {
        return vec![a];
    }
    if is_subclass(env, b, a) {
        return vec![b];
    }

    let common: Vec<ClassId> = env
        .class_ids()
        .into_iter()
        .filter(|c| is_subclass(env, *c, a) && is_subclass(env, *c, b))
        .collect();

    common
        .iter()
        .copied()
        .filter(|c| {
            !common
                .iter()
                .any(|other| other != c && is_subclass(env, *c, *other))
        })
        .collect()
}

/// Java-like subtyping over type expressions.
///
/// `Bottom` is below everything, arrays are covariant for reference components and below the
/// universal array supertypes, raw types are compatible with every instantiation, and type
/// arguments are compared by containment. Unification variables are only related to
/// themselves.
pub fn is_subtype(env: &dyn TypeEnv, sub: &Type, sup: &Type) -> bool {
    if sub == sup {
        return true;
    }
    match (sub, sup) {
        (Type::Bottom, _) => true,
        (_, Type::Bottom) => false,
        (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
        (Type::Array(a), Type::Array(b)) => {
            let primitive = matches!(**a, Type::Primitive(_)) || matches!(**b, Type::Primitive(_));
            !primitive && is_subtype(env, a, b)
        }
        (Type::Array(_), Type::Class(ClassType { def, args })) => {
            args.is_empty() && env.well_known().array_supertypes().contains(def)
        }
        (Type::Class(_), Type::Class(ClassType { def, args })) => {
            let Some(Type::Class(view)) = instantiate_as_supertype(env, sub, *def) else {
                return false;
            };
            if args.is_empty() || view.args.is_empty() {
                return true;
            }
            args.len() == view.args.len()
                && args
                    .iter()
                    .zip(&view.args)
                    .all(|(outer, inner)| contains(env, outer, inner))
        }
        (Type::Wildcard(WildcardBound::Extends(bound)), _) => is_subtype(env, bound, sup),
        (Type::Wildcard(_), Type::Class(ClassType { def, .. })) => {
            *def == env.well_known().object
        }
        (Type::TypeParam(id), _) => env
            .type_param(*id)
            .map(|tp| tp.upper_bounds.iter().any(|b| is_subtype(env, b, sup)))
            .unwrap_or(false),
        _ => false,
    }
}

/// Type-argument containment (`inner` fits in the argument position described by `outer`).
fn contains(env: &dyn TypeEnv, outer: &Type, inner: &Type) -> bool {
    if outer == inner || inner.is_bottom() || outer.is_bottom() {
        return true;
    }
    match (outer, inner) {
        (Type::Wildcard(WildcardBound::Unbounded), _) => true,
        (
            Type::Wildcard(WildcardBound::Extends(bound)),
            Type::Wildcard(WildcardBound::Extends(inner_bound)),
        ) => is_subtype(env, inner_bound, bound),
        (Type::Wildcard(WildcardBound::Extends(bound)), Type::Wildcard(_)) => {
            is_class(bound, env.well_known().object)
        }
        (Type::Wildcard(WildcardBound::Extends(bound)), _) => is_subtype(env, inner, bound),
        (
            Type::Wildcard(WildcardBound::Super(bound)),
            Type::Wildcard(WildcardBound::Super(inner_bound)),
        ) => is_subtype(env, bound, inner_bound),
        (Type::Wildcard(WildcardBound::Super(_)), Type::Wildcard(_)) => false,
        (Type::Wildcard(WildcardBound::Super(bound)), _) => is_subtype(env, bound, inner),
        _ => false,
    }
}
