use std::sync::Arc;

use cook_config::ResolverConfig;
use cook_resolve::{
    resolve, CancellationToken, Constraint, ConstraintSystem, NodeState, Preference, ResolveError,
};
use cook_types::{PrimitiveType, Type, TypeEnv, TypeStore};
use pretty_assertions::assert_eq;

use super::{class, init_logging, jdk, tree};

#[test]
fn lone_lower_bound_yields_rise_and_sink_solutions() {
    init_logging();
    let mut store = TypeStore::new();
    let a = store.add_simple_class("com.example.ClassA", vec![], None, vec![]);
    let class_a = Type::class(a, vec![]);

    let mut tree = tree(store, 1, vec![Constraint::new(class_a.clone(), Type::var(0))]);
    let solutions = tree.resolve().unwrap();

    let values: Vec<_> = solutions.iter().map(|s| s.get(0).cloned()).collect();
    assert_eq!(values, vec![Some(class_a), Some(Type::Bottom)]);
}

#[test]
fn unrelated_lower_bounds_join_at_the_root() {
    init_logging();
    let mut store = TypeStore::new();
    let a = store.add_simple_class("com.example.A", vec![], None, vec![]);
    let b = store.add_simple_class("com.example.B", vec![], None, vec![]);
    let object = Type::class(store.well_known().object, vec![]);

    let mut tree = tree(
        store,
        1,
        vec![
            Constraint::new(Type::class(a, vec![]), Type::var(0)),
            Constraint::new(Type::class(b, vec![]), Type::var(0)),
        ],
    );
    let solutions = tree.resolve().unwrap();

    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].get(0), Some(&object));
}

#[test]
fn empty_system_has_the_empty_solution() {
    let mut tree = tree(jdk(), 3, vec![]);
    let solutions = tree.resolve().unwrap();

    assert_eq!(solutions.len(), 1);
    assert!(solutions[0].is_empty());
    assert_eq!(tree.node_count(), 1);
}

#[test]
fn contradictory_constraint_has_no_solution() {
    let mut store = TypeStore::new();
    let b = store.add_simple_class("com.example.ClassB", vec![], None, vec![]);
    let int_array = Type::array(Type::Primitive(PrimitiveType::Int));

    let mut tree = tree(store, 0, vec![Constraint::new(int_array, Type::class(b, vec![]))]);
    assert!(tree.resolve().unwrap().is_empty());
    assert_eq!(tree.root_state(), NodeState::Dead);
}

#[test]
fn generify_list_assignment() {
    init_logging();
    // List raw = new ArrayList<String>(); raw.add(s)
    let store = jdk();
    let string = class(&store, "java.lang.String", vec![]);
    let array_list = class(&store, "java.util.ArrayList", vec![string.clone()]);
    let list = class(&store, "java.util.List", vec![Type::var(0)]);

    let mut tree = tree(
        store,
        1,
        vec![
            Constraint::new(array_list, list),
            Constraint::new(string.clone(), Type::var(0)),
        ],
    );
    let solutions = tree.resolve().unwrap();

    let values: Vec<_> = solutions.iter().map(|s| s.get(0).cloned()).collect();
    assert_eq!(values, vec![Some(string), Some(Type::Bottom)]);
    assert_eq!(solutions[0].compare(&solutions[1]), Preference::Better);
}

#[test]
fn several_upper_bounds_branch_per_meet() {
    let store = jdk();
    let string = class(&store, "java.lang.String", vec![]);
    let list = class(&store, "java.util.List", vec![string.clone()]);
    let cloneable = class(&store, "java.lang.Cloneable", vec![]);
    let array_list = class(&store, "java.util.ArrayList", vec![string.clone()]);
    let linked_list = class(&store, "java.util.LinkedList", vec![string]);

    let mut tree = tree(
        store,
        1,
        vec![
            Constraint::new(Type::var(0), list),
            Constraint::new(Type::var(0), cloneable),
        ],
    );
    let values: Vec<_> = tree
        .resolve()
        .unwrap()
        .iter()
        .map(|s| s.get(0).cloned())
        .collect();

    assert_eq!(values, vec![Some(array_list), Some(linked_list)]);
}

#[test]
fn max_solutions_stops_the_search() {
    let store = jdk();
    let string = class(&store, "java.lang.String", vec![]);
    let mut tree = tree(store, 1, vec![Constraint::new(string.clone(), Type::var(0))]).with_config(
        ResolverConfig {
            max_solutions: Some(1),
            ..ResolverConfig::default()
        },
    );

    let solutions = tree.resolve().unwrap();
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0].get(0), Some(&string));
}

#[test]
fn cancelled_token_aborts_resolution() {
    let store = jdk();
    let string = class(&store, "java.lang.String", vec![]);
    let token = CancellationToken::new();
    let mut tree = tree(store, 1, vec![Constraint::new(string, Type::var(0))])
        .with_cancellation(token.clone());

    token.cancel();
    assert_eq!(tree.resolve(), Err(ResolveError::Cancelled));
}

#[test]
fn unknown_classes_are_reported() {
    let store = jdk();
    let bogus = Type::class(cook_types::ClassId::from_raw(9_999), vec![]);
    let system = ConstraintSystem::new(
        2,
        [0, 1],
        [
            Constraint::new(Type::var(1), Type::var(0)),
            Constraint::new(bogus, Type::var(0)),
        ],
    )
    .unwrap();

    let err = resolve(system, Arc::new(store)).unwrap_err();
    assert!(matches!(err, ResolveError::UnknownClass(_)), "{err}");
}

#[test]
fn unknown_class_as_the_only_lower_bound_is_reported() {
    let store = jdk();
    let unknown = cook_types::ClassId::from_raw(9_999);
    let system = ConstraintSystem::new(
        1,
        [0],
        [Constraint::new(Type::class(unknown, vec![]), Type::var(0))],
    )
    .unwrap();

    let err = resolve(system, Arc::new(store)).unwrap_err();
    assert_eq!(err, ResolveError::UnknownClass(unknown));
}
