use std::sync::Arc;

use cook_config::ResolverConfig;
use cook_resolve::{Binding, BindingFactory, Constraint, ConstraintSystem, ResolverTree};
use cook_types::{PrimitiveType, Type, VarId};
use proptest::prelude::*;

use super::{class, jdk};

const PROPTEST_CASES: u32 = 128;
const VARS: usize = 3;

fn ground_pool() -> Vec<Type> {
    let store = jdk();
    let string = class(&store, "java.lang.String", vec![]);
    let number = class(&store, "java.lang.Number", vec![]);
    vec![
        Type::Bottom,
        Type::Primitive(PrimitiveType::Int),
        string.clone(),
        class(&store, "java.lang.Integer", vec![]),
        number.clone(),
        class(&store, "java.lang.Object", vec![]),
        class(&store, "java.util.List", vec![]),
        class(&store, "java.util.List", vec![string.clone()]),
        class(&store, "java.util.List", vec![Type::extends(number)]),
        class(&store, "java.util.ArrayList", vec![string.clone()]),
        Type::array(Type::Primitive(PrimitiveType::Int)),
        Type::array(string),
    ]
}

fn open_pool() -> Vec<Type> {
    let store = jdk();
    let mut pool = ground_pool();
    pool.extend([
        Type::var(0),
        Type::var(1),
        Type::var(2),
        class(&store, "java.util.List", vec![Type::var(1)]),
        class(&store, "java.util.ArrayList", vec![Type::var(2)]),
        Type::array(Type::var(0)),
    ]);
    pool
}

fn arb_entries(pool: Vec<Type>) -> impl Strategy<Value = Vec<Option<Type>>> {
    prop::collection::vec(prop::option::of(prop::sample::select(pool)), VARS)
}

fn arb_constraint() -> impl Strategy<Value = Constraint> {
    (
        prop::sample::select(open_pool()),
        prop::sample::select(open_pool()),
    )
        .prop_map(|(left, right)| Constraint::new(left, right))
}

fn factory() -> BindingFactory {
    BindingFactory::new(VARS, 0..VARS, Arc::new(jdk()))
}

fn build(factory: &BindingFactory, entries: &[Option<Type>]) -> Option<Binding> {
    let mut binding = factory.create();
    for (idx, entry) in entries.iter().enumerate() {
        if let Some(ty) = entry {
            binding = binding.compose(&factory.create_singleton(VarId::from(idx), ty.clone()))?;
        }
    }
    Some(binding)
}

proptest! {
    #![proptest_config(ProptestConfig { cases: PROPTEST_CASES, .. ProptestConfig::default() })]

    #[test]
    fn composing_with_the_empty_binding_is_identity(entries in arb_entries(open_pool())) {
        let factory = factory();
        let Some(binding) = build(&factory, &entries) else {
            return Ok(());
        };
        let empty = factory.create();

        prop_assert_eq!(binding.compose(&empty), Some(binding.clone()));
        prop_assert_eq!(empty.compose(&binding), Some(binding.clone()));
    }

    #[test]
    fn compare_is_reflexive_and_antisymmetric(
        left in arb_entries(ground_pool()),
        right in arb_entries(ground_pool()),
    ) {
        let factory = factory();
        let (Some(a), Some(b)) = (build(&factory, &left), build(&factory, &right)) else {
            return Ok(());
        };

        prop_assert_eq!(a.compare(&a), cook_resolve::Preference::Same);
        prop_assert_eq!(a.compare(&b), b.compare(&a).reverse());
    }

    #[test]
    fn reduced_solutions_never_reference_themselves(
        constraints in prop::collection::vec(arb_constraint(), 0..4),
    ) {
        let system = ConstraintSystem::new(VARS, 0..VARS, constraints).unwrap();
        let factory = BindingFactory::for_system(&system, Arc::new(jdk()));
        let mut tree = ResolverTree::new(system, factory).with_config(ResolverConfig {
            reduce_solutions: true,
            ..ResolverConfig::default()
        });

        for solution in tree.resolve().unwrap() {
            for idx in 0..VARS {
                let var = VarId::from(idx);
                let applied = solution.apply(&Type::Var(var)).unwrap();
                prop_assert!(
                    applied == Type::Var(var) || !applied.mentions_var(var),
                    "'{} -> {:?} in {}",
                    idx,
                    applied,
                    solution
                );
            }
        }
    }
}

#[test]
fn rise_and_sink_of_equal_ground_types_bind_nothing() {
    let factory = factory();
    for ty in ground_pool() {
        let risen = factory.rise(&ty, &ty);
        let sunk = factory.sink(&ty, &ty);
        assert!(risen.as_ref().is_some_and(Binding::is_empty), "rise {ty:?}");
        assert!(sunk.as_ref().is_some_and(Binding::is_empty), "sink {ty:?}");
    }
}

#[test]
fn solutions_satisfy_the_ground_constraints_they_consumed() {
    let store = jdk();
    let string = class(&store, "java.lang.String", vec![]);
    let integer = class(&store, "java.lang.Integer", vec![]);
    let systems = vec![
        vec![
            Constraint::new(
                class(&store, "java.util.ArrayList", vec![Type::var(0)]),
                class(&store, "java.util.List", vec![Type::var(1)]),
            ),
            Constraint::new(string.clone(), Type::var(1)),
        ],
        vec![
            Constraint::new(
                class(&store, "java.util.HashMap", vec![string.clone(), Type::var(0)]),
                class(&store, "java.util.Map", vec![Type::var(1), integer.clone()]),
            ),
            Constraint::new(Type::var(2), class(&store, "java.lang.Number", vec![])),
        ],
        vec![
            Constraint::new(Type::array(Type::var(0)), Type::array(integer)),
            Constraint::new(string, Type::var(2)),
        ],
    ];

    for constraints in systems {
        let ground: Vec<Constraint> =
            constraints.iter().filter(|c| c.is_ground()).cloned().collect();
        let system = ConstraintSystem::new(VARS, 0..VARS, constraints).unwrap();
        let factory = BindingFactory::for_system(&system, Arc::new(jdk()));
        let solutions = ResolverTree::new(system, factory.clone()).resolve().unwrap();
        assert!(!solutions.is_empty());

        for solution in &solutions {
            for constraint in &ground {
                let left = solution.apply(&constraint.left).unwrap();
                let right = solution.apply(&constraint.right).unwrap();
                assert!(
                    factory.rise(&left, &right).is_some() || factory.sink(&left, &right).is_some(),
                    "{solution} violates {}",
                    constraint.display(factory.env())
                );
            }
        }
    }
}
