use cook_types::{
    instantiate_as_subtype, instantiate_as_supertype, is_subclass, is_subtype, ClassDef,
    ClassKind, Type, TypeEnv, TypeStore,
};
use pretty_assertions::assert_eq;

#[test]
fn supertype_clauses_thread_parameters() {
    let mut store = TypeStore::with_minimal_jdk();
    let object = Type::class(store.well_known().object, vec![]);
    let string = Type::class(store.well_known().string, vec![]);
    let integer = Type::class(store.well_known().integer, vec![]);

    // class Pair<A, B>; class StringPair<X> extends Pair<String, X>
    let a = store.add_type_param("A", vec![object.clone()]);
    let b = store.add_type_param("B", vec![object.clone()]);
    let pair = store.add_simple_class("com.example.Pair", vec![a, b], None, vec![]);
    let x = store.add_type_param("X", vec![object]);
    let string_pair = store.add_simple_class(
        "com.example.StringPair",
        vec![x],
        Some(Type::class(pair, vec![string.clone(), Type::TypeParam(x)])),
        vec![],
    );

    let sp_integer = Type::class(string_pair, vec![integer.clone()]);
    let pair_string_integer = Type::class(pair, vec![string, integer.clone()]);
    assert_eq!(
        instantiate_as_supertype(&store, &sp_integer, pair),
        Some(pair_string_integer.clone())
    );
    assert_eq!(
        instantiate_as_subtype(&store, &pair_string_integer, string_pair),
        Some(sp_integer.clone())
    );
    assert!(is_subtype(&store, &sp_integer, &pair_string_integer));
}

#[test]
fn interned_classes_can_reference_themselves() {
    let mut store = TypeStore::with_minimal_jdk();
    let comparable = store.class_id("java.lang.Comparable").unwrap();
    let object = Type::class(store.well_known().object, vec![]);

    // class Version implements Comparable<Version>
    let version = store.intern_class_id("com.example.Version");
    store.define_class(
        version,
        ClassDef {
            name: "com.example.Version".to_string(),
            kind: ClassKind::Class,
            type_params: vec![],
            super_class: Some(object),
            interfaces: vec![Type::class(comparable, vec![Type::class(version, vec![])])],
        },
    );

    assert_eq!(store.lookup_class("com.example.Version"), Some(version));
    assert!(is_subclass(&store, version, comparable));
    assert!(is_subtype(
        &store,
        &Type::class(version, vec![]),
        &Type::class(comparable, vec![Type::class(version, vec![])])
    ));
}

#[test]
fn class_ids_are_listed_in_definition_order() {
    let mut store = TypeStore::new();
    let before = store.class_ids();
    let added = store.add_interface("com.example.Marker", vec![], vec![]);

    let after = store.class_ids();
    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(after.last(), Some(&added));
}
