use cook_types::{is_subtype, Type, TypeEnv, TypeStore};

fn class(env: &TypeStore, name: &str, args: Vec<Type>) -> Type {
    let id = env
        .class_id(name)
        .unwrap_or_else(|| panic!("{name} must exist in minimal JDK"));
    Type::class(id, args)
}

#[test]
fn minimal_jdk_interfaces_are_subtypes_of_object() {
    let env = TypeStore::with_minimal_jdk();
    let object = Type::class(env.well_known().object, vec![]);
    let string = Type::class(env.well_known().string, vec![]);

    let list_string = class(&env, "java.util.List", vec![string]);
    assert!(is_subtype(&env, &list_string, &object));

    let cloneable = Type::class(env.well_known().cloneable, vec![]);
    assert!(is_subtype(&env, &cloneable, &object));
}

#[test]
fn type_arguments_are_invariant_unless_wildcarded() {
    let env = TypeStore::with_minimal_jdk();
    let integer = Type::class(env.well_known().integer, vec![]);
    let number = class(&env, "java.lang.Number", vec![]);

    let list_integer = class(&env, "java.util.List", vec![integer.clone()]);
    let list_number = class(&env, "java.util.List", vec![number.clone()]);
    let list_extends_number = class(&env, "java.util.List", vec![Type::extends(number.clone())]);
    let list_super_integer = class(&env, "java.util.List", vec![Type::super_of(integer.clone())]);
    let list_number_again = class(&env, "java.util.List", vec![number]);

    assert!(!is_subtype(&env, &list_integer, &list_number));
    assert!(is_subtype(&env, &list_integer, &list_extends_number));
    assert!(is_subtype(&env, &list_number_again, &list_super_integer));
    assert!(!is_subtype(&env, &list_extends_number, &list_integer));
}

#[test]
fn raw_types_are_compatible_with_instantiations() {
    let env = TypeStore::with_minimal_jdk();
    let string = Type::class(env.well_known().string, vec![]);

    let raw_array_list = class(&env, "java.util.ArrayList", vec![]);
    let list_string = class(&env, "java.util.List", vec![string.clone()]);
    let collection_string = class(&env, "java.util.Collection", vec![string.clone()]);
    let array_list_string = class(&env, "java.util.ArrayList", vec![string]);

    assert!(is_subtype(&env, &raw_array_list, &list_string));
    assert!(is_subtype(&env, &array_list_string, &collection_string));
    assert!(is_subtype(&env, &array_list_string, &class(&env, "java.util.List", vec![])));
}

#[test]
fn boxed_numbers_compare_to_themselves() {
    let env = TypeStore::with_minimal_jdk();
    let integer = Type::class(env.well_known().integer, vec![]);
    let long = class(&env, "java.lang.Long", vec![]);

    let comparable_integer = class(&env, "java.lang.Comparable", vec![integer.clone()]);
    assert!(is_subtype(&env, &integer, &comparable_integer));
    assert!(!is_subtype(&env, &long, &comparable_integer));
    assert!(is_subtype(&env, &Type::Bottom, &comparable_integer));
}
