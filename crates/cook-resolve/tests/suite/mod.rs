use std::sync::Arc;

use cook_config::LoggingConfig;
use cook_resolve::{BindingFactory, Constraint, ConstraintSystem, ResolverTree};
use cook_types::{ClassId, Type, TypeStore};

mod properties;
mod scenarios;

/// Route resolver events through the subscriber so formatting of spans and fields is exercised.
pub(crate) fn init_logging() {
    cook_config::init_tracing(&LoggingConfig {
        level: "cook.resolve=trace".to_string(),
        json: false,
        stderr: true,
    });
}

pub(crate) fn jdk() -> TypeStore {
    TypeStore::with_minimal_jdk()
}

pub(crate) fn class(store: &TypeStore, name: &str, args: Vec<Type>) -> Type {
    Type::class(lookup(store, name), args)
}

pub(crate) fn lookup(store: &TypeStore, name: &str) -> ClassId {
    store
        .class_id(name)
        .unwrap_or_else(|| panic!("{name} should be defined"))
}

pub(crate) fn tree(store: TypeStore, count: usize, constraints: Vec<Constraint>) -> ResolverTree {
    let system = ConstraintSystem::new(count, 0..count, constraints).unwrap();
    let factory = BindingFactory::for_system(&system, Arc::new(store));
    ResolverTree::new(system, factory)
}
