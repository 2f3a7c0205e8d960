//! Deductive type-binding resolver for generifying raw types.
//!
//! Given a [`ConstraintSystem`] of subtyping constraints over type expressions with
//! unification variables, [`ResolverTree`] searches for every [`Binding`] under which the
//! constraints can be discharged. Candidate bindings come from [`BindingFactory`], which
//! implements the lattice algebra (`rise`, `sink`, `union`, `intersect`) on top of a
//! [`cook_types::TypeEnv`].
//!
//! ```
//! use std::sync::Arc;
//!
//! use cook_resolve::{resolve, Constraint, ConstraintSystem};
//! use cook_types::{Type, TypeEnv, TypeStore};
//!
//! let store = TypeStore::with_minimal_jdk();
//! let string = Type::class(store.well_known().string, vec![]);
//! let system = ConstraintSystem::new(1, [0], [Constraint::new(string.clone(), Type::var(0))])
//!     .unwrap();
//!
//! let solutions = resolve(system, Arc::new(store)).unwrap();
//! assert_eq!(solutions[0].get(0), Some(&string));
//! assert_eq!(solutions[1].get(0), Some(&Type::Bottom));
//! ```

use std::sync::Arc;

use cook_types::TypeEnv;

mod binding;
mod cancel;
mod constraint;
mod error;
mod factory;
mod tree;

pub use binding::{Binding, Preference};
pub use cancel::CancellationToken;
pub use constraint::{Constraint, ConstraintSet, ConstraintSystem};
pub use error::{ApplyError, ResolveError};
pub use factory::{Balancer, BindingFactory, Rise, Sink};
pub use tree::{NodeState, ResolverTree};

/// Resolve `system` against `env` with the default settings.
pub fn resolve(
    system: ConstraintSystem,
    env: Arc<dyn TypeEnv + Send + Sync>,
) -> Result<Vec<Binding>, ResolveError> {
    let factory = BindingFactory::for_system(&system, env);
    ResolverTree::new(system, factory).resolve()
}
