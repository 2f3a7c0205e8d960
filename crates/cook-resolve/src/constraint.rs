use std::collections::BTreeSet;
use std::fmt;

use cook_types::{format_type, Type, TypeEnv, VarId};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::{ApplyError, Binding, ResolveError};

/// `left <: right`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    pub left: Type,
    pub right: Type,
}

impl Constraint {
    pub fn new(left: Type, right: Type) -> Self {
        Self { left, right }
    }

    /// Neither side is a bare variable (nested variables are allowed).
    pub fn is_ground(&self) -> bool {
        !self.left.is_var() && !self.right.is_var()
    }

    /// Trivially satisfied: both sides are identical, or the left side is `Bottom`.
    pub fn is_discharged(&self) -> bool {
        self.left == self.right || self.left.is_bottom()
    }

    pub fn display<'a>(&'a self, env: &'a dyn TypeEnv) -> impl fmt::Display + 'a {
        DisplayConstraint {
            constraint: self,
            env,
        }
    }
}

struct DisplayConstraint<'a> {
    constraint: &'a Constraint,
    env: &'a dyn TypeEnv,
}

impl fmt::Display for DisplayConstraint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} <: {}",
            format_type(self.env, &self.constraint.left),
            format_type(self.env, &self.constraint.right)
        )
    }
}

/// Insertion-ordered set of constraints. Discharged constraints are dropped on insertion, so
/// the set shrinks as substitutions make sides equal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    constraints: IndexSet<Constraint>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the constraint was discharged or already present.
    pub fn insert(&mut self, constraint: Constraint) -> bool {
        if constraint.is_discharged() {
            return false;
        }
        self.constraints.insert(constraint)
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Constraint> {
        self.constraints.get_index(index)
    }

    /// First constraint without a bare variable on either side.
    pub fn first_ground(&self) -> Option<(usize, &Constraint)> {
        self.constraints.iter().enumerate().find(|(_, c)| c.is_ground())
    }

    /// Rewrite every constraint through `binding`, leaving out the one at `skip`.
    pub fn substitute(
        &self,
        binding: &Binding,
        skip: Option<usize>,
    ) -> Result<ConstraintSet, ApplyError> {
        let mut out = ConstraintSet::new();
        for (idx, constraint) in self.constraints.iter().enumerate() {
            if Some(idx) == skip {
                continue;
            }
            out.insert(Constraint::new(
                binding.try_apply(&constraint.left)?,
                binding.try_apply(&constraint.right)?,
            ));
        }
        Ok(out)
    }

    fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.constraints
            .iter()
            .flat_map(|c| c.left.vars().into_iter().chain(c.right.vars()))
    }
}

impl FromIterator<Constraint> for ConstraintSet {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        let mut set = ConstraintSet::new();
        for constraint in iter {
            set.insert(constraint);
        }
        set
    }
}

/// Resolver input: the variable count, the variables whose values are reported, and the
/// constraints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SystemData", into = "SystemData")]
pub struct ConstraintSystem {
    variable_count: usize,
    bound: BTreeSet<usize>,
    constraints: ConstraintSet,
}

impl ConstraintSystem {
    /// Validates that every variable mentioned by the constraints, and every bound index, is
    /// below `variable_count`.
    pub fn new(
        variable_count: usize,
        bound: impl IntoIterator<Item = usize>,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Result<Self, ResolveError> {
        let system = Self {
            variable_count,
            bound: bound.into_iter().collect(),
            constraints: constraints.into_iter().collect(),
        };

        let out_of_range = system
            .bound
            .iter()
            .copied()
            .chain(system.constraints.vars().map(VarId::index))
            .find(|index| *index >= variable_count);
        match out_of_range {
            Some(index) => Err(ResolveError::VariableOutOfRange {
                index,
                count: variable_count,
            }),
            None => Ok(system),
        }
    }

    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    pub fn bound(&self) -> &BTreeSet<usize> {
        &self.bound
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub(crate) fn into_constraints(self) -> ConstraintSet {
        self.constraints
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SystemData {
    variable_count: usize,
    #[serde(default)]
    bound: BTreeSet<usize>,
    #[serde(default)]
    constraints: Vec<Constraint>,
}

impl TryFrom<SystemData> for ConstraintSystem {
    type Error = ResolveError;

    fn try_from(data: SystemData) -> Result<Self, Self::Error> {
        ConstraintSystem::new(data.variable_count, data.bound, data.constraints)
    }
}

impl From<ConstraintSystem> for SystemData {
    fn from(system: ConstraintSystem) -> Self {
        SystemData {
            variable_count: system.variable_count,
            bound: system.bound,
            constraints: system.constraints.constraints.into_iter().collect(),
        }
    }
}
