//! Branching search over constraint systems.
//!
//! Every node holds the constraints that remain after the substitutions chosen on its path,
//! together with the composition of those substitutions. Expansion picks one reduction rule:
//!
//! 1. a constraint without bare variables is reduced with both `rise` and `sink`;
//! 2. otherwise, a variable with several lower (upper) bounds is bound to each of their joins
//!    (meets);
//! 3. otherwise, the first remaining constraint is reduced with `rise` and `sink`.
//!
//! A node with no constraints left is a solution.

use std::collections::BTreeMap;

use cook_config::{ResolverConfig, RESOLVER_TARGET};
use cook_types::{Type, VarId};

use crate::{
    ApplyError, Binding, BindingFactory, CancellationToken, Constraint, ConstraintSet,
    ConstraintSystem, ResolveError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    Unexpanded,
    Solved,
    Expanded,
    Dead,
}

#[derive(Debug)]
struct Node {
    constraints: ConstraintSet,
    binding: Binding,
    depth: usize,
    state: NodeState,
    children: Vec<Node>,
}

impl Node {
    fn new(constraints: ConstraintSet, binding: Binding, depth: usize) -> Self {
        Self {
            constraints,
            binding,
            depth,
            state: NodeState::Unexpanded,
            children: Vec::new(),
        }
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }
}

/// A candidate substitution for one expansion, with the constraint it discharges (if any).
struct Step {
    consumed: Option<usize>,
    binding: Binding,
}

#[derive(Debug)]
pub struct ResolverTree {
    factory: BindingFactory,
    config: ResolverConfig,
    cancel: Option<CancellationToken>,
    root: Node,
}

impl ResolverTree {
    /// Root a tree on `system`. `factory` must have been created for the same variable count.
    pub fn new(system: ConstraintSystem, factory: BindingFactory) -> Self {
        debug_assert_eq!(
            factory.variable_count(),
            system.variable_count(),
            "factory built for a different variable count"
        );
        let root = Node::new(system.into_constraints(), factory.create(), 0);
        Self {
            factory,
            config: ResolverConfig::default(),
            cancel: None,
            root,
        }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn factory(&self) -> &BindingFactory {
        &self.factory
    }

    pub fn root_state(&self) -> NodeState {
        self.root.state
    }

    /// Number of nodes built so far, the root included.
    pub fn node_count(&self) -> usize {
        self.root.count()
    }

    /// Explore the tree depth first and return the accumulated binding of every solved node,
    /// in discovery order.
    pub fn resolve(&mut self) -> Result<Vec<Binding>, ResolveError> {
        let mut solutions = Vec::new();
        let ctx = Search {
            factory: &self.factory,
            config: &self.config,
            cancel: self.cancel.as_ref(),
        };
        ctx.visit(&mut self.root, &mut solutions)?;
        tracing::debug!(
            target: RESOLVER_TARGET,
            solutions = solutions.len(),
            nodes = self.root.count(),
            "resolution finished"
        );
        Ok(solutions)
    }
}

struct Search<'a> {
    factory: &'a BindingFactory,
    config: &'a ResolverConfig,
    cancel: Option<&'a CancellationToken>,
}

impl Search<'_> {
    fn check_cancelled(&self) -> Result<(), ResolveError> {
        self.cancel.map_or(Ok(()), CancellationToken::checkpoint)
    }

    fn visit(&self, node: &mut Node, solutions: &mut Vec<Binding>) -> Result<(), ResolveError> {
        if self.config.solutions_exhausted(solutions.len()) {
            return Ok(());
        }
        if node.state == NodeState::Unexpanded {
            self.expand(node)?;
        }

        match node.state {
            NodeState::Solved => {
                let solution = if self.config.reduce_solutions {
                    node.binding.reduce_recursive()
                } else {
                    node.binding.clone()
                };
                tracing::debug!(
                    target: RESOLVER_TARGET,
                    depth = node.depth,
                    solution = %solution,
                    "found solution"
                );
                solutions.push(solution);
            }
            NodeState::Expanded => {
                for child in &mut node.children {
                    self.check_cancelled()?;
                    self.visit(child, solutions)?;
                }
            }
            NodeState::Dead | NodeState::Unexpanded => {}
        }
        Ok(())
    }

    fn expand(&self, node: &mut Node) -> Result<(), ResolveError> {
        if node.constraints.is_empty() {
            node.state = NodeState::Solved;
            return Ok(());
        }
        if node.depth >= self.config.max_depth {
            tracing::warn!(
                target: RESOLVER_TARGET,
                depth = node.depth,
                constraints = node.constraints.len(),
                "search depth limit reached, abandoning branch"
            );
            node.state = NodeState::Dead;
            return Ok(());
        }

        let steps = self.steps(&node.constraints);
        tracing::debug!(
            target: RESOLVER_TARGET,
            depth = node.depth,
            constraints = node.constraints.len(),
            candidates = steps.len(),
            "expanding node"
        );

        let mut seen: Vec<Binding> = Vec::with_capacity(steps.len());
        for step in steps {
            if seen.contains(&step.binding) {
                continue;
            }
            seen.push(step.binding.clone());

            let composed = node.binding.try_compose(&step.binding);
            let Some(binding) = prune_or_fail(composed, &step)? else {
                tracing::trace!(
                    target: RESOLVER_TARGET,
                    step = %step.binding,
                    "incompatible step"
                );
                continue;
            };
            let substituted = node.constraints.substitute(&step.binding, step.consumed);
            let Some(constraints) = prune_or_fail(substituted.map(Some), &step)? else {
                continue;
            };
            tracing::trace!(
                target: RESOLVER_TARGET,
                step = %step.binding,
                remaining = constraints.len(),
                "child"
            );
            let depth = node.depth + 1;
            node.children.push(Node::new(constraints, binding, depth));
        }

        node.state = if node.children.is_empty() {
            NodeState::Dead
        } else {
            NodeState::Expanded
        };
        Ok(())
    }

    /// Candidate substitutions for the first applicable rule.
    fn steps(&self, constraints: &ConstraintSet) -> Vec<Step> {
        if let Some((idx, constraint)) = constraints.first_ground() {
            return self.rise_and_sink(idx, constraint);
        }
        if let Some(steps) = self.reduce_interval(constraints) {
            return steps;
        }
        match constraints.get(0) {
            Some(constraint) => self.rise_and_sink(0, constraint),
            None => Vec::new(),
        }
    }

    fn rise_and_sink(&self, idx: usize, constraint: &Constraint) -> Vec<Step> {
        [
            self.factory.rise(&constraint.left, &constraint.right),
            self.factory.sink(&constraint.left, &constraint.right),
        ]
        .into_iter()
        .flatten()
        .map(|binding| Step {
            consumed: Some(idx),
            binding,
        })
        .collect()
    }

    /// Bind the lowest variable with several concrete lower bounds to each of their joins, or
    /// failing that the lowest variable with several concrete upper bounds to each meet.
    fn reduce_interval(&self, constraints: &ConstraintSet) -> Option<Vec<Step>> {
        let mut lower: BTreeMap<VarId, Vec<&Type>> = BTreeMap::new();
        let mut upper: BTreeMap<VarId, Vec<&Type>> = BTreeMap::new();
        for constraint in constraints.iter() {
            match (&constraint.left, &constraint.right) {
                (Type::Var(_), Type::Var(_)) => {}
                (ty, Type::Var(var)) => lower.entry(*var).or_default().push(ty),
                (Type::Var(var), ty) => upper.entry(*var).or_default().push(ty),
                _ => {}
            }
        }

        if let Some((var, bounds)) = lower.into_iter().find(|(_, bounds)| bounds.len() > 1) {
            let joins = self.fold(&bounds, |x, y| self.factory.union(x, y));
            return Some(self.bind_to_each(var, joins));
        }
        if let Some((var, bounds)) = upper.into_iter().find(|(_, bounds)| bounds.len() > 1) {
            let meets = self.fold(&bounds, |x, y| self.factory.intersect(x, y));
            return Some(self.bind_to_each(var, meets));
        }
        None
    }

    /// Combine `bounds` pairwise with `op`, keeping every alternative and the binding that led
    /// to it.
    fn fold(
        &self,
        bounds: &[&Type],
        op: impl Fn(&Type, &Type) -> Vec<(Type, Binding)>,
    ) -> Vec<(Type, Binding)> {
        let Some((first, rest)) = bounds.split_first() else {
            return Vec::new();
        };
        let mut acc = vec![((*first).clone(), self.factory.create())];
        for bound in rest {
            let mut next = Vec::new();
            for (ty, binding) in &acc {
                let Some(bound) = binding.apply(bound) else {
                    continue;
                };
                for (combined, step) in op(ty, &bound) {
                    if let Some(binding) = binding.compose(&step) {
                        next.push((combined, binding));
                    }
                }
            }
            acc = next;
        }
        acc
    }

    fn bind_to_each(&self, var: VarId, candidates: Vec<(Type, Binding)>) -> Vec<Step> {
        candidates
            .into_iter()
            .filter_map(|(ty, binding)| {
                let binding = self
                    .factory
                    .create_singleton(var, ty)
                    .compose(&binding)?;
                Some(Step {
                    consumed: None,
                    binding,
                })
            })
            .collect()
    }
}

/// Map a rewriting failure while deriving a child: unknown classes abort the search, nested
/// wildcards prune the child.
fn prune_or_fail<T>(
    result: Result<Option<T>, ApplyError>,
    step: &Step,
) -> Result<Option<T>, ResolveError> {
    match result {
        Ok(value) => Ok(value),
        Err(ApplyError::UnknownClass(class)) => {
            tracing::warn!(
                target: RESOLVER_TARGET,
                ?class,
                "constraint mentions unknown class"
            );
            Err(ResolveError::UnknownClass(class))
        }
        Err(ApplyError::NestedWildcard) => {
            tracing::trace!(
                target: RESOLVER_TARGET,
                step = %step.binding,
                "nested wildcard"
            );
            Ok(None)
        }
    }
}
