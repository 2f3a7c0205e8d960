use cook_types::ClassId;
use thiserror::Error;

/// Why a substitution could not be applied to a type expression.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("class {0:?} is not known to the type environment")]
    UnknownClass(ClassId),
    #[error("substitution would place a wildcard inside a wildcard bound")]
    NestedWildcard,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("type variable {index} is out of range for a system with {count} variables")]
    VariableOutOfRange { index: usize, count: usize },
    #[error("constraint system references unknown class {0:?}")]
    UnknownClass(ClassId),
    #[error("resolution was cancelled")]
    Cancelled,
}
