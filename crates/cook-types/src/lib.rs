//! Type expressions and the class-hierarchy oracle consumed by the resolver.
//!
//! The resolver never inspects declarations directly: it asks a [`TypeEnv`] for
//! class metadata and uses the free functions in [`hierarchy`] for subtyping,
//! joins and meets. [`TypeStore`] is the in-memory environment used by callers
//! that build their own hierarchy (and by the tests).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

mod format;
pub mod hierarchy;
mod store;

pub use format::format_type;
pub use hierarchy::{
    greatest_lower_classes, instantiate_as_subtype, instantiate_as_supertype, is_subclass,
    is_subtype, least_upper_classes,
};
pub use store::TypeStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn to_raw(self) -> u32 {
        self.0
    }
}

/// A formal type parameter of a class declaration (`E` in `List<E>`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeParamId(pub(crate) u32);

impl TypeParamId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn to_raw(self) -> u32 {
        self.0
    }
}

/// A unification variable. Indices are dense (`0..variable_count`) for one resolution run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub u32);

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for VarId {
    fn from(index: usize) -> Self {
        Self(index as u32)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Char => "char",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassType {
    pub def: ClassId,
    pub args: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

impl WildcardBound {
    pub fn bound(&self) -> Option<&Type> {
        match self {
            WildcardBound::Unbounded => None,
            WildcardBound::Extends(ty) | WildcardBound::Super(ty) => Some(ty),
        }
    }

    pub fn is_extends(&self) -> bool {
        matches!(self, WildcardBound::Extends(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// Lattice zero: no information (e.g. the null type). Compatible with every type.
    Bottom,
    Primitive(PrimitiveType),
    Array(Box<Type>),
    Class(ClassType),
    Wildcard(WildcardBound),
    Var(VarId),
    /// Formal parameter of a declaration; only appears inside declarations.
    TypeParam(TypeParamId),
}

impl Type {
    pub fn class(def: ClassId, args: Vec<Type>) -> Self {
        Type::Class(ClassType { def, args })
    }

    pub fn var(index: usize) -> Self {
        Type::Var(VarId::from(index))
    }

    pub fn array(component: Type) -> Self {
        Type::Array(Box::new(component))
    }

    pub fn extends(bound: Type) -> Self {
        Type::Wildcard(WildcardBound::Extends(Box::new(bound)))
    }

    pub fn super_of(bound: Type) -> Self {
        Type::Wildcard(WildcardBound::Super(Box::new(bound)))
    }

    pub fn as_var(&self) -> Option<VarId> {
        match self {
            Type::Var(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Type::Var(_))
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, Type::Bottom)
    }

    /// `true` when the type contains no unification variables at any depth.
    pub fn is_ground(&self) -> bool {
        let mut ground = true;
        self.walk(&mut |ty| {
            if ty.is_var() {
                ground = false;
            }
        });
        ground
    }

    pub fn mentions_var(&self, var: VarId) -> bool {
        let mut found = false;
        self.walk(&mut |ty| {
            if *ty == Type::Var(var) {
                found = true;
            }
        });
        found
    }

    /// Every unification variable mentioned by the type, in first-occurrence order.
    pub fn vars(&self) -> Vec<VarId> {
        let mut out = Vec::new();
        self.walk(&mut |ty| {
            if let Type::Var(v) = ty {
                if !out.contains(v) {
                    out.push(*v);
                }
            }
        });
        out
    }

    /// Pre-order traversal over the type and all nested types.
    pub fn walk(&self, f: &mut impl FnMut(&Type)) {
        f(self);
        match self {
            Type::Array(component) => component.walk(f),
            Type::Class(ClassType { args, .. }) => {
                for arg in args {
                    arg.walk(f);
                }
            }
            Type::Wildcard(bound) => {
                if let Some(bound) = bound.bound() {
                    bound.walk(f);
                }
            }
            Type::Bottom | Type::Primitive(_) | Type::Var(_) | Type::TypeParam(_) => {}
        }
    }
}

/// Replace formal parameters according to `subst`; parameters without a mapping are kept.
pub fn substitute(ty: &Type, subst: &HashMap<TypeParamId, Type>) -> Type {
    match ty {
        Type::TypeParam(id) => subst.get(id).cloned().unwrap_or_else(|| ty.clone()),
        Type::Array(component) => Type::array(substitute(component, subst)),
        Type::Class(ClassType { def, args }) => Type::class(
            *def,
            args.iter().map(|arg| substitute(arg, subst)).collect(),
        ),
        Type::Wildcard(WildcardBound::Extends(bound)) => {
            Type::Wildcard(WildcardBound::Extends(Box::new(substitute(bound, subst))))
        }
        Type::Wildcard(WildcardBound::Super(bound)) => {
            Type::Wildcard(WildcardBound::Super(Box::new(substitute(bound, subst))))
        }
        Type::Wildcard(WildcardBound::Unbounded)
        | Type::Bottom
        | Type::Primitive(_)
        | Type::Var(_) => ty.clone(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Class,
    Interface,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeParamId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub name: String,
    pub upper_bounds: Vec<Type>,
}

/// Classes every environment must provide: the hierarchy root and the universal array
/// supertypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub string: ClassId,
    pub integer: ClassId,
}

impl WellKnownTypes {
    /// `Object`, `Cloneable` and `Serializable`, the supertypes shared by every array type.
    pub fn array_supertypes(&self) -> [ClassId; 3] {
        [self.object, self.cloneable, self.serializable]
    }
}

/// Read-only view of class declarations.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<&ClassDef>;
    fn type_param(&self, id: TypeParamId) -> Option<&TypeParamDef>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    /// All declared classes in a deterministic order.
    fn class_ids(&self) -> Vec<ClassId>;
    fn well_known(&self) -> &WellKnownTypes;
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
