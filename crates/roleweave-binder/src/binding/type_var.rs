//! Type variable bindings

use crate::ids::{BindingId, TypeId, TypeVarId};

/// Declaration site of a type variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeVarOwner {
    /// Declared by a generic type
    Type(BindingId),
    /// Declared by a generic method of the given type
    Method(BindingId),
}

/// A type variable
#[derive(Debug, Clone)]
pub struct TypeVarBinding {
    pub(crate) id: TypeVarId,
    pub(crate) name: String,
    pub(crate) owner: TypeVarOwner,
    pub(crate) index: usize,
    pub(crate) bounds: Vec<TypeId>,
    pub(crate) declared_type: TypeId,
}

impl TypeVarBinding {
    /// Handle of this binding
    pub fn id(&self) -> TypeVarId {
        self.id
    }

    /// Variable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaration site
    pub fn owner(&self) -> TypeVarOwner {
        self.owner
    }

    /// Position among the owner's type parameters
    pub fn index(&self) -> usize {
        self.index
    }

    /// Declared bounds, class bound first; empty means the root type
    pub fn bounds(&self) -> &[TypeId] {
        &self.bounds
    }

    /// `Type::Variable` of this binding
    pub fn declared_type(&self) -> TypeId {
        self.declared_type
    }
}
