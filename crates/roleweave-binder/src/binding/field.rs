//! Field bindings

use std::rc::Rc;

use roleweave_descriptor::Modifiers;
use roleweave_diagnostics::Span;

use crate::decl::FieldDecl;
use crate::ids::{BindingId, FieldId, TypeId};

/// How a field binding came to exist
#[derive(Debug, Clone)]
pub enum FieldOrigin {
    /// Declared in source
    Source(Rc<FieldDecl>),
    /// Read from a descriptor
    Binary,
    /// Copied from a tsuper role
    Copied,
    /// Member of a generic instantiation
    Parameterized {
        /// Generic field this one substitutes
        original: FieldId,
    },
}

/// Anchored field type waiting for its anchor path to resolve
#[derive(Debug, Clone)]
pub(crate) struct PendingAnchor {
    pub(crate) role: String,
    pub(crate) path: Vec<String>,
}

/// A resolved field
#[derive(Debug, Clone)]
pub struct FieldBinding {
    pub(crate) id: FieldId,
    pub(crate) name: String,
    pub(crate) modifiers: Modifiers,
    pub(crate) declaring: BindingId,
    pub(crate) ty: TypeId,
    pub(crate) pending_anchor: Option<PendingAnchor>,
    pub(crate) origin: FieldOrigin,
    pub(crate) copy_inheritance_src: Option<FieldId>,
    pub(crate) span: Span,
}

impl FieldBinding {
    /// Handle of this binding
    pub fn id(&self) -> FieldId {
        self.id
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Modifiers
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Declaring type
    pub fn declaring(&self) -> BindingId {
        self.declaring
    }

    /// Field type; see [`LookupEnvironment::field_type`](crate::LookupEnvironment::field_type)
    /// for anchored types that may still be pending
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// How the binding came to exist
    pub fn origin(&self) -> &FieldOrigin {
        &self.origin
    }

    /// Field this one was copied from
    pub fn copy_inheritance_src(&self) -> Option<FieldId> {
        self.copy_inheritance_src
    }

    /// Source range
    pub fn span(&self) -> Span {
        self.span
    }

    /// Whether the field is final
    pub fn is_final(&self) -> bool {
        self.modifiers.is_final()
    }

    /// Whether the field is static
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }
}
