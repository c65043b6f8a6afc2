//! Method bindings and signature views
//!
//! A callin method has two signatures: the one declared in source and the
//! enhanced one that carries the weaving scheme's synthetic arguments in
//! front of the declared parameters. Both are computed once when the
//! binding is created and never change. Which one callers see is decided
//! by a depth counter: at depth zero the enhanced signature is visible,
//! inside any number of `enter_source_view` calls the declared one is.
//! Since nothing is copied or saved, leaving the source view hands back
//! the very same parameter list that was visible before entering it.

use std::rc::Rc;

use roleweave_descriptor::Modifiers;
use roleweave_diagnostics::Span;

use crate::decl::MethodDecl;
use crate::error::ViewError;
use crate::ids::{BindingId, MethodId, TypeId, TypeVarId};
use crate::names;

/// Parameter and return types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Parameter types
    pub params: Rc<[TypeId]>,
    /// Return type
    pub ret: TypeId,
}

/// Which signature of a method is meant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureView {
    /// Parameters as declared in source
    Declared,
    /// Declared parameters preceded by this many synthetic arguments
    Enhanced(usize),
}

/// How a method binding came to exist
#[derive(Debug, Clone)]
pub enum MethodOrigin {
    /// Declared in source
    Source(Rc<MethodDecl>),
    /// Read from a descriptor
    Binary,
    /// Copied from a tsuper role
    Copied,
    /// Member of a generic instantiation
    Parameterized {
        /// Generic method this one substitutes
        original: MethodId,
    },
    /// Base-call surrogate of a callin method
    Surrogate {
        /// The callin method
        callin: MethodId,
    },
    /// Role method declared implicitly by a short callout
    ShortCallout,
}

/// A resolved method
#[derive(Debug, Clone)]
pub struct MethodBinding {
    pub(crate) id: MethodId,
    pub(crate) name: String,
    pub(crate) modifiers: Modifiers,
    pub(crate) declaring: BindingId,
    pub(crate) type_variables: Rc<[TypeVarId]>,
    pub(crate) declared: Signature,
    pub(crate) enhanced: Option<Signature>,
    pub(crate) view_depth: u32,
    pub(crate) exceptions: Rc<[TypeId]>,
    pub(crate) origin: MethodOrigin,
    pub(crate) copy_inheritance_src: Option<MethodId>,
    pub(crate) overridden_tsupers: Vec<MethodId>,
    pub(crate) base_call_surrogate: Option<MethodId>,
    pub(crate) bound_base_methods: Vec<MethodId>,
    pub(crate) span: Span,
}

impl MethodBinding {
    /// Handle of this binding
    pub fn id(&self) -> MethodId {
        self.id
    }

    /// Method name
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

    /// Method type variables
    pub fn type_variables(&self) -> &Rc<[TypeVarId]> {
        &self.type_variables
    }

    /// Thrown types
    pub fn exceptions(&self) -> &Rc<[TypeId]> {
        &self.exceptions
    }

    /// How the binding came to exist
    pub fn origin(&self) -> &MethodOrigin {
        &self.origin
    }

    /// Source range
    pub fn span(&self) -> Span {
        self.span
    }

    /// Whether this is a callin method
    pub fn is_callin(&self) -> bool {
        self.modifiers.is_callin()
    }

    /// Whether this is a constructor
    pub fn is_constructor(&self) -> bool {
        self.name == "<init>"
    }

    /// Whether this binding was generated
    pub fn is_synthetic(&self) -> bool {
        self.modifiers.is_synthetic()
    }

    /// Method this one was copied from, one hop
    pub fn copy_inheritance_src(&self) -> Option<MethodId> {
        self.copy_inheritance_src
    }

    /// Methods of tsuper roles this one overrides
    pub fn overridden_tsupers(&self) -> &[MethodId] {
        &self.overridden_tsupers
    }

    /// Base-call surrogate of a callin method
    pub fn base_call_surrogate(&self) -> Option<MethodId> {
        self.base_call_surrogate
    }

    /// Base methods a surrogate forwards to
    pub fn bound_base_methods(&self) -> &[MethodId] {
        &self.bound_base_methods
    }

    /// Signature as declared
    pub fn declared_signature(&self) -> &Signature {
        &self.declared
    }

    /// Enhanced signature, present for callin methods under an enhancing
    /// weaving scheme
    pub fn enhanced_signature(&self) -> Option<&Signature> {
        self.enhanced.as_ref()
    }

    /// Whether the method has two signature views
    pub fn has_views(&self) -> bool {
        self.enhanced.is_some()
    }

    /// Currently visible view
    pub fn view(&self) -> SignatureView {
        match &self.enhanced {
            Some(enhanced) if self.view_depth == 0 => {
                SignatureView::Enhanced(enhanced.params.len() - self.declared.params.len())
            }
            _ => SignatureView::Declared,
        }
    }

    /// Signature for an explicit view
    pub fn signature(&self, view: SignatureView) -> &Signature {
        match (view, &self.enhanced) {
            (SignatureView::Enhanced(_), Some(enhanced)) => enhanced,
            _ => &self.declared,
        }
    }

    /// Currently visible signature
    pub fn visible_signature(&self) -> &Signature {
        self.signature(self.view())
    }

    /// Currently visible parameter list
    pub fn parameters(&self) -> Rc<[TypeId]> {
        self.visible_signature().params.clone()
    }

    /// Currently visible return type
    pub fn return_type(&self) -> TypeId {
        self.visible_signature().ret
    }

    /// Nesting depth of `enter_source_view`
    pub fn view_depth(&self) -> u32 {
        self.view_depth
    }

    /// Whether the declared signature is currently shown in place of the
    /// enhanced one
    pub fn in_source_view(&self) -> bool {
        self.enhanced.is_some() && self.view_depth > 0
    }

    /// Show the declared signature until the matching `exit_source_view`
    pub fn enter_source_view(&mut self) -> Result<(), ViewError> {
        if self.enhanced.is_none() {
            return Err(ViewError::NotEnhanceable(self.name.clone()));
        }
        self.view_depth += 1;
        Ok(())
    }

    /// Undo one `enter_source_view`
    pub fn exit_source_view(&mut self) -> Result<(), ViewError> {
        if self.view_depth == 0 {
            return Err(ViewError::NotInSourceView(self.name.clone()));
        }
        self.view_depth -= 1;
        Ok(())
    }
}

/// Whether a method needs the enclosing team instance as a synthetic first
/// argument: static methods of roles, except callout-to-field accessors
pub fn needs_synthetic_enclosing_team_instance(
    modifiers: Modifiers,
    declared_in_role: bool,
    name: &str,
) -> bool {
    modifiers.is_static() && declared_in_role && !names::is_accessor_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(enhanced: bool) -> MethodBinding {
        let declared = Signature {
            params: Rc::from(vec![TypeId(1)]),
            ret: TypeId(0),
        };
        let enhanced = enhanced.then(|| Signature {
            params: Rc::from(vec![TypeId(9), TypeId(9), TypeId(1)]),
            ret: TypeId(0),
        });
        MethodBinding {
            id: MethodId(0),
            name: "wrap".to_string(),
            modifiers: Modifiers::CALLIN,
            declaring: BindingId(0),
            type_variables: Rc::from(Vec::new()),
            declared,
            enhanced,
            view_depth: 0,
            exceptions: Rc::from(Vec::new()),
            origin: MethodOrigin::Binary,
            copy_inheritance_src: None,
            overridden_tsupers: Vec::new(),
            base_call_surrogate: None,
            bound_base_methods: Vec::new(),
            span: Span::none(),
        }
    }

    #[test]
    fn test_enhanced_view_by_default() {
        let m = binding(true);
        assert_eq!(m.view(), SignatureView::Enhanced(2));
        assert_eq!(m.parameters().len(), 3);
    }

    #[test]
    fn test_enter_exit_restores_identical_list() {
        let mut m = binding(true);
        let before = m.parameters();
        m.enter_source_view().unwrap();
        assert_eq!(m.parameters().len(), 1);
        m.exit_source_view().unwrap();
        assert!(Rc::ptr_eq(&before, &m.parameters()));
        assert_eq!(m.view_depth(), 0);
    }

    #[test]
    fn test_nested_views() {
        let mut m = binding(true);
        m.enter_source_view().unwrap();
        m.enter_source_view().unwrap();
        m.exit_source_view().unwrap();
        assert!(m.in_source_view());
        assert_eq!(m.view(), SignatureView::Declared);
        m.exit_source_view().unwrap();
        assert!(!m.in_source_view());
        assert!(m.exit_source_view().is_err());
    }

    #[test]
    fn test_plain_method_rejects_views() {
        let mut m = binding(false);
        assert_eq!(m.view(), SignatureView::Declared);
        assert_eq!(
            m.enter_source_view(),
            Err(ViewError::NotEnhanceable("wrap".to_string()))
        );
    }

    #[test]
    fn test_synthetic_team_instance_rule() {
        assert!(needs_synthetic_enclosing_team_instance(
            Modifiers::STATIC,
            true,
            "helper"
        ));
        assert!(!needs_synthetic_enclosing_team_instance(
            Modifiers::NONE,
            true,
            "helper"
        ));
        assert!(!needs_synthetic_enclosing_team_instance(
            Modifiers::STATIC,
            false,
            "helper"
        ));
        assert!(!needs_synthetic_enclosing_team_instance(
            Modifiers::STATIC,
            true,
            &names::getter_name("x")
        ));
    }
}
