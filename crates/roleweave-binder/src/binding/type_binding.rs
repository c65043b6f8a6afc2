//! Type bindings

use std::rc::Rc;

use roleweave_descriptor::{Modifiers, TypeDescriptor};
use roleweave_diagnostics::Span;

use crate::decl::TypeDecl;
use crate::ids::{BindingId, FieldId, MethodId, TypeId, TypeVarId, UnitId};
use crate::lazy::{Lazy, ResolutionState};
use crate::types::ProblemReason;

/// Where a binding's data comes from
#[derive(Debug, Clone)]
pub enum BindingOrigin {
    /// Declared in a unit of this session
    Source {
        /// Declaration
        decl: Rc<TypeDecl>,
        /// Declaring unit
        unit: UnitId,
    },
    /// Read from a compiled descriptor
    Binary(Rc<TypeDescriptor>),
    /// Placeholder for a type that could not be resolved
    Problem(ProblemReason),
}

/// Resolved superclass and super-interfaces
#[derive(Debug, Clone)]
pub struct Supertypes {
    /// Superclass, absent for the root type, interfaces and confined roles
    pub superclass: Option<TypeId>,
    /// Super-interfaces in declaration order
    pub interfaces: Rc<[TypeId]>,
}

impl Supertypes {
    pub(crate) fn none() -> Self {
        Supertypes {
            superclass: None,
            interfaces: Rc::from(Vec::new()),
        }
    }
}

/// Team-specific state
#[derive(Debug, Clone, Default)]
pub struct TeamModel {
    /// Role-file units whose roles belong to this team
    pub(crate) role_files: Vec<UnitId>,
    /// Role bindings contributed by role files
    pub(crate) role_file_roles: Vec<BindingId>,
}

impl TeamModel {
    /// Role-file units of this team
    pub fn role_files(&self) -> &[UnitId] {
        &self.role_files
    }
}

/// Role-specific state
#[derive(Debug, Clone)]
pub struct RoleModel {
    /// Nearest enclosing team
    pub(crate) team: BindingId,
    /// Same-named roles of the team's super-teams, nearest first
    pub(crate) tsuper_roles: Lazy<Rc<[BindingId]>>,
}

impl RoleModel {
    pub(crate) fn new(team: BindingId) -> Self {
        RoleModel {
            team,
            tsuper_roles: Lazy::Unresolved,
        }
    }

    /// Enclosing team
    pub fn team(&self) -> BindingId {
        self.team
    }
}

/// The resolved representation of a declared type
#[derive(Debug, Clone)]
pub struct TypeBinding {
    pub(crate) id: BindingId,
    pub(crate) name: String,
    pub(crate) simple_name: String,
    pub(crate) package: String,
    pub(crate) modifiers: Modifiers,
    pub(crate) origin: BindingOrigin,
    pub(crate) enclosing: Option<BindingId>,
    pub(crate) declared_type: TypeId,
    pub(crate) span: Span,
    pub(crate) supertypes: Lazy<Supertypes>,
    pub(crate) member_types: Lazy<Rc<[BindingId]>>,
    pub(crate) type_variables: Lazy<Rc<[TypeVarId]>>,
    pub(crate) fields: Lazy<Rc<[FieldId]>>,
    pub(crate) methods: Lazy<Rc<[MethodId]>>,
    pub(crate) base_class: Lazy<Option<TypeId>>,
    pub(crate) hierarchy_has_problems: bool,
    pub(crate) team: Option<TeamModel>,
    pub(crate) role: Option<RoleModel>,
}

impl TypeBinding {
    /// Handle of this binding
    pub fn id(&self) -> BindingId {
        self.id
    }

    /// Qualified name (`p.q.Outer$Inner`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simple name
    pub fn simple_name(&self) -> &str {
        &self.simple_name
    }

    /// Package of the outermost type
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Modifiers, including the derived `ROLE` flag
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Data source
    pub fn origin(&self) -> &BindingOrigin {
        &self.origin
    }

    /// Directly enclosing type
    pub fn enclosing(&self) -> Option<BindingId> {
        self.enclosing
    }

    /// `Type::Declared` of this binding
    pub fn declared_type(&self) -> TypeId {
        self.declared_type
    }

    /// Source range of the declaration
    pub fn span(&self) -> Span {
        self.span
    }

    /// Whether this is a team
    pub fn is_team(&self) -> bool {
        self.modifiers.is_team()
    }

    /// Whether this is a role
    pub fn is_role(&self) -> bool {
        self.modifiers.is_role()
    }

    /// Whether this is an interface
    pub fn is_interface(&self) -> bool {
        self.modifiers.is_interface()
    }

    /// Whether this is a problem placeholder
    pub fn is_problem(&self) -> bool {
        matches!(self.origin, BindingOrigin::Problem(_))
    }

    /// Problem reason of a placeholder
    pub fn problem_reason(&self) -> Option<ProblemReason> {
        match self.origin {
            BindingOrigin::Problem(reason) => Some(reason),
            _ => None,
        }
    }

    /// Whether this type came from a descriptor
    pub fn is_binary(&self) -> bool {
        matches!(self.origin, BindingOrigin::Binary(_))
    }

    /// Source declaration, if any
    pub fn source_decl(&self) -> Option<&Rc<TypeDecl>> {
        match &self.origin {
            BindingOrigin::Source { decl, .. } => Some(decl),
            _ => None,
        }
    }

    /// Declaring unit of a source type
    pub fn unit(&self) -> Option<UnitId> {
        match &self.origin {
            BindingOrigin::Source { unit, .. } => Some(*unit),
            _ => None,
        }
    }

    /// Whether a supertype could not be resolved somewhere up the hierarchy
    pub fn hierarchy_has_problems(&self) -> bool {
        self.hierarchy_has_problems
    }

    /// Team model, present for teams
    pub fn team_model(&self) -> Option<&TeamModel> {
        self.team.as_ref()
    }

    /// Role model, present for roles
    pub fn role_model(&self) -> Option<&RoleModel> {
        self.role.as_ref()
    }

    /// Components still waiting for first access
    pub fn resolution_state(&self) -> ResolutionState {
        let mut state = ResolutionState::empty();
        let supertypes_pending = !self.supertypes.is_resolved();
        state.set_if(ResolutionState::SUPERCLASS, supertypes_pending);
        state.set_if(ResolutionState::INTERFACES, supertypes_pending);
        state.set_if(ResolutionState::MEMBER_TYPES, !self.member_types.is_resolved());
        state.set_if(
            ResolutionState::TYPE_VARIABLES,
            !self.type_variables.is_resolved(),
        );
        state.set_if(ResolutionState::FIELDS, !self.fields.is_resolved());
        state.set_if(ResolutionState::METHODS, !self.methods.is_resolved());
        state.set_if(ResolutionState::BASE_CLASS, !self.base_class.is_resolved());
        state
    }
}
