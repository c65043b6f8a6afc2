//! Session-scoped lookup environment
//!
//! The [`LookupEnvironment`] owns every binding of one compilation session:
//! type, method, field and type-variable arenas, the interned type table,
//! the per-unit scopes, resolved callin/callout mappings and the problem
//! sink. Bindings refer to each other by id, so the graph may be cyclic
//! without shared ownership. All resolution entry points take `&mut self`;
//! there is no global state.

use std::rc::Rc;

use roleweave_descriptor::BaseType;
use roleweave_diagnostics::{Diagnostics, Problem, ProblemId, Span};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::binding::{
    needs_synthetic_enclosing_team_instance, FieldBinding, MethodBinding, TypeBinding, TypeVarBinding,
};
use crate::config::BinderOptions;
use crate::error::{SessionAbort, ViewError};
use crate::generics::ParamMembers;
use crate::ids::{BindingId, CaptureId, FieldId, MappingId, MethodId, TypeId, TypeVarId, UnitId};
use crate::lazy::Lazy;
use crate::mapping::precedence::PrecedenceTable;
use crate::mapping::MethodMapping;
use crate::provider::TypeProvider;
use crate::scope::{BoundCheck, UnitScope};
use crate::types::{CaptureInfo, ProblemReason, Type, TypeTable, WildcardKind};

/// Types the binder looks up by configured name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnown {
    /// Root of the class hierarchy
    Object,
    /// Implicit superclass of teams
    Team,
    /// Confined role root
    Confined,
    /// String type
    String,
    /// Root of thrown types
    Throwable,
    /// Interface of bound base objects
    BoundBase,
}

/// All bindings and state of one compilation session
pub struct LookupEnvironment {
    pub(crate) options: BinderOptions,
    pub(crate) provider: Box<dyn TypeProvider>,
    pub(crate) diags: Diagnostics,
    pub(crate) types: TypeTable,
    pub(crate) bindings: Vec<TypeBinding>,
    pub(crate) methods: Vec<MethodBinding>,
    pub(crate) fields: Vec<FieldBinding>,
    pub(crate) type_vars: Vec<TypeVarBinding>,
    pub(crate) captures: Vec<CaptureInfo>,
    pub(crate) units: Vec<UnitScope>,
    pub(crate) mappings: Vec<MethodMapping>,
    pub(crate) by_name: FxHashMap<String, BindingId>,
    pub(crate) problem_bindings: FxHashMap<(String, ProblemReason), BindingId>,
    pub(crate) missing: FxHashSet<String>,
    /// Units by the package their types live in
    pub(crate) unit_packages: FxHashMap<String, Vec<UnitId>>,
    pub(crate) param_members: FxHashMap<TypeId, ParamMembers>,
    pub(crate) anchors_in_progress: FxHashSet<FieldId>,
    pub(crate) role_mappings: FxHashMap<BindingId, Lazy<Rc<[MappingId]>>>,
    pub(crate) precedence: FxHashMap<BindingId, Rc<PrecedenceTable>>,
    pub(crate) deferred_bound_checks: Vec<BoundCheck>,
}

impl LookupEnvironment {
    /// Create an environment over `provider`
    pub fn new(
        provider: Box<dyn TypeProvider>,
        options: BinderOptions,
    ) -> Result<Self, SessionAbort> {
        let severity = options.severity_config()?;
        Ok(LookupEnvironment {
            options,
            provider,
            diags: Diagnostics::with_config(severity),
            types: TypeTable::new(),
            bindings: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            type_vars: Vec::new(),
            captures: Vec::new(),
            units: Vec::new(),
            mappings: Vec::new(),
            by_name: FxHashMap::default(),
            problem_bindings: FxHashMap::default(),
            missing: FxHashSet::default(),
            unit_packages: FxHashMap::default(),
            param_members: FxHashMap::default(),
            anchors_in_progress: FxHashSet::default(),
            role_mappings: FxHashMap::default(),
            precedence: FxHashMap::default(),
            deferred_bound_checks: Vec::new(),
        })
    }

    // ── Accessors ───────────────────────────────────────────────────────

    /// Session options
    pub fn options(&self) -> &BinderOptions {
        &self.options
    }

    /// Type binding by id
    pub fn binding(&self, id: BindingId) -> &TypeBinding {
        &self.bindings[id.index()]
    }

    pub(crate) fn binding_mut(&mut self, id: BindingId) -> &mut TypeBinding {
        &mut self.bindings[id.index()]
    }

    /// Method binding by id
    pub fn method(&self, id: MethodId) -> &MethodBinding {
        &self.methods[id.index()]
    }

    pub(crate) fn method_mut(&mut self, id: MethodId) -> &mut MethodBinding {
        &mut self.methods[id.index()]
    }

    /// Show the declared signature of a callin method until the matching
    /// [`exit_source_view`](Self::exit_source_view)
    pub fn enter_source_view(&mut self, id: MethodId) -> Result<(), ViewError> {
        self.method_mut(id).enter_source_view()
    }

    /// Undo one [`enter_source_view`](Self::enter_source_view)
    pub fn exit_source_view(&mut self, id: MethodId) -> Result<(), ViewError> {
        self.method_mut(id).exit_source_view()
    }

    /// Whether calls to `id` pass the enclosing team instance as a
    /// synthetic first argument
    pub fn needs_synthetic_enclosing_team_instance(&self, id: MethodId) -> bool {
        let m = self.method(id);
        let in_role = self.binding(m.declaring()).is_role();
        needs_synthetic_enclosing_team_instance(m.modifiers(), in_role, m.name())
    }

    /// Field binding by id
    pub fn field(&self, id: FieldId) -> &FieldBinding {
        &self.fields[id.index()]
    }

    pub(crate) fn field_mut(&mut self, id: FieldId) -> &mut FieldBinding {
        &mut self.fields[id.index()]
    }

    /// Type variable by id
    pub fn type_var(&self, id: TypeVarId) -> &TypeVarBinding {
        &self.type_vars[id.index()]
    }

    /// Capture variable by id
    pub fn capture_info(&self, id: CaptureId) -> &CaptureInfo {
        &self.captures[id.index()]
    }

    /// Unit scope by id
    pub fn unit(&self, id: UnitId) -> &UnitScope {
        &self.units[id.index()]
    }

    /// All unit scopes in build order
    pub fn units(&self) -> impl Iterator<Item = &UnitScope> {
        self.units.iter()
    }

    /// Interned type by id
    pub fn ty(&self, id: TypeId) -> &Type {
        self.types.get(id)
    }

    /// The type table
    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    /// Intern a type
    pub fn intern(&mut self, ty: Type) -> TypeId {
        self.types.intern(ty)
    }

    /// Id of a primitive type
    pub fn primitive(&self, base: BaseType) -> TypeId {
        self.types.primitive(base)
    }

    /// Id of `void`
    pub fn void(&self) -> TypeId {
        self.types.primitive(BaseType::Void)
    }

    /// Binding already interned under a qualified name, without loading
    pub fn lookup_binding(&self, name: &str) -> Option<BindingId> {
        self.by_name.get(name).copied()
    }

    /// Number of type bindings, problem bindings included
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Problems reported so far
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diags
    }

    /// Consume the environment, keeping the problems
    pub fn into_problems(self) -> Vec<Problem> {
        self.diags.into_problems()
    }

    // ── Allocation ──────────────────────────────────────────────────────

    pub(crate) fn next_binding_id(&self) -> BindingId {
        BindingId::from_index(self.bindings.len())
    }

    pub(crate) fn push_binding(&mut self, binding: TypeBinding) -> BindingId {
        let id = binding.id;
        debug_assert_eq!(id.index(), self.bindings.len());
        trace!(binding = %binding.name, %id, "interned type binding");
        self.bindings.push(binding);
        id
    }

    pub(crate) fn push_method(&mut self, mut method: MethodBinding) -> MethodId {
        let id = MethodId::from_index(self.methods.len());
        method.id = id;
        self.methods.push(method);
        id
    }

    pub(crate) fn push_field(&mut self, mut field: FieldBinding) -> FieldId {
        let id = FieldId::from_index(self.fields.len());
        field.id = id;
        self.fields.push(field);
        id
    }

    pub(crate) fn push_type_var(&mut self, mut var: TypeVarBinding) -> TypeVarId {
        let id = TypeVarId::from_index(self.type_vars.len());
        var.id = id;
        var.declared_type = self.types.intern(Type::Variable(id));
        self.type_vars.push(var);
        id
    }

    pub(crate) fn push_capture(&mut self, info: CaptureInfo) -> CaptureId {
        let id = CaptureId::from_index(self.captures.len());
        self.captures.push(info);
        id
    }

    // ── Reporting ───────────────────────────────────────────────────────

    /// Report a problem attributed to the unit currently being processed
    pub(crate) fn report<I, S>(&mut self, id: ProblemId, span: Span, arguments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.diags.report(id, span, arguments);
    }

    /// Report a problem attributed to the unit declaring `binding`, or to no
    /// unit for binary types
    pub(crate) fn report_for<I, S>(
        &mut self,
        binding: BindingId,
        id: ProblemId,
        span: Span,
        arguments: I,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let file = self
            .binding(binding)
            .unit()
            .map(|unit| self.unit(unit).file_name().to_string());
        self.report_in_file(file, id, span, arguments);
    }

    /// Report a problem attributed to `unit`
    pub(crate) fn report_in_unit<I, S>(
        &mut self,
        unit: UnitId,
        id: ProblemId,
        span: Span,
        arguments: I,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let file = Some(self.unit(unit).file_name().to_string());
        self.report_in_file(file, id, span, arguments);
    }

    fn report_in_file<I, S>(&mut self, file: Option<String>, id: ProblemId, span: Span, arguments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let previous = self.diags.set_current_file(file);
        self.diags.report(id, span, arguments);
        self.diags.set_current_file(previous);
    }

    // ── Type helpers ────────────────────────────────────────────────────

    /// Binding a reference type is declared by, looking through
    /// instantiations and anchors
    pub fn binding_of_type(&self, ty: TypeId) -> Option<BindingId> {
        match self.ty(ty) {
            Type::Declared(b) => Some(*b),
            Type::Parameterized { generic, .. } | Type::Raw { generic, .. } => Some(*generic),
            Type::Anchored { role, .. } => self.binding_of_type(*role),
            _ => None,
        }
    }

    /// Whether `ty` stands for an unresolvable type
    pub fn is_problem_type(&self, ty: TypeId) -> bool {
        match self.binding_of_type(ty) {
            Some(b) => self.binding(b).is_problem(),
            None => false,
        }
    }

    /// Printable form of a type for problem arguments
    pub fn type_name(&self, ty: TypeId) -> String {
        match self.ty(ty) {
            Type::Primitive(base) => base.keyword().to_string(),
            Type::Null => "null".to_string(),
            Type::Declared(b) => self.binding(*b).name().to_string(),
            Type::Parameterized { generic, args, .. } => {
                let args: Vec<String> = args.iter().map(|a| self.type_name(*a)).collect();
                format!("{}<{}>", self.binding(*generic).name(), args.join(","))
            }
            Type::Raw { generic, .. } => self.binding(*generic).name().to_string(),
            Type::Variable(v) => self.type_var(*v).name().to_string(),
            Type::Wildcard { kind, bound } => match (kind, bound) {
                (WildcardKind::Extends, Some(b)) => format!("? extends {}", self.type_name(*b)),
                (WildcardKind::Super, Some(b)) => format!("? super {}", self.type_name(*b)),
                _ => "?".to_string(),
            },
            Type::Captured(c) => {
                let wildcard = self.capture_info(*c).wildcard;
                format!("capture#{} of {}", c.index(), self.type_name(wildcard))
            }
            Type::Array(component) => format!("{}[]", self.type_name(*component)),
            Type::Anchored { role, anchor } => {
                let path: Vec<&str> = anchor.iter().map(|f| self.field(*f).name()).collect();
                format!("{}<@{}>", self.type_name(*role), path.join("."))
            }
        }
    }

    /// Name of a method with its declaring type, for problem arguments
    pub fn method_display(&self, method: MethodId) -> String {
        let m = self.method(method);
        format!("{}.{}", self.binding(m.declaring()).name(), m.name())
    }
}
