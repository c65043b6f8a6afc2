//! First-access resolution of type binding components
//!
//! Every component query on the environment follows the same shape: a
//! resolved slot is returned as is; an unresolved slot is latched
//! `InProgress`, filled from the binding's origin, and latched `Resolved`.
//! Finding a slot `InProgress` means the component depends on itself. For
//! supertypes that is an ordinary hierarchy cycle and the query answers
//! "no supertypes" so the cycle check further up can see it; for every
//! other component it is a fatal [`SessionAbort::Reentrant`].

pub(crate) mod base_class;
pub(crate) mod binary;
pub(crate) mod hierarchy;
pub(crate) mod source;

use std::rc::Rc;

use roleweave_descriptor::{BaseType, ClassTypeSig, Modifiers, TypeArgSig, TypeSig};
use roleweave_diagnostics::id::CORRUPT_DESCRIPTOR;
use roleweave_diagnostics::Span;
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::binding::{
    BindingOrigin, MethodBinding, MethodOrigin, RoleModel, Signature, TeamModel, TypeBinding,
    TypeVarBinding, TypeVarOwner,
};
use crate::config::EnhancingArg;
use crate::environment::{LookupEnvironment, WellKnown};
use crate::error::{Component, SessionAbort};
use crate::ids::{BindingId, FieldId, MethodId, TypeId, TypeVarId};
use crate::lazy::{Lazy, ResolutionState};
use crate::names;
use crate::types::{ProblemReason, Type, WildcardKind};

/// Everything needed to create a method binding
#[derive(Debug, Clone)]
pub(crate) struct MethodParts {
    pub(crate) name: String,
    pub(crate) modifiers: Modifiers,
    pub(crate) declaring: BindingId,
    pub(crate) type_variables: Rc<[TypeVarId]>,
    pub(crate) params: Vec<TypeId>,
    pub(crate) ret: TypeId,
    pub(crate) exceptions: Vec<TypeId>,
    pub(crate) origin: MethodOrigin,
    pub(crate) span: Span,
}

/// Type variables visible while converting a descriptor signature
#[derive(Debug, Clone)]
pub(crate) struct SigScope {
    pub(crate) owner: BindingId,
    pub(crate) method_vars: Vec<TypeVarId>,
}

impl LookupEnvironment {
    // ── Interning by name ───────────────────────────────────────────────

    /// Binding for a qualified name, loading its descriptor header on first
    /// request; `None` if no such type exists
    pub fn get_type(&mut self, name: &str) -> Result<Option<BindingId>, SessionAbort> {
        if let Some(&id) = self.by_name.get(name) {
            return Ok(Some(id));
        }
        if self.missing.contains(name) {
            return Ok(None);
        }
        match self.provider.find_type(name) {
            Ok(Some(descriptor)) => {
                let id = self.create_binary_binding(descriptor)?;
                if !self.by_name.contains_key(name) {
                    self.by_name.insert(name.to_string(), id);
                }
                Ok(Some(id))
            }
            Ok(None) => {
                self.missing.insert(name.to_string());
                Ok(None)
            }
            Err(err) => {
                warn!(type_name = name, error = %err, "unreadable type descriptor");
                let id = self.problem_binding(name, ProblemReason::Corrupt);
                self.by_name.insert(name.to_string(), id);
                self.report_for(id, CORRUPT_DESCRIPTOR, Span::none(), [name.to_string(), err.to_string()]);
                Ok(Some(id))
            }
        }
    }

    /// Binding for `name`, or a problem binding when there is none
    pub(crate) fn get_type_or_problem(&mut self, name: &str) -> Result<BindingId, SessionAbort> {
        match self.get_type(name)? {
            Some(id) => Ok(id),
            None => Ok(self.problem_binding(name, ProblemReason::NotFound)),
        }
    }

    /// Placeholder binding standing in for an unresolvable type
    pub(crate) fn problem_binding(&mut self, name: &str, reason: ProblemReason) -> BindingId {
        let key = (name.to_string(), reason);
        if let Some(&id) = self.problem_bindings.get(&key) {
            return id;
        }
        let id = self.next_binding_id();
        let mut binding = self.new_type_binding(
            id,
            name.to_string(),
            names::package_of(name).to_string(),
            Modifiers::PUBLIC,
            BindingOrigin::Problem(reason),
            None,
            Span::none(),
        );
        binding.supertypes = Lazy::Resolved(crate::binding::Supertypes::none());
        binding.member_types = Lazy::Resolved(Rc::from(Vec::new()));
        binding.type_variables = Lazy::Resolved(Rc::from(Vec::new()));
        binding.fields = Lazy::Resolved(Rc::from(Vec::new()));
        binding.methods = Lazy::Resolved(Rc::from(Vec::new()));
        binding.base_class = Lazy::Resolved(None);
        binding.hierarchy_has_problems = true;
        self.problem_bindings.insert(key, id);
        self.push_binding(binding)
    }

    /// Type of a problem binding
    pub(crate) fn problem_type(&mut self, name: &str, reason: ProblemReason) -> TypeId {
        let id = self.problem_binding(name, reason);
        self.binding(id).declared_type
    }

    pub(crate) fn new_type_binding(
        &mut self,
        id: BindingId,
        name: String,
        package: String,
        modifiers: Modifiers,
        origin: BindingOrigin,
        enclosing: Option<BindingId>,
        span: Span,
    ) -> TypeBinding {
        let declared_type = self.types.intern(Type::Declared(id));
        TypeBinding {
            id,
            simple_name: names::simple_name(&name).to_string(),
            name,
            package,
            modifiers,
            origin,
            enclosing,
            declared_type,
            span,
            supertypes: Lazy::Unresolved,
            member_types: Lazy::Unresolved,
            type_variables: Lazy::Unresolved,
            fields: Lazy::Unresolved,
            methods: Lazy::Unresolved,
            base_class: Lazy::Unresolved,
            hierarchy_has_problems: false,
            team: None,
            role: None,
        }
    }

    /// Give teams a team model and types enclosed by a team the role flag
    /// and a role model
    pub(crate) fn attach_team_role_models(&mut self, id: BindingId) {
        let team = self.nearest_enclosing_team(id);
        let binding = self.binding_mut(id);
        if binding.modifiers.is_team() {
            binding.team = Some(TeamModel::default());
        }
        if let Some(team) = team {
            binding.modifiers.insert(Modifiers::ROLE);
            binding.role = Some(RoleModel::new(team));
        }
    }

    /// Innermost team enclosing `id`
    pub(crate) fn nearest_enclosing_team(&self, id: BindingId) -> Option<BindingId> {
        self.enclosing_chain(id)
            .into_iter()
            .skip(1)
            .find(|enclosing| self.binding(*enclosing).is_team())
    }

    /// `id` and its enclosing types, innermost first
    pub(crate) fn enclosing_chain(&self, id: BindingId) -> Vec<BindingId> {
        let mut chain = vec![id];
        let mut current = self.binding(id).enclosing;
        while let Some(enclosing) = current {
            if chain.contains(&enclosing) {
                break;
            }
            chain.push(enclosing);
            current = self.binding(enclosing).enclosing;
        }
        chain
    }

    /// Outermost enclosing type of `id`
    pub(crate) fn outermost(&self, id: BindingId) -> BindingId {
        self.enclosing_chain(id).last().copied().unwrap_or(id)
    }

    // ── Well-known types ────────────────────────────────────────────────

    /// Binding of a well-known type, a problem binding if it is missing
    pub fn well_known(&mut self, which: WellKnown) -> Result<BindingId, SessionAbort> {
        let names = &self.options.well_known;
        let name = match which {
            WellKnown::Object => names.object.clone(),
            WellKnown::Team => names.team.clone(),
            WellKnown::Confined => names.confined.clone(),
            WellKnown::String => names.string.clone(),
            WellKnown::Throwable => names.throwable.clone(),
            WellKnown::BoundBase => names.bound_base.clone(),
        };
        self.get_type_or_problem(&name)
    }

    /// Declared type of a well-known type
    pub fn well_known_type(&mut self, which: WellKnown) -> Result<TypeId, SessionAbort> {
        let id = self.well_known(which)?;
        Ok(self.binding(id).declared_type)
    }

    /// Whether `id` is the root of the class hierarchy
    pub(crate) fn is_object(&self, id: BindingId) -> bool {
        self.binding(id).name == self.options.well_known.object
    }

    /// Whether `id` is a confined role root, which has no superclass
    pub(crate) fn is_confined(&self, id: BindingId) -> bool {
        let binding = self.binding(id);
        if binding.name == self.options.well_known.confined {
            return true;
        }
        match &binding.origin {
            BindingOrigin::Binary(desc) => desc
                .extension
                .attributes()
                .map(|attrs| attrs.is_confined())
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Whether `id` declares type parameters, without resolving them
    pub fn is_generic(&self, id: BindingId) -> bool {
        match &self.binding(id).origin {
            BindingOrigin::Source { decl, .. } => !decl.type_params.is_empty(),
            BindingOrigin::Binary(desc) => desc
                .signature
                .as_deref()
                .map(|sig| sig.starts_with('<'))
                .unwrap_or(false),
            BindingOrigin::Problem(_) => false,
        }
    }

    // ── Component queries ───────────────────────────────────────────────

    pub(crate) fn reentrant(&self, id: BindingId, component: Component) -> SessionAbort {
        SessionAbort::Reentrant {
            binding: self.binding(id).name.clone(),
            component,
        }
    }

    /// Superclass of `id`
    pub fn superclass(&mut self, id: BindingId) -> Result<Option<TypeId>, SessionAbort> {
        Ok(self.supertypes(id)?.superclass)
    }

    /// Super-interfaces of `id`
    pub fn super_interfaces(&mut self, id: BindingId) -> Result<Rc<[TypeId]>, SessionAbort> {
        Ok(self.supertypes(id)?.interfaces)
    }

    /// Member types of `id`, including roles contributed by role files
    pub fn member_types(&mut self, id: BindingId) -> Result<Rc<[BindingId]>, SessionAbort> {
        match &self.binding(id).member_types {
            Lazy::Resolved(list) => return Ok(list.clone()),
            Lazy::InProgress => return Err(self.reentrant(id, Component::MemberTypes)),
            Lazy::Unresolved => {}
        }
        self.binding_mut(id).member_types = Lazy::InProgress;
        debug!(binding = %self.binding(id).name, "resolving member types");
        let mut list = match self.binding(id).origin.clone() {
            BindingOrigin::Source { decl, .. } => self.source_member_types(id, &decl),
            BindingOrigin::Binary(desc) => self.binary_member_types(&desc)?,
            BindingOrigin::Problem(_) => Vec::new(),
        };
        if let Some(team) = &self.binding(id).team {
            for role in &team.role_file_roles {
                if !list.contains(role) {
                    list.push(*role);
                }
            }
        }
        let list: Rc<[BindingId]> = Rc::from(list);
        self.binding_mut(id).member_types = Lazy::Resolved(list.clone());
        Ok(list)
    }

    /// Type variables of `id`
    pub fn type_variables(&mut self, id: BindingId) -> Result<Rc<[TypeVarId]>, SessionAbort> {
        match &self.binding(id).type_variables {
            Lazy::Resolved(list) => return Ok(list.clone()),
            Lazy::InProgress => return Err(self.reentrant(id, Component::TypeVariables)),
            Lazy::Unresolved => {}
        }
        self.binding_mut(id).type_variables = Lazy::InProgress;
        debug!(binding = %self.binding(id).name, "resolving type variables");
        // Both paths publish the variables before resolving their bounds, so
        // bounds may mention the variables and their own type
        let list = match self.binding(id).origin.clone() {
            BindingOrigin::Source { decl, .. } => self.source_type_variables(id, &decl)?,
            BindingOrigin::Binary(desc) => self.binary_type_variables(id, &desc)?,
            BindingOrigin::Problem(_) => Rc::from(Vec::new()),
        };
        self.binding_mut(id).type_variables = Lazy::Resolved(list.clone());
        Ok(list)
    }

    /// Fields of `id`, copies from tsuper roles included
    pub fn fields(&mut self, id: BindingId) -> Result<Rc<[FieldId]>, SessionAbort> {
        match &self.binding(id).fields {
            Lazy::Resolved(list) => return Ok(list.clone()),
            Lazy::InProgress => return Err(self.reentrant(id, Component::Fields)),
            Lazy::Unresolved => {}
        }
        self.binding_mut(id).fields = Lazy::InProgress;
        debug!(binding = %self.binding(id).name, "resolving fields");
        let mut list = match self.binding(id).origin.clone() {
            BindingOrigin::Source { decl, .. } => self.source_fields(id, &decl)?,
            BindingOrigin::Binary(desc) => self.binary_fields(id, &desc)?,
            BindingOrigin::Problem(_) => Vec::new(),
        };
        if self.binding(id).is_role() && !self.binding(id).is_binary() {
            self.copy_inherited_fields(id, &mut list)?;
        }
        let list: Rc<[FieldId]> = Rc::from(list);
        self.binding_mut(id).fields = Lazy::Resolved(list.clone());
        for field in list.iter() {
            self.field_type(*field)?;
        }
        Ok(list)
    }

    /// Methods of `id`, with copies from tsuper roles, base-call surrogates
    /// and short-callout role methods
    pub fn methods(&mut self, id: BindingId) -> Result<Rc<[MethodId]>, SessionAbort> {
        match &self.binding(id).methods {
            Lazy::Resolved(list) => return Ok(list.clone()),
            Lazy::InProgress => return Err(self.reentrant(id, Component::Methods)),
            Lazy::Unresolved => {}
        }
        self.binding_mut(id).methods = Lazy::InProgress;
        debug!(binding = %self.binding(id).name, "resolving methods");
        let mut list = match self.binding(id).origin.clone() {
            BindingOrigin::Source { decl, .. } => self.source_methods(id, &decl)?,
            BindingOrigin::Binary(desc) => self.binary_methods(id, &desc)?,
            BindingOrigin::Problem(_) => Vec::new(),
        };
        if self.binding(id).is_role() {
            if !self.binding(id).is_binary() {
                self.copy_inherited_methods(id, &mut list)?;
            }
            self.attach_surrogates(id, &mut list)?;
        }
        let list: Rc<[MethodId]> = Rc::from(list);
        self.binding_mut(id).methods = Lazy::Resolved(list.clone());
        Ok(list)
    }

    /// Components of `id` not yet resolved
    pub fn resolution_state(&self, id: BindingId) -> ResolutionState {
        self.binding(id).resolution_state()
    }

    /// Resolve every component of `id`
    pub fn resolve_all_components(&mut self, id: BindingId) -> Result<(), SessionAbort> {
        self.supertypes(id)?;
        self.member_types(id)?;
        self.type_variables(id)?;
        self.fields(id)?;
        self.methods(id)?;
        self.base_class(id)?;
        Ok(())
    }

    // ── Members ─────────────────────────────────────────────────────────

    /// Member type named `simple` declared by `id` or inherited from its
    /// supertypes
    pub fn find_member_type(
        &mut self,
        id: BindingId,
        simple: &str,
    ) -> Result<Option<BindingId>, SessionAbort> {
        let mut visited = FxHashSet::default();
        let mut queue = vec![id];
        while let Some(current) = queue.pop() {
            if !visited.insert(current) {
                continue;
            }
            let members = self.member_types(current)?;
            if let Some(found) = members
                .iter()
                .copied()
                .find(|m| self.binding(*m).simple_name == simple)
            {
                return Ok(Some(found));
            }
            let supertypes = self.supertypes(current)?;
            for iface in supertypes.interfaces.iter().rev() {
                if let Some(b) = self.binding_of_type(*iface) {
                    queue.push(b);
                }
            }
            if let Some(superclass) = supertypes.superclass.and_then(|s| self.binding_of_type(s)) {
                queue.push(superclass);
            }
        }
        Ok(None)
    }

    /// Methods named `name` visible in `id`: its own, then inherited ones
    /// not hidden by an override with the same erased parameters
    pub fn find_methods(&mut self, id: BindingId, name: &str) -> Result<Vec<MethodId>, SessionAbort> {
        let mut found: Vec<MethodId> = Vec::new();
        let mut visited = FxHashSet::default();
        let mut queue = std::collections::VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let methods = self.methods(current)?;
            for m in methods.iter().copied() {
                if self.method(m).name != name {
                    continue;
                }
                let hidden = found
                    .iter()
                    .any(|existing| self.same_declared_erasure(*existing, m));
                if !hidden {
                    found.push(m);
                }
            }
            let supertypes = self.supertypes(current)?;
            if let Some(superclass) = supertypes.superclass.and_then(|s| self.binding_of_type(s)) {
                queue.push_back(superclass);
            }
            for iface in supertypes.interfaces.iter() {
                if let Some(b) = self.binding_of_type(*iface) {
                    queue.push_back(b);
                }
            }
        }
        Ok(found)
    }

    /// Whether the method list of `id` or of one of its supertypes is being
    /// resolved further up the current stack
    pub(crate) fn methods_in_progress(&mut self, id: BindingId) -> Result<bool, SessionAbort> {
        let mut visited = FxHashSet::default();
        let mut queue = std::collections::VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if matches!(self.binding(current).methods, Lazy::InProgress) {
                return Ok(true);
            }
            let supertypes = self.supertypes(current)?;
            if let Some(superclass) = supertypes.superclass.and_then(|s| self.binding_of_type(s)) {
                queue.push_back(superclass);
            }
            for iface in supertypes.interfaces.iter() {
                if let Some(b) = self.binding_of_type(*iface) {
                    queue.push_back(b);
                }
            }
        }
        Ok(false)
    }

    /// Field named `name` of `id` or inherited by it
    pub fn find_field(&mut self, id: BindingId, name: &str) -> Result<Option<FieldId>, SessionAbort> {
        let mut visited = FxHashSet::default();
        let mut queue = std::collections::VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let fields = self.fields(current)?;
            if let Some(found) = fields.iter().copied().find(|f| self.field(*f).name == name) {
                return Ok(Some(found));
            }
            let supertypes = self.supertypes(current)?;
            if let Some(superclass) = supertypes.superclass.and_then(|s| self.binding_of_type(s)) {
                queue.push_back(superclass);
            }
            for iface in supertypes.interfaces.iter() {
                if let Some(b) = self.binding_of_type(*iface) {
                    queue.push_back(b);
                }
            }
        }
        Ok(None)
    }

    /// Whether two methods have the same erased declared parameters
    pub(crate) fn same_declared_erasure(&self, a: MethodId, b: MethodId) -> bool {
        let pa = &self.method(a).declared.params;
        let pb = &self.method(b).declared.params;
        pa.len() == pb.len()
            && pa
                .iter()
                .zip(pb.iter())
                .all(|(x, y)| self.erasure_eq(*x, *y))
    }

    // ── Type variables ──────────────────────────────────────────────────

    /// Create unbounded type variables; bounds are filled in afterwards so
    /// they can refer to the variables themselves
    pub(crate) fn create_type_vars<'a>(
        &mut self,
        owner: TypeVarOwner,
        names: impl Iterator<Item = &'a str>,
    ) -> Vec<TypeVarId> {
        names
            .enumerate()
            .map(|(index, name)| {
                self.push_type_var(TypeVarBinding {
                    id: TypeVarId::from_index(0),
                    name: name.to_string(),
                    owner,
                    index,
                    bounds: Vec::new(),
                    declared_type: TypeId::from_index(0),
                })
            })
            .collect()
    }

    // ── Method creation ─────────────────────────────────────────────────

    /// Create a method binding, computing the enhanced signature of callin
    /// methods from the weaving scheme
    pub(crate) fn add_method(&mut self, parts: MethodParts) -> Result<MethodId, SessionAbort> {
        let enhanced = if parts.modifiers.is_callin() {
            self.enhanced_signature(&parts.params, parts.ret)?
        } else {
            None
        };
        let method = MethodBinding {
            id: MethodId::from_index(0),
            name: parts.name,
            modifiers: parts.modifiers,
            declaring: parts.declaring,
            type_variables: parts.type_variables,
            declared: Signature {
                params: Rc::from(parts.params),
                ret: parts.ret,
            },
            enhanced,
            view_depth: 0,
            exceptions: Rc::from(parts.exceptions),
            origin: parts.origin,
            copy_inheritance_src: None,
            overridden_tsupers: Vec::new(),
            base_call_surrogate: None,
            bound_base_methods: Vec::new(),
            span: parts.span,
        };
        Ok(self.push_method(method))
    }

    /// Types of the synthetic arguments of the configured weaving scheme
    pub fn enhancing_arg_types(&mut self) -> Result<Vec<TypeId>, SessionAbort> {
        let scheme = self.options.weaving_scheme;
        let int = self.primitive(BaseType::Int);
        let mut types = Vec::with_capacity(scheme.enhancing_arg_count());
        for arg in scheme.enhancing_args() {
            let ty = match arg {
                EnhancingArg::BaseArg => self.well_known_type(WellKnown::BoundBase)?,
                EnhancingArg::Teams => {
                    let team = self.well_known_type(WellKnown::Team)?;
                    self.intern(Type::Array(team))
                }
                EnhancingArg::Index | EnhancingArg::BoundMethodId => int,
                EnhancingArg::CallinIds => self.intern(Type::Array(int)),
                EnhancingArg::Args => {
                    let object = self.well_known_type(WellKnown::Object)?;
                    self.intern(Type::Array(object))
                }
            };
            types.push(ty);
        }
        Ok(types)
    }

    fn enhanced_signature(
        &mut self,
        params: &[TypeId],
        ret: TypeId,
    ) -> Result<Option<Signature>, SessionAbort> {
        if self.options.weaving_scheme.enhancing_arg_count() == 0 {
            return Ok(None);
        }
        let mut enhanced = self.enhancing_arg_types()?;
        enhanced.extend_from_slice(params);
        let ret = if ret == self.void() {
            ret
        } else {
            self.well_known_type(WellKnown::Object)?
        };
        Ok(Some(Signature {
            params: Rc::from(enhanced),
            ret,
        }))
    }

    // ── Descriptor signatures ───────────────────────────────────────────

    pub(crate) fn type_from_sig(
        &mut self,
        sig: &TypeSig,
        scope: &SigScope,
    ) -> Result<TypeId, SessionAbort> {
        match sig {
            TypeSig::Base(base) => Ok(self.primitive(*base)),
            TypeSig::Array(component) => {
                let component = self.type_from_sig(component, scope)?;
                Ok(self.intern(Type::Array(component)))
            }
            TypeSig::Var(name) => self.type_var_from_sig(name, scope),
            TypeSig::Class(class) => self.class_type_from_sig(class, scope),
        }
    }

    fn type_var_from_sig(&mut self, name: &str, scope: &SigScope) -> Result<TypeId, SessionAbort> {
        for var in &scope.method_vars {
            if self.type_var(*var).name == name {
                return Ok(self.type_var(*var).declared_type);
            }
        }
        for owner in self.enclosing_chain(scope.owner) {
            let vars = self.type_variables(owner)?;
            if let Some(var) = vars.iter().find(|v| self.type_var(**v).name == name) {
                return Ok(self.type_var(*var).declared_type);
            }
        }
        Ok(self.problem_type(name, ProblemReason::NotFound))
    }

    pub(crate) fn class_type_from_sig(
        &mut self,
        class: &ClassTypeSig,
        scope: &SigScope,
    ) -> Result<TypeId, SessionAbort> {
        let mut name = String::new();
        let mut current: Option<TypeId> = None;
        for segment in &class.segments {
            if !name.is_empty() {
                name.push('$');
            }
            name.push_str(&segment.name);
            let binding = self.get_type_or_problem(&name)?;
            let mut args = Vec::with_capacity(segment.args.len());
            for arg in &segment.args {
                args.push(self.type_arg_from_sig(arg, scope)?);
            }
            let enclosing =
                current.filter(|e| matches!(self.ty(*e), Type::Parameterized { .. }));
            current = Some(self.instantiate(binding, args, enclosing));
        }
        current.ok_or_else(|| SessionAbort::Internal("class signature without segments".to_string()))
    }

    fn type_arg_from_sig(&mut self, arg: &TypeArgSig, scope: &SigScope) -> Result<TypeId, SessionAbort> {
        let (kind, bound) = match arg {
            TypeArgSig::Exact(sig) => return self.type_from_sig(sig, scope),
            TypeArgSig::Any => (WildcardKind::Unbounded, None),
            TypeArgSig::Extends(sig) => (WildcardKind::Extends, Some(self.type_from_sig(sig, scope)?)),
            TypeArgSig::Super(sig) => (WildcardKind::Super, Some(self.type_from_sig(sig, scope)?)),
        };
        Ok(self.intern(Type::Wildcard { kind, bound }))
    }
}
