//! Resolution of source callin and callout declarations
//!
//! Callin arguments flow from base to role, so base parameters must lift
//! to the role parameters, and a replace result flows back and must lower.
//! Callout arguments flow from role to base and lower; the base result
//! lifts back. Role parameters are compared in the role method's source
//! view so the synthetic arguments of an enhanced callin never take part.

use roleweave_descriptor::{CallinKind, CalloutKind, Modifiers};
use roleweave_diagnostics::id::{
    AMBIGUOUS_CALLIN_BASE_METHOD, AMBIGUOUS_CALLOUT_METHOD, AMBIGUOUS_METHOD,
    CALLIN_METHOD_BOUND_NON_REPLACE, CALLIN_PARAMETER_MISMATCH, CALLIN_RETURN_MISMATCH,
    CALLOUT_DECAPSULATION, CALLOUT_OVERRIDES_WITHOUT_FLAG, CALLOUT_PARAMETER_MISMATCH,
    CALLOUT_RETURN_MISMATCH, CALLOUT_SETTER_TO_FINAL_FIELD, CALLOUT_TO_FIELD_TYPE_MISMATCH,
    MAPPING_IN_UNBOUND_ROLE, PARAMETER_MAPPING_ON_FIELD_ACCESS, REPLACE_NEEDS_CALLIN_METHOD,
    UNDEFINED_METHOD, UNRESOLVED_CALLIN_BASE_METHOD, UNRESOLVED_CALLIN_ROLE_METHOD,
    UNRESOLVED_CALLOUT_FIELD, UNRESOLVED_CALLOUT_METHOD,
};
use roleweave_diagnostics::{ProblemId, Span};

use super::{MappingKind, MethodMapping};
use crate::binding::MethodOrigin;
use crate::decl::{CallinDecl, CalloutDecl, MethodSpec, ParamMapping, TypeDecl};
use crate::environment::LookupEnvironment;
use crate::error::SessionAbort;
use crate::ids::{BindingId, MappingId, MethodId, TypeId, UnitId};
use crate::scope::LookupSite;

/// Problems reported when a method spec selects zero or several methods
struct SelectProblems {
    missing: ProblemId,
    ambiguous: ProblemId,
}

const ROLE_CALLIN: SelectProblems = SelectProblems {
    missing: UNRESOLVED_CALLIN_ROLE_METHOD,
    ambiguous: AMBIGUOUS_METHOD,
};
const ROLE_CALLOUT: SelectProblems = SelectProblems {
    missing: UNDEFINED_METHOD,
    ambiguous: AMBIGUOUS_METHOD,
};
const BASE_CALLIN: SelectProblems = SelectProblems {
    missing: UNRESOLVED_CALLIN_BASE_METHOD,
    ambiguous: AMBIGUOUS_CALLIN_BASE_METHOD,
};
const BASE_CALLOUT: SelectProblems = SelectProblems {
    missing: UNRESOLVED_CALLOUT_METHOD,
    ambiguous: AMBIGUOUS_CALLOUT_METHOD,
};

impl LookupEnvironment {
    pub(super) fn source_mappings(
        &mut self,
        role: BindingId,
        decl: &TypeDecl,
        unit: UnitId,
    ) -> Result<Vec<MappingId>, SessionAbort> {
        if decl.callins.is_empty() && decl.callouts.is_empty() {
            return Ok(Vec::new());
        }
        let base = match self.base_class(role)? {
            Some(base) if !self.is_problem_type(base) => self.binding_of_type(base),
            Some(_) => return Ok(Vec::new()),
            None => None,
        };
        let Some(base) = base else {
            let span = decl.span;
            self.report_in_unit(unit, MAPPING_IN_UNBOUND_ROLE, span, [self.binding(role).name.clone()]);
            return Ok(Vec::new());
        };

        let mut list = Vec::with_capacity(decl.callins.len() + decl.callouts.len());
        for (index, callin) in decl.callins.iter().enumerate() {
            let mapping = self.resolve_callin(role, base, unit, index, callin)?;
            list.push(self.push_mapping(mapping));
        }
        for (index, callout) in decl.callouts.iter().enumerate() {
            let mapping = self.resolve_callout(role, base, unit, index, callout)?;
            list.push(self.push_mapping(mapping));
        }
        Ok(list)
    }

    // ── Callin ──────────────────────────────────────────────────────────

    fn resolve_callin(
        &mut self,
        role: BindingId,
        base: BindingId,
        unit: UnitId,
        index: usize,
        decl: &CallinDecl,
    ) -> Result<MethodMapping, SessionAbort> {
        let mut mapping = MethodMapping::new(role, MappingKind::Callin(decl.kind), index, decl.span);
        mapping.label = decl.label.clone();
        mapping.param_map = decl.param_mappings.clone();

        let role_site = LookupSite::body(self, role, unit).at(decl.span);
        let role_method = self.select_method(role, &decl.role_method, &role_site, &ROLE_CALLIN)?;
        if let Some(m) = role_method {
            let is_callin = self.method(m).is_callin();
            let problem = match decl.kind {
                CallinKind::Replace if !is_callin => Some(REPLACE_NEEDS_CALLIN_METHOD),
                CallinKind::Before | CallinKind::After if is_callin => Some(CALLIN_METHOD_BOUND_NON_REPLACE),
                _ => None,
            };
            if let Some(problem) = problem {
                self.report_in_unit(unit, problem, decl.span, [self.method_display(m)]);
            }
        }
        mapping.role_method = role_method;

        let mut base_site = LookupSite::body(self, role, unit).at(decl.span);
        base_site.base_context = true;
        for spec in &decl.base_methods {
            if let Some(b) = self.select_method(base, spec, &base_site, &BASE_CALLIN)? {
                if !mapping.base_methods.contains(&b) {
                    mapping.base_methods.push(b);
                }
            }
        }

        let Some(role_method) = role_method else {
            return Ok(mapping);
        };
        for b in mapping.base_methods.clone() {
            self.check_callin_signature(role_method, b, decl, unit)?;
        }

        if decl.kind == CallinKind::Replace && self.method(role_method).is_callin() {
            mapping.surrogate = self.method(role_method).base_call_surrogate;
            if let Some(surrogate) = mapping.surrogate {
                let bound = &mut self.method_mut(surrogate).bound_base_methods;
                for b in &mapping.base_methods {
                    if !bound.contains(b) {
                        bound.push(*b);
                    }
                }
            }
        }
        Ok(mapping)
    }

    fn check_callin_signature(
        &mut self,
        role_method: MethodId,
        base_method: MethodId,
        decl: &CallinDecl,
        unit: UnitId,
    ) -> Result<(), SessionAbort> {
        let (role_params, role_ret) = self.source_view_signature(role_method)?;
        let base_sig = self.method(base_method).declared_signature().clone();
        let shown = [self.method_display(role_method), self.method_display(base_method)];

        for (position, role_param) in role_params.iter().copied().enumerate() {
            let base_position = mapped_position(&decl.param_mappings, position);
            let fits = match base_sig.params.get(base_position) {
                Some(base_param) => self.can_lift(*base_param, role_param)?,
                None => false,
            };
            if !fits {
                let args = [shown[0].clone(), shown[1].clone(), (position + 1).to_string()];
                self.report_in_unit(unit, CALLIN_PARAMETER_MISMATCH, decl.span, args);
            }
        }

        if decl.kind == CallinKind::Replace && base_sig.ret != self.void() {
            let fits = role_ret != self.void() && self.can_lower(role_ret, base_sig.ret)?;
            if !fits {
                let args = [shown[0].clone(), shown[1].clone(), self.type_name(base_sig.ret)];
                self.report_in_unit(unit, CALLIN_RETURN_MISMATCH, decl.span, args);
            }
        }
        Ok(())
    }

    /// Parameters and return type of `method` as declared in source,
    /// read through the source view when the method has two views
    fn source_view_signature(&mut self, method: MethodId) -> Result<(Vec<TypeId>, TypeId), SessionAbort> {
        if !self.method(method).has_views() {
            let m = self.method(method);
            return Ok((m.parameters().to_vec(), m.return_type()));
        }
        self.method_mut(method).enter_source_view()?;
        let m = self.method(method);
        let signature = (m.parameters().to_vec(), m.return_type());
        self.method_mut(method).exit_source_view()?;
        Ok(signature)
    }

    // ── Callout ─────────────────────────────────────────────────────────

    fn resolve_callout(
        &mut self,
        role: BindingId,
        base: BindingId,
        unit: UnitId,
        index: usize,
        decl: &CalloutDecl,
    ) -> Result<MethodMapping, SessionAbort> {
        let mut mapping = MethodMapping::new(role, MappingKind::Callout(decl.kind), index, decl.span);
        mapping.is_override = decl.is_override;
        mapping.param_map = decl.param_mappings.clone();

        let role_site = LookupSite::body(self, role, unit).at(decl.span);
        let role_method = self.select_method(role, &decl.role_method, &role_site, &ROLE_CALLOUT)?;
        if let Some(m) = role_method {
            let method = self.method(m);
            let implemented = !method.modifiers.contains(Modifiers::ABSTRACT)
                && !matches!(method.origin, MethodOrigin::ShortCallout);
            if implemented && !decl.is_override {
                self.report_in_unit(unit, CALLOUT_OVERRIDES_WITHOUT_FLAG, decl.span, [self.method_display(m)]);
            }
        }
        mapping.role_method = role_method;

        match decl.kind {
            CalloutKind::Method => {
                let mut base_site = LookupSite::body(self, role, unit).at(decl.span);
                base_site.base_context = true;
                let Some(b) = self.select_method(base, &decl.base, &base_site, &BASE_CALLOUT)? else {
                    return Ok(mapping);
                };
                mapping.base_methods.push(b);
                if !self.member_visible(self.method(b).modifiers, self.method(b).declaring, unit) {
                    let args = [self.method_display(b), self.binding(role).name.clone()];
                    self.report_in_unit(unit, CALLOUT_DECAPSULATION, decl.span, args);
                }
                if let Some(m) = role_method {
                    self.check_callout_signature(m, b, decl, unit)?;
                }
            }
            CalloutKind::Get | CalloutKind::Set => {
                mapping.base_field = self.resolve_field_callout(role, base, role_method, decl, unit)?;
            }
        }
        Ok(mapping)
    }

    fn check_callout_signature(
        &mut self,
        role_method: MethodId,
        base_method: MethodId,
        decl: &CalloutDecl,
        unit: UnitId,
    ) -> Result<(), SessionAbort> {
        let (role_params, role_ret) = self.source_view_signature(role_method)?;
        let base_sig = self.method(base_method).declared_signature().clone();
        let shown = [self.method_display(role_method), self.method_display(base_method)];

        let mut supplied = vec![false; base_sig.params.len()];
        for (position, role_param) in role_params.iter().copied().enumerate() {
            let base_position = mapped_position(&decl.param_mappings, position);
            let fits = match base_sig.params.get(base_position) {
                Some(base_param) => {
                    supplied[base_position] = true;
                    self.can_lower(role_param, *base_param)?
                }
                // surplus role arguments are ignored when mapped explicitly
                None => !decl.param_mappings.is_empty(),
            };
            if !fits {
                let args = [shown[0].clone(), shown[1].clone(), (position + 1).to_string()];
                self.report_in_unit(unit, CALLOUT_PARAMETER_MISMATCH, decl.span, args);
            }
        }
        if let Some(missing) = supplied.iter().position(|s| !s) {
            let args = [shown[0].clone(), shown[1].clone(), (missing + 1).to_string()];
            self.report_in_unit(unit, CALLOUT_PARAMETER_MISMATCH, decl.span, args);
        }

        if role_ret != self.void() {
            let fits = base_sig.ret != self.void() && self.can_lift(base_sig.ret, role_ret)?;
            if !fits {
                let args = [shown[0].clone(), shown[1].clone(), self.type_name(role_ret)];
                self.report_in_unit(unit, CALLOUT_RETURN_MISMATCH, decl.span, args);
            }
        }
        Ok(())
    }

    fn resolve_field_callout(
        &mut self,
        role: BindingId,
        base: BindingId,
        role_method: Option<MethodId>,
        decl: &CalloutDecl,
        unit: UnitId,
    ) -> Result<Option<crate::ids::FieldId>, SessionAbort> {
        if !decl.param_mappings.is_empty() {
            let name = decl.role_method.name.clone();
            self.report_in_unit(unit, PARAMETER_MAPPING_ON_FIELD_ACCESS, decl.span, [name]);
        }
        let Some(field) = self.find_field(base, &decl.base.name)? else {
            let args = [decl.base.name.clone(), self.binding(base).name.clone()];
            self.report_in_unit(unit, UNRESOLVED_CALLOUT_FIELD, decl.span, args);
            return Ok(None);
        };
        let field_ty = self.field_type(field)?;
        let field_name = self.field(field).name.clone();
        if !self.member_visible(self.field(field).modifiers, self.field(field).declaring, unit) {
            let args = [field_name.clone(), self.binding(role).name.clone()];
            self.report_in_unit(unit, CALLOUT_DECAPSULATION, decl.span, args);
        }
        if decl.kind == CalloutKind::Set && self.field(field).is_final() {
            self.report_in_unit(unit, CALLOUT_SETTER_TO_FINAL_FIELD, decl.span, [field_name.clone()]);
        }

        let Some(role_method) = role_method else {
            return Ok(Some(field));
        };
        let (params, ret) = self.source_view_signature(role_method)?;
        let fits = match (decl.kind, params.as_slice()) {
            (CalloutKind::Get, []) => ret == self.void() || self.can_lift(field_ty, ret)?,
            (CalloutKind::Set, [value]) => self.can_lower(*value, field_ty)?,
            _ => false,
        };
        if !fits {
            let args = [self.method_display(role_method), field_name, self.type_name(field_ty)];
            self.report_in_unit(unit, CALLOUT_TO_FIELD_TYPE_MISMATCH, decl.span, args);
        }
        Ok(Some(field))
    }

    // ── Shared ──────────────────────────────────────────────────────────

    /// The one method of `owner` a spec designates, reporting absence or
    /// ambiguity
    fn select_method(
        &mut self,
        owner: BindingId,
        spec: &MethodSpec,
        site: &LookupSite,
        problems: &SelectProblems,
    ) -> Result<Option<MethodId>, SessionAbort> {
        let candidates: Vec<MethodId> = self
            .find_methods(owner, &spec.name)?
            .into_iter()
            .filter(|m| !self.method(*m).is_synthetic())
            .collect();
        let selected = match &spec.params {
            None => candidates,
            Some(specs) => {
                let mut wanted = Vec::with_capacity(specs.len());
                for param in specs {
                    wanted.push(self.resolve_type_spec(param, site)?);
                }
                candidates
                    .into_iter()
                    .filter(|m| {
                        let declared = &self.method(*m).declared.params;
                        declared.len() == wanted.len()
                            && declared.iter().zip(&wanted).all(|(d, w)| self.erasure_eq(*d, *w))
                    })
                    .collect()
            }
        };
        match selected.as_slice() {
            [one] => Ok(Some(*one)),
            [] => {
                let args = [spec.name.clone(), self.binding(owner).name.clone()];
                self.report_in_unit(site.unit, problems.missing, site.span, args);
                Ok(None)
            }
            _ => {
                let args = [spec.name.clone(), self.binding(owner).name.clone()];
                self.report_in_unit(site.unit, problems.ambiguous, site.span, args);
                Ok(None)
            }
        }
    }

    /// Whether a member with these modifiers may be accessed from `unit`
    /// without decapsulation
    fn member_visible(&self, modifiers: Modifiers, declaring: BindingId, unit: UnitId) -> bool {
        if modifiers.is_public() {
            return self.is_visible_from(declaring, unit, None);
        }
        if modifiers.is_private() {
            return false;
        }
        self.binding(self.outermost(declaring)).package == self.unit(unit).package()
    }
}

/// Base position a role position maps to
fn mapped_position(mappings: &[ParamMapping], role_position: usize) -> usize {
    mappings
        .iter()
        .find(|m| m.role == role_position)
        .map(|m| m.base)
        .unwrap_or(role_position)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use roleweave_descriptor::{BaseType, CallinKind, CalloutKind, Modifier};
    use roleweave_diagnostics::id::{
        CALLIN_METHOD_BOUND_NON_REPLACE, CALLIN_PARAMETER_MISMATCH, CALLIN_RETURN_MISMATCH,
        CALLOUT_DECAPSULATION, CALLOUT_OVERRIDES_WITHOUT_FLAG, CALLOUT_PARAMETER_MISMATCH,
        CALLOUT_SETTER_TO_FINAL_FIELD, MAPPING_IN_UNBOUND_ROLE, REPLACE_NEEDS_CALLIN_METHOD,
        UNRESOLVED_CALLIN_BASE_METHOD, UNRESOLVED_CALLOUT_FIELD,
    };
    use roleweave_diagnostics::Span;

    use crate::config::BinderOptions;
    use crate::decl::{
        CallinDecl, CalloutDecl, CompilationUnitDecl, FieldDecl, MethodDecl, MethodSpec,
        ParamDecl, ParamMapping, TypeDecl, TypeSpec,
    };
    use crate::environment::LookupEnvironment;
    use crate::mapping::MappingKind;
    use crate::provider::InMemoryProvider;

    fn env() -> LookupEnvironment {
        let options = BinderOptions::default();
        let provider = InMemoryProvider::with_core(&options.well_known);
        LookupEnvironment::new(Box::new(provider), options).unwrap()
    }

    fn ty(name: &str) -> TypeSpec {
        match BaseType::from_keyword(name) {
            Some(_) => TypeSpec::primitive(name),
            None => TypeSpec::named(name),
        }
    }

    fn method(name: &str, params: &[&str], ret: Option<&str>, modifiers: Vec<Modifier>) -> MethodDecl {
        MethodDecl {
            name: name.to_string(),
            modifiers,
            params: params
                .iter()
                .enumerate()
                .map(|(i, name)| ParamDecl {
                    name: format!("a{}", i),
                    ty: ty(name),
                })
                .collect(),
            return_type: ret.map(ty),
            ..MethodDecl::default()
        }
    }

    fn callin(role_method: &str, kind: CallinKind, base: &str) -> CallinDecl {
        CallinDecl {
            label: None,
            role_method: MethodSpec::by_name(role_method),
            kind,
            base_methods: vec![MethodSpec::by_name(base)],
            param_mappings: Vec::new(),
            span: Span::none(),
        }
    }

    fn callout(role_method: &str, kind: CalloutKind, base: &str) -> CalloutDecl {
        CalloutDecl {
            role_method: MethodSpec::by_name(role_method),
            kind,
            base: MethodSpec::by_name(base),
            is_override: false,
            param_mappings: Vec::new(),
            span: Span::none(),
        }
    }

    /// `p.Account` with `void pay(int)`, `int balance()`, private
    /// `void audit()`, `void move(int, boolean)`, a final `id` field and a
    /// private `secret` field
    fn account() -> TypeDecl {
        let mut account = TypeDecl::class("Account");
        account.methods = vec![
            method("pay", &["int"], None, vec![Modifier::Public]),
            method("balance", &[], Some("int"), vec![Modifier::Public]),
            method("audit", &[], None, vec![Modifier::Private]),
            method("move", &["int", "boolean"], None, vec![Modifier::Public]),
        ];
        account.fields = vec![
            FieldDecl {
                name: "id".to_string(),
                modifiers: vec![Modifier::Public, Modifier::Final],
                ty: TypeSpec::primitive("int"),
                span: Span::none(),
            },
            FieldDecl {
                name: "secret".to_string(),
                modifiers: vec![Modifier::Private],
                ty: TypeSpec::primitive("int"),
                span: Span::none(),
            },
        ];
        account
    }

    fn build(env: &mut LookupEnvironment, role: TypeDecl) {
        let mut team = TypeDecl::class("Bank");
        team.modifiers.push(Modifier::Team);
        team.member_types.push(role);
        env.build_unit(CompilationUnitDecl {
            file_name: "Bank.rw".to_string(),
            package: "p".to_string(),
            team_package: None,
            imports: Vec::new(),
            types: vec![account(), team],
            source: None,
        })
        .unwrap();
    }

    fn bound_role() -> TypeDecl {
        let mut role = TypeDecl::class("R");
        role.played_by = Some(TypeSpec::named("Account"));
        role
    }

    #[test]
    fn test_callins_resolve_and_attach_surrogate() {
        let mut env = env();
        let mut role = bound_role();
        role.methods = vec![
            method("log", &["int"], None, Vec::new()),
            method("wrap", &["int"], None, vec![Modifier::Callin]),
        ];
        role.callins = vec![
            callin("log", CallinKind::Before, "pay"),
            callin("wrap", CallinKind::Replace, "pay"),
        ];
        build(&mut env, role);
        let r = env.lookup_binding("p.Bank$R").unwrap();
        let mappings = env.mappings(r).unwrap();
        assert_eq!(mappings.len(), 2);
        assert!(env.diagnostics().problems().is_empty(), "{:?}", env.diagnostics().problems());
        let replace = env.mapping(mappings[1]).clone();
        assert_eq!(replace.kind(), MappingKind::Callin(CallinKind::Replace));
        let surrogate = replace.surrogate().expect("replace callin has a surrogate");
        assert_eq!(env.method(surrogate).bound_base_methods(), replace.base_methods());
        assert!(Rc::ptr_eq(&mappings, &env.mappings(r).unwrap()));
    }

    #[test]
    fn test_callin_modifier_rules() {
        let mut env = env();
        let mut role = bound_role();
        role.methods = vec![
            method("plain", &["int"], None, Vec::new()),
            method("wrap", &["int"], None, vec![Modifier::Callin]),
        ];
        role.callins = vec![
            callin("plain", CallinKind::Replace, "pay"),
            callin("wrap", CallinKind::After, "pay"),
            callin("plain", CallinKind::Before, "missing"),
        ];
        build(&mut env, role);
        let r = env.lookup_binding("p.Bank$R").unwrap();
        env.mappings(r).unwrap();
        assert!(env.diagnostics().has(REPLACE_NEEDS_CALLIN_METHOD));
        assert!(env.diagnostics().has(CALLIN_METHOD_BOUND_NON_REPLACE));
        assert!(env.diagnostics().has(UNRESOLVED_CALLIN_BASE_METHOD));
    }

    #[test]
    fn test_callin_signature_checks_use_declared_view() {
        let mut env = env();
        let mut role = bound_role();
        role.methods = vec![
            method("wrap", &["int"], Some("boolean"), vec![Modifier::Callin]),
            method("narrow", &["boolean"], None, Vec::new()),
        ];
        role.callins = vec![
            callin("wrap", CallinKind::Replace, "balance"),
            callin("narrow", CallinKind::Before, "pay"),
        ];
        build(&mut env, role);
        let r = env.lookup_binding("p.Bank$R").unwrap();
        env.mappings(r).unwrap();
        // `wrap(int)` takes one more argument than `balance()` supplies
        assert_eq!(env.diagnostics().with_id(CALLIN_PARAMETER_MISMATCH).count(), 2);
        assert!(env.diagnostics().has(CALLIN_RETURN_MISMATCH));
        let wrap = env.find_methods(r, "wrap").unwrap()[0];
        assert_eq!(env.method(wrap).view_depth(), 0);
    }

    #[test]
    fn test_explicit_parameter_mapping() {
        let mut env = env();
        let mut role = bound_role();
        role.methods = vec![method("log", &["boolean"], None, Vec::new())];
        let mut mapped = callin("log", CallinKind::After, "move");
        mapped.param_mappings.push(ParamMapping { role: 0, base: 1 });
        role.callins = vec![mapped];
        build(&mut env, role);
        let r = env.lookup_binding("p.Bank$R").unwrap();
        env.mappings(r).unwrap();
        assert!(env.diagnostics().problems().is_empty(), "{:?}", env.diagnostics().problems());
    }

    #[test]
    fn test_callout_rules() {
        let mut env = env();
        let mut role = bound_role();
        role.methods = vec![
            method("charge", &["int"], None, Vec::new()),
            method("charge2", &["int", "int"], None, vec![Modifier::Abstract]),
        ];
        role.callouts = vec![
            callout("charge", CalloutKind::Method, "pay"),
            callout("charge2", CalloutKind::Method, "pay"),
            callout("check", CalloutKind::Method, "audit"),
            callout("setId", CalloutKind::Set, "id"),
            callout("peek", CalloutKind::Get, "secret"),
            callout("nothing", CalloutKind::Get, "nowhere"),
        ];
        build(&mut env, role);
        let r = env.lookup_binding("p.Bank$R").unwrap();
        let mappings = env.mappings(r).unwrap();
        assert_eq!(mappings.len(), 6);
        assert!(env.diagnostics().has(CALLOUT_OVERRIDES_WITHOUT_FLAG));
        assert!(env.diagnostics().has(CALLOUT_PARAMETER_MISMATCH));
        assert_eq!(env.diagnostics().with_id(CALLOUT_DECAPSULATION).count(), 2);
        assert!(env.diagnostics().has(CALLOUT_SETTER_TO_FINAL_FIELD));
        assert!(env.diagnostics().has(UNRESOLVED_CALLOUT_FIELD));
        let peek = env.mapping(mappings[4]).clone();
        assert!(peek.base_field().is_some());
    }

    #[test]
    fn test_mapping_in_unbound_role() {
        let mut env = env();
        let mut role = TypeDecl::class("R");
        role.methods = vec![method("log", &[], None, Vec::new())];
        role.callins = vec![callin("log", CallinKind::Before, "pay")];
        build(&mut env, role);
        let r = env.lookup_binding("p.Bank$R").unwrap();
        assert!(env.mappings(r).unwrap().is_empty());
        assert!(env.diagnostics().has(MAPPING_IN_UNBOUND_ROLE));
    }
}
