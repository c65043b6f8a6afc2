//! Implicit inheritance between same-named roles of related teams
//!
//! When team `T2 extends T1`, a role `T2.R` implicitly inherits everything
//! `T1.R` declares: its tsuper role. Members the sub role does not declare
//! itself are copied into it, with every reference to a role of `T1`
//! rebound to the same-named role of `T2`. Members the sub role does declare
//! override the tsuper versions, which are recorded on the overriding
//! method.

use std::rc::Rc;

use roleweave_diagnostics::id::{CALLIN_OVERRIDES_REGULAR, TSUPER_RETURN_MISMATCH};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::binding::{FieldBinding, FieldOrigin, MethodOrigin};
use crate::environment::LookupEnvironment;
use crate::error::{Component, SessionAbort};
use crate::ids::{BindingId, FieldId, MethodId, TypeId};
use crate::lazy::Lazy;
use crate::names;
use crate::resolve::MethodParts;
use crate::types::Type;

impl LookupEnvironment {
    /// Same-named roles of the super-teams of `role`'s team, nearest first
    pub fn tsuper_roles(&mut self, role: BindingId) -> Result<Rc<[BindingId]>, SessionAbort> {
        let Some(model) = &self.binding(role).role else {
            return Ok(Rc::from(Vec::new()));
        };
        let team = model.team;
        match &model.tsuper_roles {
            Lazy::Resolved(list) => return Ok(list.clone()),
            Lazy::InProgress => return Err(self.reentrant(role, Component::TsuperRoles)),
            Lazy::Unresolved => {}
        }
        self.set_tsuper_roles(role, Lazy::InProgress);
        debug!(binding = %self.binding(role).name, "resolving tsuper roles");

        let simple = self.binding(role).simple_name.clone();
        let mut found = Vec::new();
        let mut visited = FxHashSet::default();
        let mut current = self.superclass(team)?.and_then(|s| self.binding_of_type(s));
        while let Some(super_team) = current {
            if !visited.insert(super_team) || !self.binding(super_team).is_team() {
                break;
            }
            let members = self.member_types(super_team)?;
            if let Some(tsuper) = members
                .iter()
                .copied()
                .find(|m| self.binding(*m).simple_name == simple && *m != role)
            {
                found.push(tsuper);
            }
            current = self.superclass(super_team)?.and_then(|s| self.binding_of_type(s));
        }

        let list: Rc<[BindingId]> = Rc::from(found);
        self.set_tsuper_roles(role, Lazy::Resolved(list.clone()));
        Ok(list)
    }

    fn set_tsuper_roles(&mut self, role: BindingId, state: Lazy<Rc<[BindingId]>>) {
        if let Some(model) = self.binding_mut(role).role.as_mut() {
            model.tsuper_roles = state;
        }
    }

    /// Role of `team` a role of a super-team corresponds to
    fn rebind_role(&mut self, role: BindingId, team: BindingId) -> Result<BindingId, SessionAbort> {
        let Some(model) = &self.binding(role).role else {
            return Ok(role);
        };
        if model.team == team {
            return Ok(role);
        }
        let simple = self.binding(role).simple_name.clone();
        let members = self.member_types(team)?;
        Ok(members
            .iter()
            .copied()
            .find(|m| self.binding(*m).simple_name == simple)
            .unwrap_or(role))
    }

    /// `ty` with role types of super-teams replaced by the roles of `team`
    pub(crate) fn rebind_role_type(&mut self, ty: TypeId, team: BindingId) -> Result<TypeId, SessionAbort> {
        match self.ty(ty).clone() {
            Type::Declared(b) => {
                let rebound = self.rebind_role(b, team)?;
                Ok(self.binding(rebound).declared_type)
            }
            Type::Array(component) => {
                let component = self.rebind_role_type(component, team)?;
                Ok(self.intern(Type::Array(component)))
            }
            Type::Anchored { role, anchor } => {
                let role = self.rebind_role_type(role, team)?;
                Ok(self.intern(Type::Anchored { role, anchor }))
            }
            _ => Ok(ty),
        }
    }

    fn team_of(&self, role: BindingId) -> Result<BindingId, SessionAbort> {
        self.binding(role)
            .role
            .as_ref()
            .map(|model| model.team)
            .ok_or_else(|| SessionAbort::Internal(format!("'{}' is not a role", self.binding(role).name)))
    }

    pub(crate) fn copy_inherited_fields(
        &mut self,
        role: BindingId,
        list: &mut Vec<FieldId>,
    ) -> Result<(), SessionAbort> {
        let team = self.team_of(role)?;
        for tsuper in self.tsuper_roles(role)?.iter().copied() {
            for field in self.fields(tsuper)?.iter().copied() {
                let name = self.field(field).name.clone();
                if list.iter().any(|f| self.field(*f).name == name) {
                    continue;
                }
                let source = self.field(field).clone();
                let ty = self.rebind_role_type(source.ty, team)?;
                let copy = self.push_field(FieldBinding {
                    id: FieldId::from_index(0),
                    name,
                    modifiers: source.modifiers,
                    declaring: role,
                    ty,
                    pending_anchor: source.pending_anchor,
                    origin: FieldOrigin::Copied,
                    copy_inheritance_src: Some(field),
                    span: source.span,
                });
                list.push(copy);
            }
        }
        Ok(())
    }

    pub(crate) fn copy_inherited_methods(
        &mut self,
        role: BindingId,
        list: &mut Vec<MethodId>,
    ) -> Result<(), SessionAbort> {
        let team = self.team_of(role)?;
        for tsuper in self.tsuper_roles(role)?.iter().copied() {
            for inherited in self.methods(tsuper)?.iter().copied() {
                let source = self.method(inherited).clone();
                if names::is_surrogate_name(&source.name) || source.is_constructor() {
                    continue;
                }
                let mut params = Vec::with_capacity(source.declared.params.len());
                for param in source.declared.params.iter() {
                    params.push(self.rebind_role_type(*param, team)?);
                }
                let ret = self.rebind_role_type(source.declared.ret, team)?;

                let existing = list.iter().copied().find(|m| {
                    let m = self.method(*m);
                    m.name == source.name && self.params_erasure_eq(&m.declared.params, &params)
                });
                match existing {
                    Some(own) if !matches!(self.method(own).origin, MethodOrigin::Copied) => {
                        self.record_tsuper_override(own, inherited, ret)?;
                    }
                    Some(_) => {}
                    None => {
                        let copy = self.add_method(MethodParts {
                            name: source.name.clone(),
                            modifiers: source.modifiers,
                            declaring: role,
                            type_variables: source.type_variables.clone(),
                            params,
                            ret,
                            exceptions: source.exceptions.to_vec(),
                            origin: MethodOrigin::Copied,
                            span: source.span,
                        })?;
                        self.method_mut(copy).copy_inheritance_src = Some(inherited);
                        list.push(copy);
                    }
                }
            }
        }
        Ok(())
    }

    fn record_tsuper_override(
        &mut self,
        own: MethodId,
        inherited: MethodId,
        inherited_ret: TypeId,
    ) -> Result<(), SessionAbort> {
        if !self.method(own).overridden_tsupers.contains(&inherited) {
            self.method_mut(own).overridden_tsupers.push(inherited);
        }
        let declaring = self.method(own).declaring;
        let span = self.method(own).span;
        if self.method(own).is_callin() != self.method(inherited).is_callin() {
            let args = [self.method_display(own), self.method_display(inherited)];
            self.report_for(declaring, CALLIN_OVERRIDES_REGULAR, span, args);
        }
        let own_ret = self.method(own).declared.ret;
        if !self.erasure_eq(own_ret, inherited_ret) && !self.is_subtype(own_ret, inherited_ret)? {
            let args = [
                self.method_display(own),
                self.type_name(own_ret),
                self.type_name(inherited_ret),
            ];
            self.report_for(declaring, TSUPER_RETURN_MISMATCH, span, args);
        }
        Ok(())
    }

    pub(crate) fn params_erasure_eq(&self, a: &[TypeId], b: &[TypeId]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.erasure_eq(*x, *y))
    }

    /// Method a copy was made from, following copies of copies to the
    /// declaration
    pub fn copy_inheritance_origin(&self, method: MethodId) -> MethodId {
        let mut current = method;
        let mut hops = 0;
        while let Some(src) = self.method(current).copy_inheritance_src {
            current = src;
            hops += 1;
            if hops > self.methods.len() {
                break;
            }
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use roleweave_descriptor::Modifier;
    use roleweave_diagnostics::id::{CALLIN_OVERRIDES_REGULAR, TSUPER_RETURN_MISMATCH};
    use roleweave_diagnostics::Span;

    use crate::binding::{FieldOrigin, MethodOrigin};
    use crate::config::BinderOptions;
    use crate::decl::{CompilationUnitDecl, FieldDecl, MethodDecl, ParamDecl, TypeDecl, TypeSpec};
    use crate::environment::LookupEnvironment;
    use crate::provider::InMemoryProvider;
    use crate::types::Type;

    fn env() -> LookupEnvironment {
        let options = BinderOptions::default();
        let provider = InMemoryProvider::with_core(&options.well_known);
        LookupEnvironment::new(Box::new(provider), options).unwrap()
    }

    fn unit(file: &str, types: Vec<TypeDecl>) -> CompilationUnitDecl {
        CompilationUnitDecl {
            file_name: file.to_string(),
            package: "p".to_string(),
            team_package: None,
            imports: Vec::new(),
            types,
            source: None,
        }
    }

    fn team(name: &str, parent: Option<&str>, roles: Vec<TypeDecl>) -> TypeDecl {
        let mut team = TypeDecl::class(name);
        team.modifiers.push(Modifier::Team);
        team.superclass = parent.map(TypeSpec::named);
        team.member_types = roles;
        team
    }

    fn method(name: &str, param: Option<&str>, ret: Option<&str>, callin: bool) -> MethodDecl {
        MethodDecl {
            name: name.to_string(),
            modifiers: if callin { vec![Modifier::Callin] } else { Vec::new() },
            type_params: Vec::new(),
            params: param
                .map(|ty| ParamDecl {
                    name: "a".to_string(),
                    ty: TypeSpec::named(ty),
                })
                .into_iter()
                .collect(),
            return_type: ret.map(TypeSpec::named),
            exceptions: Vec::new(),
            body_flow: None,
            span: Span::none(),
        }
    }

    /// `T1 { R { Other peer; void greet(Other o); void wave(); }  Other }`
    /// and `T2 extends T1 { R { void wave(); }  Other }`
    fn build() -> LookupEnvironment {
        let mut env = env();
        let mut r1 = TypeDecl::class("R");
        r1.fields.push(FieldDecl {
            name: "peer".to_string(),
            modifiers: Vec::new(),
            ty: TypeSpec::named("Other"),
            span: Span::none(),
        });
        r1.methods.push(method("greet", Some("Other"), None, false));
        r1.methods.push(method("wave", None, None, false));
        let mut r2 = TypeDecl::class("R");
        r2.methods.push(method("wave", None, None, false));
        env.build_unit(unit("T1.rw", vec![team("T1", None, vec![r1, TypeDecl::class("Other")])]))
            .unwrap();
        env.build_unit(unit(
            "T2.rw",
            vec![team("T2", Some("T1"), vec![r2, TypeDecl::class("Other")])],
        ))
        .unwrap();
        env
    }

    #[test]
    fn test_tsuper_roles_nearest_first() {
        let mut env = build();
        let t3 = team("T3", Some("T2"), vec![TypeDecl::class("R")]);
        env.build_unit(unit("T3.rw", vec![t3])).unwrap();
        let r1 = env.lookup_binding("p.T1$R").unwrap();
        let r2 = env.lookup_binding("p.T2$R").unwrap();
        let r3 = env.lookup_binding("p.T3$R").unwrap();
        assert_eq!(env.tsuper_roles(r3).unwrap().as_ref(), &[r2, r1]);
        assert!(env.tsuper_roles(r1).unwrap().is_empty());
    }

    #[test]
    fn test_members_are_copied_and_rebound() {
        let mut env = build();
        let r2 = env.lookup_binding("p.T2$R").unwrap();
        let other2 = env.lookup_binding("p.T2$Other").unwrap();

        let fields = env.fields(r2).unwrap();
        let peer = env.field(fields[0]);
        assert!(matches!(peer.origin(), FieldOrigin::Copied));
        assert_eq!(env.ty(peer.ty()), &Type::Declared(other2));

        let methods = env.methods(r2).unwrap();
        let greet = methods
            .iter()
            .copied()
            .find(|m| env.method(*m).name() == "greet")
            .unwrap();
        assert!(matches!(env.method(greet).origin(), MethodOrigin::Copied));
        let param = env.method(greet).declared_signature().params[0];
        assert_eq!(env.ty(param), &Type::Declared(other2));
        let src = env.method(greet).copy_inheritance_src().unwrap();
        assert_eq!(env.copy_inheritance_origin(greet), src);
        assert_eq!(env.method(src).declaring(), env.lookup_binding("p.T1$R").unwrap());
    }

    #[test]
    fn test_own_method_records_override() {
        let mut env = build();
        let r2 = env.lookup_binding("p.T2$R").unwrap();
        let methods = env.methods(r2).unwrap();
        let waves: Vec<_> = methods
            .iter()
            .copied()
            .filter(|m| env.method(*m).name() == "wave")
            .collect();
        assert_eq!(waves.len(), 1);
        assert!(matches!(env.method(waves[0]).origin(), MethodOrigin::Source(_)));
        assert_eq!(env.method(waves[0]).overridden_tsupers().len(), 1);
    }

    #[test]
    fn test_origin_follows_multiple_hops() {
        let mut env = build();
        env.build_unit(unit("T3.rw", vec![team("T3", Some("T2"), vec![TypeDecl::class("R")])]))
            .unwrap();
        let r3 = env.lookup_binding("p.T3$R").unwrap();
        let greet = env
            .methods(r3)
            .unwrap()
            .iter()
            .copied()
            .find(|m| env.method(*m).name() == "greet")
            .unwrap();
        let origin = env.copy_inheritance_origin(greet);
        assert!(matches!(env.method(origin).origin(), MethodOrigin::Source(_)));
        assert_ne!(env.method(greet).copy_inheritance_src(), Some(origin));
    }

    #[test]
    fn test_override_mismatches() {
        let mut env = env();
        let mut r1 = TypeDecl::class("R");
        r1.methods.push(method("run", None, None, false));
        r1.methods.push(method("size", None, Some("core.String"), false));
        let mut r2 = TypeDecl::class("R");
        r2.methods.push(method("run", None, None, true));
        r2.methods.push(method("size", None, Some("core.Team"), false));
        env.build_unit(unit("T1.rw", vec![team("T1", None, vec![r1])])).unwrap();
        env.build_unit(unit("T2.rw", vec![team("T2", Some("T1"), vec![r2])])).unwrap();
        let r2 = env.lookup_binding("p.T2$R").unwrap();
        env.methods(r2).unwrap();
        assert!(env.diagnostics().has(CALLIN_OVERRIDES_REGULAR));
        assert!(env.diagnostics().has(TSUPER_RETURN_MISMATCH));
    }
}
