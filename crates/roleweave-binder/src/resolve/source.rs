//! Bindings declared in source
//!
//! Header references (`extends`, `implements`, type parameter bounds) are
//! resolved from the scope enclosing the declaration; member signatures are
//! resolved from inside the declaring type. A role callout whose role
//! method is not declared implicitly declares one (a short callout); its
//! signature is taken from the callout or from the bound base member.

use std::rc::Rc;

use roleweave_descriptor::{CalloutKind, Modifiers};
use roleweave_diagnostics::id::{CALLOUT_SIGNATURE_CYCLE, DUPLICATE_FIELD, DUPLICATE_METHOD};

use crate::binding::field::PendingAnchor;
use crate::binding::{FieldBinding, FieldOrigin, MethodOrigin, TypeVarOwner};
use crate::decl::{CalloutDecl, TypeDecl, TypeParamDecl, TypeSpec};
use crate::environment::LookupEnvironment;
use crate::error::SessionAbort;
use crate::ids::{BindingId, FieldId, MethodId, TypeId, TypeVarId, UnitId};
use crate::lazy::Lazy;
use crate::resolve::MethodParts;
use crate::scope::LookupSite;

impl LookupEnvironment {
    fn declaring_unit(&self, id: BindingId) -> Result<UnitId, SessionAbort> {
        self.binding(id).unit().ok_or_else(|| {
            SessionAbort::Internal(format!("'{}' has no declaring unit", self.binding(id).name))
        })
    }

    pub(crate) fn source_member_types(&self, id: BindingId, decl: &TypeDecl) -> Vec<BindingId> {
        let outer = &self.binding(id).name;
        decl.member_types
            .iter()
            .filter_map(|member| self.lookup_binding(&format!("{}${}", outer, member.name)))
            .filter(|member| self.binding(*member).enclosing == Some(id))
            .fold(Vec::new(), |mut list, member| {
                if !list.contains(&member) {
                    list.push(member);
                }
                list
            })
    }

    pub(crate) fn source_type_variables(
        &mut self,
        id: BindingId,
        decl: &TypeDecl,
    ) -> Result<Rc<[TypeVarId]>, SessionAbort> {
        let vars = self.create_type_vars(
            TypeVarOwner::Type(id),
            decl.type_params.iter().map(|p| p.name.as_str()),
        );
        let list: Rc<[TypeVarId]> = Rc::from(vars.clone());
        self.binding_mut(id).type_variables = Lazy::Resolved(list.clone());
        let site = LookupSite::header(self, id, self.declaring_unit(id)?);
        self.resolve_bounds(&vars, &decl.type_params, &site)?;
        Ok(list)
    }

    fn resolve_bounds(
        &mut self,
        vars: &[TypeVarId],
        params: &[TypeParamDecl],
        site: &LookupSite,
    ) -> Result<(), SessionAbort> {
        for (var, param) in vars.iter().zip(params) {
            let mut bounds = Vec::with_capacity(param.bounds.len());
            for bound in &param.bounds {
                bounds.push(self.resolve_type_spec(bound, site)?);
            }
            self.type_vars[var.index()].bounds = bounds;
        }
        Ok(())
    }

    pub(crate) fn source_supertype_candidates(
        &mut self,
        id: BindingId,
        decl: &TypeDecl,
    ) -> Result<(Option<TypeId>, Vec<TypeId>), SessionAbort> {
        let site = LookupSite::header(self, id, self.declaring_unit(id)?);
        let superclass = match &decl.superclass {
            Some(spec) if !self.binding(id).is_interface() => {
                Some(self.resolve_type_spec(spec, &site)?)
            }
            _ => self.default_superclass(id)?,
        };
        let mut interfaces = Vec::with_capacity(decl.interfaces.len());
        for spec in &decl.interfaces {
            interfaces.push(self.resolve_type_spec(spec, &site)?);
        }
        Ok((superclass, interfaces))
    }

    pub(crate) fn source_fields(
        &mut self,
        id: BindingId,
        decl: &TypeDecl,
    ) -> Result<Vec<FieldId>, SessionAbort> {
        let unit = self.declaring_unit(id)?;
        let interface = self.binding(id).is_interface();
        let mut list: Vec<FieldId> = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            if list.iter().any(|f| self.field(*f).name == field.name) {
                let args = [self.binding(id).name.clone(), field.name.clone()];
                self.report_in_unit(unit, DUPLICATE_FIELD, field.span, args);
                continue;
            }
            let site = LookupSite::body(self, id, unit).at(field.span);
            let ty = self.resolve_type_spec(&field.ty, &site)?;
            let pending_anchor = match &field.ty {
                TypeSpec::Anchored { role, anchor } => Some(PendingAnchor {
                    role: role.clone(),
                    path: anchor.split('.').map(str::to_string).collect(),
                }),
                _ => None,
            };
            let mut modifiers = Modifiers::from_keywords(&field.modifiers);
            if interface {
                modifiers.insert(Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL);
            }
            list.push(self.push_field(FieldBinding {
                id: FieldId::from_index(0),
                name: field.name.clone(),
                modifiers,
                declaring: id,
                ty,
                pending_anchor,
                origin: FieldOrigin::Source(Rc::new(field.clone())),
                copy_inheritance_src: None,
                span: field.span,
            }));
        }
        Ok(list)
    }

    pub(crate) fn source_methods(
        &mut self,
        id: BindingId,
        decl: &TypeDecl,
    ) -> Result<Vec<MethodId>, SessionAbort> {
        let unit = self.declaring_unit(id)?;
        let interface = self.binding(id).is_interface();
        let mut list: Vec<MethodId> = Vec::with_capacity(decl.methods.len());
        for method in &decl.methods {
            let vars = self.create_type_vars(
                TypeVarOwner::Method(id),
                method.type_params.iter().map(|p| p.name.as_str()),
            );
            let mut site = LookupSite::body(self, id, unit).at(method.span);
            site.method_vars = vars.clone();
            self.resolve_bounds(&vars, &method.type_params, &site)?;

            let mut params = Vec::with_capacity(method.params.len());
            for param in &method.params {
                params.push(self.resolve_type_spec(&param.ty, &site)?);
            }
            let ret = match &method.return_type {
                Some(spec) => self.resolve_type_spec(spec, &site)?,
                None => self.void(),
            };
            let mut exceptions = Vec::with_capacity(method.exceptions.len());
            for thrown in &method.exceptions {
                exceptions.push(self.resolve_type_spec(thrown, &site)?);
            }

            let mut modifiers = Modifiers::from_keywords(&method.modifiers);
            if interface {
                modifiers.insert(Modifiers::PUBLIC);
            }
            let created = self.add_method(MethodParts {
                name: method.name.clone(),
                modifiers,
                declaring: id,
                type_variables: Rc::from(vars),
                params,
                ret,
                exceptions,
                origin: MethodOrigin::Source(Rc::new(method.clone())),
                span: method.span,
            })?;
            let duplicate = list.iter().any(|existing| {
                self.method(*existing).name == method.name
                    && self.same_declared_erasure(*existing, created)
            });
            if duplicate {
                let args = [self.binding(id).name.clone(), method.name.clone()];
                self.report_in_unit(unit, DUPLICATE_METHOD, method.span, args);
                continue;
            }
            list.push(created);
        }

        if self.binding(id).is_role() {
            for callout in &decl.callouts {
                let declared = decl
                    .methods
                    .iter()
                    .any(|m| m.name == callout.role_method.name);
                let synthesized = list
                    .iter()
                    .any(|m| self.method(*m).name == callout.role_method.name);
                if declared || synthesized {
                    continue;
                }
                if let Some(short) = self.short_callout_method(id, unit, callout)? {
                    list.push(short);
                }
            }
        }
        Ok(list)
    }

    /// Role method implicitly declared by a callout without a declared
    /// role method
    fn short_callout_method(
        &mut self,
        role: BindingId,
        unit: UnitId,
        callout: &CalloutDecl,
    ) -> Result<Option<MethodId>, SessionAbort> {
        let site = LookupSite::body(self, role, unit).at(callout.span);
        let written_params = match &callout.role_method.params {
            Some(specs) => {
                let mut params = Vec::with_capacity(specs.len());
                for spec in specs {
                    params.push(self.resolve_type_spec(spec, &site)?);
                }
                Some(params)
            }
            None => None,
        };
        let written_ret = match &callout.role_method.return_type {
            Some(spec) => Some(self.resolve_type_spec(spec, &site)?),
            None => None,
        };

        let signature = match (written_params, written_ret) {
            (Some(params), Some(ret)) => Some((params, ret)),
            (written_params, written_ret) => {
                match self.base_member_signature(role, callout)? {
                    Some((params, ret)) => Some((
                        written_params.unwrap_or(params),
                        written_ret.unwrap_or(ret),
                    )),
                    None => None,
                }
            }
        };
        let Some((params, ret)) = signature else {
            return Ok(None);
        };
        let method = self.add_method(MethodParts {
            name: callout.role_method.name.clone(),
            modifiers: Modifiers::PUBLIC,
            declaring: role,
            type_variables: Rc::from(Vec::new()),
            params,
            ret,
            exceptions: Vec::new(),
            origin: MethodOrigin::ShortCallout,
            span: callout.span,
        })?;
        Ok(Some(method))
    }

    /// Signature a short callout takes over from the base member it binds
    fn base_member_signature(
        &mut self,
        role: BindingId,
        callout: &CalloutDecl,
    ) -> Result<Option<(Vec<TypeId>, TypeId)>, SessionAbort> {
        let Some(base) = self.base_class(role)? else {
            return Ok(None);
        };
        let Some(base) = self.binding_of_type(base) else {
            return Ok(None);
        };
        let void = self.void();
        match callout.kind {
            CalloutKind::Method => {
                if self.methods_in_progress(base)? {
                    let args = [callout.role_method.name.clone(), callout.base.name.clone()];
                    self.report_for(role, CALLOUT_SIGNATURE_CYCLE, callout.span, args);
                    return Ok(None);
                }
                let candidates = self.find_methods(base, &callout.base.name)?;
                let [only] = candidates.as_slice() else {
                    return Ok(None);
                };
                let signature = self.method(*only).declared_signature().clone();
                Ok(Some((signature.params.to_vec(), signature.ret)))
            }
            CalloutKind::Get | CalloutKind::Set => {
                let Some(field) = self.find_field(base, &callout.base.name)? else {
                    return Ok(None);
                };
                let ty = self.field_type(field)?;
                if callout.kind == CalloutKind::Get {
                    Ok(Some((Vec::new(), ty)))
                } else {
                    Ok(Some((vec![ty], void)))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use roleweave_diagnostics::id::{
        DUPLICATE_FIELD, DUPLICATE_METHOD, TYPE_ARGUMENT_MISMATCH, UNDEFINED_TYPE,
    };

    use crate::binding::MethodOrigin;
    use crate::config::BinderOptions;
    use crate::decl::{
        CalloutDecl, CompilationUnitDecl, FieldDecl, MethodDecl, MethodSpec, ParamDecl,
        TypeArgSpec, TypeDecl, TypeParamDecl, TypeSpec,
    };
    use crate::environment::LookupEnvironment;
    use crate::provider::InMemoryProvider;
    use crate::types::Type;
    use roleweave_descriptor::{CalloutKind, Modifier};
    use roleweave_diagnostics::Span;

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

    fn method(name: &str, params: Vec<TypeSpec>, ret: Option<TypeSpec>) -> MethodDecl {
        MethodDecl {
            name: name.to_string(),
            modifiers: vec![Modifier::Public],
            type_params: Vec::new(),
            params: params
                .into_iter()
                .enumerate()
                .map(|(i, ty)| ParamDecl {
                    name: format!("a{}", i),
                    ty,
                })
                .collect(),
            return_type: ret,
            exceptions: Vec::new(),
            body_flow: None,
            span: Span::none(),
        }
    }

    fn field(name: &str, ty: TypeSpec) -> FieldDecl {
        FieldDecl {
            name: name.to_string(),
            modifiers: Vec::new(),
            ty,
            span: Span::none(),
        }
    }

    #[test]
    fn test_member_signatures_resolve_in_body_scope() {
        let mut env = env();
        let mut outer = TypeDecl::class("Outer");
        let inner = TypeDecl::class("Inner");
        outer.member_types.push(inner);
        outer.fields.push(field("inner", TypeSpec::named("Inner")));
        outer
            .methods
            .push(method("make", vec![TypeSpec::primitive("int")], Some(TypeSpec::named("Inner"))));
        env.build_unit(unit("Outer.rw", vec![outer])).unwrap();
        let outer = env.lookup_binding("p.Outer").unwrap();
        let inner = env.lookup_binding("p.Outer$Inner").unwrap();

        let fields = env.fields(outer).unwrap();
        assert_eq!(env.ty(env.field(fields[0]).ty()), &Type::Declared(inner));
        let methods = env.methods(outer).unwrap();
        let make = env.method(methods[0]);
        assert!(matches!(make.origin(), MethodOrigin::Source(_)));
        assert_eq!(env.ty(make.return_type()), &Type::Declared(inner));
        assert!(!env.diagnostics().has(UNDEFINED_TYPE));
    }

    #[test]
    fn test_duplicates_are_reported_and_dropped() {
        let mut env = env();
        let mut t = TypeDecl::class("T");
        t.fields.push(field("x", TypeSpec::primitive("int")));
        t.fields.push(field("x", TypeSpec::primitive("boolean")));
        t.methods.push(method("m", vec![TypeSpec::primitive("int")], None));
        t.methods.push(method("m", vec![TypeSpec::primitive("int")], None));
        t.methods.push(method("m", vec![TypeSpec::primitive("long")], None));
        env.build_unit(unit("T.rw", vec![t])).unwrap();
        let t = env.lookup_binding("p.T").unwrap();
        assert_eq!(env.fields(t).unwrap().len(), 1);
        assert_eq!(env.methods(t).unwrap().len(), 2);
        assert!(env.diagnostics().has(DUPLICATE_FIELD));
        assert!(env.diagnostics().has(DUPLICATE_METHOD));
    }

    #[test]
    fn test_self_referencing_bound() {
        let mut env = env();
        let mut cmp = TypeDecl::class("Cmp");
        cmp.type_params.push(TypeParamDecl {
            name: "T".to_string(),
            bounds: vec![TypeSpec::generic(
                "Cmp",
                vec![TypeArgSpec::Type(TypeSpec::Variable("T".to_string()))],
            )],
        });
        env.build_unit(unit("Cmp.rw", vec![cmp])).unwrap();
        let cmp = env.lookup_binding("p.Cmp").unwrap();
        let vars = env.type_variables(cmp).unwrap();
        let bound = env.type_var(vars[0]).bounds()[0];
        let var_type = env.type_var(vars[0]).declared_type();
        assert!(matches!(env.ty(bound), Type::Parameterized { generic, args, .. }
            if *generic == cmp && args == &vec![var_type]));
    }

    #[test]
    fn test_bound_violation_is_deferred() {
        let mut env = env();
        let mut holder = TypeDecl::class("Holder");
        holder.type_params.push(TypeParamDecl {
            name: "T".to_string(),
            bounds: vec![TypeSpec::named("core.String")],
        });
        let mut user = TypeDecl::class("User");
        user.fields.push(field(
            "bad",
            TypeSpec::generic("Holder", vec![TypeArgSpec::Type(TypeSpec::named("User"))]),
        ));
        user.fields.push(field(
            "good",
            TypeSpec::generic("Holder", vec![TypeArgSpec::Type(TypeSpec::named("core.String"))]),
        ));
        env.build_unit(unit("Holder.rw", vec![holder])).unwrap();
        env.build_unit(unit("User.rw", vec![user])).unwrap();
        let user = env.lookup_binding("p.User").unwrap();
        env.fields(user).unwrap();
        assert!(!env.diagnostics().has(TYPE_ARGUMENT_MISMATCH));
        env.check_deferred_bounds().unwrap();
        assert_eq!(env.diagnostics().with_id(TYPE_ARGUMENT_MISMATCH).count(), 1);
    }

    #[test]
    fn test_short_callout_takes_base_signature() {
        let mut env = env();
        let mut base = TypeDecl::class("Account");
        base.fields.push(field("balance", TypeSpec::primitive("int")));
        base.methods.push(method(
            "deposit",
            vec![TypeSpec::primitive("int")],
            Some(TypeSpec::primitive("boolean")),
        ));
        let mut role = TypeDecl::class("R");
        role.played_by = Some(TypeSpec::named("Account"));
        role.callouts.push(CalloutDecl {
            role_method: MethodSpec::by_name("pay"),
            kind: CalloutKind::Method,
            base: MethodSpec::by_name("deposit"),
            is_override: false,
            param_mappings: Vec::new(),
            span: Span::none(),
        });
        role.callouts.push(CalloutDecl {
            role_method: MethodSpec::by_name("getBalance"),
            kind: CalloutKind::Get,
            base: MethodSpec::by_name("balance"),
            is_override: false,
            param_mappings: Vec::new(),
            span: Span::none(),
        });
        let mut team = TypeDecl::class("Bank");
        team.modifiers.push(Modifier::Team);
        team.member_types.push(role);
        env.build_unit(unit("Account.rw", vec![base])).unwrap();
        env.build_unit(unit("Bank.rw", vec![team])).unwrap();

        let role = env.lookup_binding("p.Bank$R").unwrap();
        let methods = env.methods(role).unwrap();
        let pay = methods
            .iter()
            .copied()
            .find(|m| env.method(*m).name() == "pay")
            .unwrap();
        assert!(matches!(env.method(pay).origin(), MethodOrigin::ShortCallout));
        assert_eq!(env.method(pay).declared_signature().params.len(), 1);
        let getter = methods
            .iter()
            .copied()
            .find(|m| env.method(*m).name() == "getBalance")
            .unwrap();
        let int = env.primitive(roleweave_descriptor::BaseType::Int);
        assert_eq!(env.method(getter).return_type(), int);
    }
}
