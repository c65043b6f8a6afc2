//! Bindings read from type descriptors
//!
//! Creating a binary binding decodes only the descriptor header; every
//! member list is converted on first request. Types named by a descriptor
//! are interned through [`LookupEnvironment::get_type`] and stay unresolved
//! until somebody queries them. Members generated by earlier team/role
//! compilation are kept for teams and roles and dropped everywhere else.

use std::rc::Rc;

use roleweave_descriptor::{
    parse_class, parse_method, parse_type, ExtensionBlock, FormalTypeParam, Modifiers,
    TypeDescriptor,
};
use roleweave_diagnostics::id::{
    CORRUPT_EXTENSION_ATTRIBUTE, MALFORMED_SIGNATURE, UNSUPPORTED_EXTENSION_VERSION,
};
use roleweave_diagnostics::Span;
use tracing::warn;

use crate::binding::field::PendingAnchor;
use crate::binding::{BindingOrigin, FieldBinding, FieldOrigin, MethodOrigin, TypeVarOwner};
use crate::environment::LookupEnvironment;
use crate::error::SessionAbort;
use crate::ids::{BindingId, FieldId, MethodId, TypeId, TypeVarId};
use crate::lazy::Lazy;
use crate::names;
use crate::resolve::{MethodParts, SigScope};
use crate::types::ProblemReason;

impl LookupEnvironment {
    pub(crate) fn create_binary_binding(
        &mut self,
        descriptor: TypeDescriptor,
    ) -> Result<BindingId, SessionAbort> {
        let enclosing = match descriptor.enclosing.as_deref() {
            Some(name) if name != descriptor.name => self.get_type(name)?,
            _ => None,
        };
        // Loading the enclosing type may already have interned this one
        if let Some(&id) = self.by_name.get(&descriptor.name) {
            return Ok(id);
        }

        let mut modifiers = descriptor.modifiers;
        if let Some(attrs) = descriptor.extension.attributes() {
            if attrs.is_team() {
                modifiers.insert(Modifiers::TEAM);
            }
        }
        let limitation = match &descriptor.extension {
            ExtensionBlock::Unsupported { version, .. } => {
                Some((UNSUPPORTED_EXTENSION_VERSION, version.to_string()))
            }
            ExtensionBlock::Corrupt { reason, .. } => {
                Some((CORRUPT_EXTENSION_ATTRIBUTE, reason.clone()))
            }
            _ => None,
        };

        let name = descriptor.name.clone();
        let package = names::package_of(&name).to_string();
        let id = self.next_binding_id();
        let binding = self.new_type_binding(
            id,
            name.clone(),
            package,
            modifiers,
            BindingOrigin::Binary(Rc::new(descriptor)),
            enclosing,
            Span::none(),
        );
        self.by_name.insert(name.clone(), id);
        self.push_binding(binding);
        self.attach_team_role_models(id);

        if let Some((problem, detail)) = limitation {
            warn!(type_name = %name, %detail, "skipping team/role extension block");
            self.report_for(id, problem, Span::none(), [name, detail]);
        }
        Ok(id)
    }

    pub(crate) fn binary_member_types(
        &mut self,
        desc: &TypeDescriptor,
    ) -> Result<Vec<BindingId>, SessionAbort> {
        let mut members = Vec::with_capacity(desc.member_types.len());
        for name in &desc.member_types {
            if let Some(member) = self.get_type(name)? {
                members.push(member);
            }
        }
        Ok(members)
    }

    pub(crate) fn binary_supertype_candidates(
        &mut self,
        id: BindingId,
        desc: &TypeDescriptor,
    ) -> Result<(Option<TypeId>, Vec<TypeId>), SessionAbort> {
        let scope = SigScope {
            owner: id,
            method_vars: Vec::new(),
        };
        if let Some(signature) = desc.signature.as_deref() {
            match parse_class(signature) {
                Ok(class) => {
                    let superclass = match desc.superclass {
                        Some(_) => Some(self.class_type_from_sig(&class.superclass, &scope)?),
                        None => None,
                    };
                    let mut interfaces = Vec::with_capacity(class.interfaces.len());
                    for iface in &class.interfaces {
                        interfaces.push(self.class_type_from_sig(iface, &scope)?);
                    }
                    return Ok((superclass, interfaces));
                }
                Err(err) => {
                    self.report_for(
                        id,
                        MALFORMED_SIGNATURE,
                        Span::none(),
                        [desc.name.clone(), err.to_string()],
                    );
                }
            }
        }
        let superclass = match desc.superclass.as_deref() {
            Some(name) => Some(self.bare_type_by_name(name)?),
            None => None,
        };
        let mut interfaces = Vec::with_capacity(desc.interfaces.len());
        for name in &desc.interfaces {
            interfaces.push(self.bare_type_by_name(name)?);
        }
        Ok((superclass, interfaces))
    }

    pub(crate) fn binary_type_variables(
        &mut self,
        id: BindingId,
        desc: &TypeDescriptor,
    ) -> Result<Rc<[TypeVarId]>, SessionAbort> {
        let params = desc
            .signature
            .as_deref()
            .and_then(|sig| parse_class(sig).ok())
            .map(|class| class.type_params)
            .unwrap_or_default();
        let vars = self.create_type_vars(TypeVarOwner::Type(id), params.iter().map(|p| p.name.as_str()));
        let list: Rc<[TypeVarId]> = Rc::from(vars.clone());
        self.binding_mut(id).type_variables = Lazy::Resolved(list.clone());
        let scope = SigScope {
            owner: id,
            method_vars: Vec::new(),
        };
        self.resolve_sig_bounds(&vars, &params, &scope)?;
        Ok(list)
    }

    fn resolve_sig_bounds(
        &mut self,
        vars: &[TypeVarId],
        params: &[FormalTypeParam],
        scope: &SigScope,
    ) -> Result<(), SessionAbort> {
        for (var, param) in vars.iter().zip(params) {
            let mut bounds = Vec::new();
            for bound in param.bounds() {
                bounds.push(self.type_from_sig(bound, scope)?);
            }
            self.type_vars[var.index()].bounds = bounds;
        }
        Ok(())
    }

    fn keeps_synthetic_members(&self, id: BindingId) -> bool {
        let binding = self.binding(id);
        binding.is_team() || binding.is_role()
    }

    pub(crate) fn binary_fields(
        &mut self,
        id: BindingId,
        desc: &TypeDescriptor,
    ) -> Result<Vec<FieldId>, SessionAbort> {
        let keep_synthetic = self.keeps_synthetic_members(id);
        let scope = SigScope {
            owner: id,
            method_vars: Vec::new(),
        };
        let anchors = desc
            .extension
            .attributes()
            .map(|attrs| attrs.anchors.clone())
            .unwrap_or_default();

        let mut list = Vec::with_capacity(desc.fields.len());
        for field in &desc.fields {
            if names::is_synthetic_name(&field.name) && !keep_synthetic {
                continue;
            }
            let ty = match parse_type(&field.signature) {
                Ok(sig) => self.type_from_sig(&sig, &scope)?,
                Err(err) => {
                    self.report_for(
                        id,
                        MALFORMED_SIGNATURE,
                        Span::none(),
                        [format!("{}.{}", desc.name, field.name), err.to_string()],
                    );
                    self.problem_type(&field.signature, ProblemReason::Corrupt)
                }
            };
            let pending_anchor = anchors
                .iter()
                .find(|anchor| anchor.member == field.name)
                .and_then(|anchor| {
                    let role = self.binding_of_type(ty)?;
                    Some(PendingAnchor {
                        role: self.binding(role).simple_name.clone(),
                        path: anchor.anchor_path.split('.').map(str::to_string).collect(),
                    })
                });
            list.push(self.push_field(FieldBinding {
                id: FieldId::from_index(0),
                name: field.name.clone(),
                modifiers: field.modifiers,
                declaring: id,
                ty,
                pending_anchor,
                origin: FieldOrigin::Binary,
                copy_inheritance_src: None,
                span: Span::none(),
            }));
        }
        Ok(list)
    }

    pub(crate) fn binary_methods(
        &mut self,
        id: BindingId,
        desc: &TypeDescriptor,
    ) -> Result<Vec<MethodId>, SessionAbort> {
        let keep_synthetic = self.keeps_synthetic_members(id);
        let mut list = Vec::with_capacity(desc.methods.len());
        for method in &desc.methods {
            if names::is_synthetic_name(&method.name) && !keep_synthetic {
                continue;
            }
            let signature = match parse_method(&method.signature) {
                Ok(signature) => signature,
                Err(err) => {
                    self.report_for(
                        id,
                        MALFORMED_SIGNATURE,
                        Span::none(),
                        [format!("{}.{}", desc.name, method.name), err.to_string()],
                    );
                    continue;
                }
            };
            let vars = self.create_type_vars(
                TypeVarOwner::Method(id),
                signature.type_params.iter().map(|p| p.name.as_str()),
            );
            let scope = SigScope {
                owner: id,
                method_vars: vars.clone(),
            };
            self.resolve_sig_bounds(&vars, &signature.type_params, &scope)?;
            let mut params = Vec::with_capacity(signature.params.len());
            for param in &signature.params {
                params.push(self.type_from_sig(param, &scope)?);
            }
            let ret = self.type_from_sig(&signature.ret, &scope)?;
            let mut exceptions = Vec::with_capacity(signature.throws.len());
            for thrown in &signature.throws {
                exceptions.push(self.type_from_sig(thrown, &scope)?);
            }
            list.push(self.add_method(MethodParts {
                name: method.name.clone(),
                modifiers: method.modifiers,
                declaring: id,
                type_variables: Rc::from(vars),
                params,
                ret,
                exceptions,
                origin: MethodOrigin::Binary,
                span: Span::none(),
            })?);
        }
        Ok(list)
    }

    /// Bare type of the binding named `name`: raw if it is generic
    fn bare_type_by_name(&mut self, name: &str) -> Result<TypeId, SessionAbort> {
        let binding = self.get_type_or_problem(name)?;
        Ok(self.bare_type(binding))
    }
}

#[cfg(test)]
mod tests {
    use roleweave_descriptor::{
        AnchorRecord, FieldDescriptor, MethodDescriptor, TeamRoleAttributes, EXT_TEAM,
    };
    use roleweave_diagnostics::id::UNSUPPORTED_EXTENSION_VERSION;

    use crate::config::BinderOptions;
    use crate::provider::InMemoryProvider;
    use crate::types::Type;

    use super::*;

    fn env_with(types: Vec<TypeDescriptor>) -> LookupEnvironment {
        let options = BinderOptions::default();
        let mut provider = InMemoryProvider::with_core(&options.well_known);
        for desc in types {
            provider.insert(desc);
        }
        LookupEnvironment::new(Box::new(provider), options).unwrap()
    }

    #[test]
    fn test_header_only_until_queried() {
        let mut base = TypeDescriptor::new("q.Base");
        base.superclass = Some("core.Object".to_string());
        base.methods.push(MethodDescriptor {
            name: "run".to_string(),
            modifiers: Modifiers::PUBLIC,
            signature: "(I)V".to_string(),
        });
        let mut env = env_with(vec![base]);
        let id = env.get_type("q.Base").unwrap().unwrap();
        assert!(!env.resolution_state(id).is_empty());
        let methods = env.methods(id).unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(env.method(methods[0]).declared_signature().params.len(), 1);
    }

    #[test]
    fn test_synthetic_members_pruned_for_plain_types() {
        let mut plain = TypeDescriptor::new("q.Plain");
        plain.superclass = Some("core.Object".to_string());
        plain.methods.push(MethodDescriptor {
            name: names::getter_name("x"),
            modifiers: Modifiers::PUBLIC | Modifiers::SYNTHETIC,
            signature: "()I".to_string(),
        });
        plain.fields.push(FieldDescriptor {
            name: "_weave$cache".to_string(),
            modifiers: Modifiers::PRIVATE,
            signature: "I".to_string(),
        });
        let mut team = TypeDescriptor::new("q.T");
        team.superclass = Some("core.Team".to_string());
        team.extension = ExtensionBlock::V1(TeamRoleAttributes {
            flags: EXT_TEAM,
            ..TeamRoleAttributes::default()
        });
        team.methods.push(MethodDescriptor {
            name: names::precedence_wrapper_name(0),
            modifiers: Modifiers::PUBLIC | Modifiers::SYNTHETIC,
            signature: "()V".to_string(),
        });
        let mut env = env_with(vec![plain, team]);

        let plain = env.get_type("q.Plain").unwrap().unwrap();
        assert!(env.methods(plain).unwrap().is_empty());
        assert!(env.fields(plain).unwrap().is_empty());

        let team = env.get_type("q.T").unwrap().unwrap();
        assert!(env.binding(team).is_team());
        assert_eq!(env.methods(team).unwrap().len(), 1);
    }

    #[test]
    fn test_generic_signature_and_raw_reference() {
        let mut list = TypeDescriptor::new("q.Box");
        list.signature = Some("<T:Lcore/Object;>Lcore/Object;".to_string());
        list.superclass = Some("core.Object".to_string());
        list.fields.push(FieldDescriptor {
            name: "value".to_string(),
            modifiers: Modifiers::PUBLIC,
            signature: "TT;".to_string(),
        });
        let mut user = TypeDescriptor::new("q.User");
        user.superclass = Some("q.Box".to_string());
        let mut env = env_with(vec![list, user]);

        let boxed = env.get_type("q.Box").unwrap().unwrap();
        let vars = env.type_variables(boxed).unwrap();
        assert_eq!(vars.len(), 1);
        assert_eq!(env.type_var(vars[0]).bounds().len(), 1);
        let field = env.fields(boxed).unwrap()[0];
        assert_eq!(env.ty(env.field(field).ty()), &Type::Variable(vars[0]));

        let user = env.get_type("q.User").unwrap().unwrap();
        let superclass = env.superclass(user).unwrap().unwrap();
        assert!(matches!(env.ty(superclass), Type::Raw { generic, .. } if *generic == boxed));
    }

    #[test]
    fn test_unsupported_extension_is_skipped() {
        let mut team = TypeDescriptor::new("q.Future");
        team.superclass = Some("core.Object".to_string());
        team.extension = ExtensionBlock::Unsupported {
            version: 9,
            body: vec![1, 2, 3],
        };
        let mut env = env_with(vec![team]);
        let id = env.get_type("q.Future").unwrap().unwrap();
        assert!(!env.binding(id).is_team());
        assert!(env.diagnostics().has(UNSUPPORTED_EXTENSION_VERSION));
    }

    #[test]
    fn test_binary_anchor_is_pending_until_queried() {
        let mut team = TypeDescriptor::new("q.Tm");
        team.superclass = Some("core.Team".to_string());
        team.extension = ExtensionBlock::V1(TeamRoleAttributes {
            flags: EXT_TEAM,
            ..TeamRoleAttributes::default()
        });
        team.member_types.push("q.Tm$R".to_string());
        let mut role = TypeDescriptor::new("q.Tm$R");
        role.enclosing = Some("q.Tm".to_string());
        role.superclass = Some("core.Object".to_string());
        let mut user = TypeDescriptor::new("q.User");
        user.superclass = Some("core.Object".to_string());
        user.fields.push(FieldDescriptor {
            name: "team".to_string(),
            modifiers: Modifiers::PUBLIC | Modifiers::FINAL,
            signature: "Lq/Tm;".to_string(),
        });
        user.fields.push(FieldDescriptor {
            name: "role".to_string(),
            modifiers: Modifiers::PUBLIC,
            signature: "Lq/Tm$R;".to_string(),
        });
        user.extension = ExtensionBlock::V1(TeamRoleAttributes {
            anchors: vec![AnchorRecord {
                member: "role".to_string(),
                anchor_path: "team".to_string(),
            }],
            ..TeamRoleAttributes::default()
        });
        let mut env = env_with(vec![team, role, user]);
        let user = env.get_type("q.User").unwrap().unwrap();
        let fields = env.fields(user).unwrap();
        let role_field = fields[1];
        assert!(matches!(env.ty(env.field(role_field).ty()), Type::Anchored { anchor, .. } if anchor == &vec![fields[0]]));
    }
}
