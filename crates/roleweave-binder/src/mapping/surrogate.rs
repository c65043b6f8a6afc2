//! Base-call surrogates
//!
//! Every callin method of a role is paired with a synthetic surrogate that
//! stands for `base.m(...)` inside its body and forwards to the base
//! methods the callin ends up bound to. Roles read from descriptors already
//! carry their surrogates; those are reused. A copied callin gets its own
//! surrogate, which in turn records the tsuper callin's surrogate as its
//! copy source.

use roleweave_descriptor::Modifiers;
use tracing::trace;

use crate::binding::MethodOrigin;
use crate::environment::LookupEnvironment;
use crate::error::SessionAbort;
use crate::ids::{BindingId, MethodId};
use crate::names;
use crate::resolve::MethodParts;

impl LookupEnvironment {
    /// Pair every callin method in `list` with its base-call surrogate,
    /// adding the surrogates that do not exist yet
    pub(crate) fn attach_surrogates(
        &mut self,
        role: BindingId,
        list: &mut Vec<MethodId>,
    ) -> Result<(), SessionAbort> {
        let callins: Vec<MethodId> = list
            .iter()
            .copied()
            .filter(|m| {
                let method = self.method(*m);
                method.is_callin() && !matches!(method.origin, MethodOrigin::Surrogate { .. })
            })
            .collect();
        for callin in callins {
            let surrogate = match self.existing_surrogate(callin, list) {
                Some(existing) => existing,
                None => {
                    let created = self.create_surrogate(role, callin)?;
                    list.push(created);
                    created
                }
            };
            self.method_mut(callin).base_call_surrogate = Some(surrogate);

            let copied_from = self
                .method(callin)
                .copy_inheritance_src
                .and_then(|src| self.method(src).base_call_surrogate);
            if copied_from.is_some() {
                self.method_mut(surrogate).copy_inheritance_src = copied_from;
            }

            let overridden: Vec<MethodId> = self
                .method(callin)
                .overridden_tsupers
                .iter()
                .filter_map(|t| self.method(*t).base_call_surrogate)
                .collect();
            let mirrored = &mut self.method_mut(surrogate).overridden_tsupers;
            for tsuper_surrogate in overridden {
                if !mirrored.contains(&tsuper_surrogate) {
                    mirrored.push(tsuper_surrogate);
                }
            }
        }
        Ok(())
    }

    fn existing_surrogate(&self, callin: MethodId, list: &[MethodId]) -> Option<MethodId> {
        let method = self.method(callin);
        let wanted = method
            .enhanced_signature()
            .unwrap_or(method.declared_signature())
            .params
            .len();
        list.iter().copied().find(|m| {
            let candidate = self.method(*m);
            names::surrogate_target(&candidate.name) == Some(method.name.as_str())
                && candidate.declared.params.len() == wanted
        })
    }

    fn create_surrogate(&mut self, role: BindingId, callin: MethodId) -> Result<MethodId, SessionAbort> {
        let method = self.method(callin).clone();
        let signature = method.enhanced.as_ref().unwrap_or(&method.declared).clone();
        let mut modifiers = Modifiers::PUBLIC.with(Modifiers::SYNTHETIC);
        if method.modifiers.is_static() {
            modifiers.insert(Modifiers::STATIC);
        }
        let name = names::surrogate_name(&method.name);
        trace!(role = %self.binding(role).name, surrogate = %name, "creating base-call surrogate");
        self.add_method(MethodParts {
            name,
            modifiers,
            declaring: role,
            type_variables: method.type_variables.clone(),
            params: signature.params.to_vec(),
            ret: signature.ret,
            exceptions: method.exceptions.to_vec(),
            origin: MethodOrigin::Surrogate { callin },
            span: method.span,
        })
    }
}

#[cfg(test)]
mod tests {
    use roleweave_descriptor::{Modifier, Modifiers};
    use roleweave_diagnostics::Span;

    use crate::binding::MethodOrigin;
    use crate::config::BinderOptions;
    use crate::decl::{CompilationUnitDecl, MethodDecl, ParamDecl, TypeDecl, TypeSpec};
    use crate::environment::LookupEnvironment;
    use crate::names;
    use crate::provider::InMemoryProvider;

    fn env() -> LookupEnvironment {
        let options = BinderOptions::default();
        let provider = InMemoryProvider::with_core(&options.well_known);
        LookupEnvironment::new(Box::new(provider), options).unwrap()
    }

    fn wrap() -> MethodDecl {
        MethodDecl {
            name: "wrap".to_string(),
            modifiers: vec![Modifier::Callin],
            params: vec![ParamDecl {
                name: "x".to_string(),
                ty: TypeSpec::primitive("int"),
            }],
            span: Span::new(40, 48, 4, 8),
            ..MethodDecl::default()
        }
    }

    fn team(name: &str, superclass: Option<&str>, role_methods: Vec<MethodDecl>) -> TypeDecl {
        let mut role = TypeDecl::class("R");
        role.methods = role_methods;
        let mut team = TypeDecl::class(name);
        team.modifiers.push(Modifier::Team);
        team.superclass = superclass.map(TypeSpec::named);
        team.member_types.push(role);
        team
    }

    fn build(env: &mut LookupEnvironment, types: Vec<TypeDecl>) {
        env.build_unit(CompilationUnitDecl {
            file_name: "Teams.rw".to_string(),
            package: "p".to_string(),
            team_package: None,
            imports: Vec::new(),
            types,
            source: None,
        })
        .unwrap();
    }

    #[test]
    fn test_callin_gets_surrogate_with_enhanced_signature() {
        let mut env = env();
        build(&mut env, vec![team("T1", None, vec![wrap()])]);
        let r = env.lookup_binding("p.T1$R").unwrap();
        let methods = env.methods(r).unwrap();
        assert_eq!(methods.len(), 2);
        let callin = methods[0];
        let surrogate = env.method(callin).base_call_surrogate().unwrap();
        let s = env.method(surrogate);
        assert_eq!(s.name(), names::surrogate_name("wrap"));
        assert!(s.modifiers().contains(Modifiers::SYNTHETIC));
        assert!(matches!(s.origin(), MethodOrigin::Surrogate { callin: c } if *c == callin));
        assert_eq!(
            s.declared_signature().params.len(),
            env.method(callin).enhanced_signature().unwrap().params.len()
        );
    }

    #[test]
    fn test_surrogate_is_found_in_either_view() {
        let mut env = env();
        build(&mut env, vec![team("T1", None, vec![wrap()])]);
        let r = env.lookup_binding("p.T1$R").unwrap();
        let methods = env.methods(r).unwrap();
        let callin = methods[0];
        let surrogate = env.method(callin).base_call_surrogate();
        assert!(surrogate.is_some());

        env.enter_source_view(callin).unwrap();
        assert_eq!(env.existing_surrogate(callin, &methods), surrogate);
        env.exit_source_view(callin).unwrap();
        assert_eq!(env.existing_surrogate(callin, &methods), surrogate);
    }

    #[test]
    fn test_copied_and_overriding_callins_link_surrogates() {
        let mut env = env();
        build(
            &mut env,
            vec![
                team("T1", None, vec![wrap()]),
                team("T2", Some("T1"), Vec::new()),
                team("T3", Some("T1"), vec![wrap()]),
            ],
        );
        let r1 = env.lookup_binding("p.T1$R").unwrap();
        let r2 = env.lookup_binding("p.T2$R").unwrap();
        let r3 = env.lookup_binding("p.T3$R").unwrap();
        let original = env.methods(r1).unwrap()[0];
        let original_surrogate = env.method(original).base_call_surrogate().unwrap();

        let copy = env.find_methods(r2, "wrap").unwrap()[0];
        assert_eq!(env.method(copy).copy_inheritance_src(), Some(original));
        let copy_surrogate = env.method(copy).base_call_surrogate().unwrap();
        assert_ne!(copy_surrogate, original_surrogate);
        assert_eq!(env.method(copy_surrogate).copy_inheritance_src(), Some(original_surrogate));

        let own = env.find_methods(r3, "wrap").unwrap()[0];
        assert_eq!(env.method(own).overridden_tsupers(), &[original]);
        let own_surrogate = env.method(own).base_call_surrogate().unwrap();
        assert_eq!(env.method(own_surrogate).overridden_tsupers(), &[original_surrogate]);
    }
}
