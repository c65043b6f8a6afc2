//! Role-to-base binding (`playedBy`)
//!
//! A role without its own `playedBy` inherits the base class of its
//! superclass role, or else of its nearest tsuper role. A declared base
//! class is resolved with base imports in scope and without enforcing
//! visibility; an invisible base is accepted with a decapsulation note.

use roleweave_diagnostics::id::{
    BASECLASS_CIRCULARITY, BASECLASS_IS_ENCLOSING_ROLE, DECAPSULATION,
    INCOMPATIBLE_BASECLASS_REFINEMENT, PLAYED_BY_IN_NON_ROLE,
};
use tracing::debug;

use crate::binding::BindingOrigin;
use crate::environment::LookupEnvironment;
use crate::error::SessionAbort;
use crate::ids::{BindingId, TypeId};
use crate::lazy::Lazy;
use crate::scope::LookupSite;

impl LookupEnvironment {
    /// Base class a role is bound to
    pub fn base_class(&mut self, id: BindingId) -> Result<Option<TypeId>, SessionAbort> {
        match &self.binding(id).base_class {
            Lazy::Resolved(base) => return Ok(*base),
            Lazy::InProgress => return Ok(None),
            Lazy::Unresolved => {}
        }
        self.binding_mut(id).base_class = Lazy::InProgress;
        debug!(binding = %self.binding(id).name, "resolving base class");
        let base = match self.binding(id).origin.clone() {
            BindingOrigin::Source { decl, unit } => match &decl.played_by {
                Some(spec) => {
                    let mut site = LookupSite::header(self, id, unit).at(decl.span);
                    site.base_context = true;
                    let base = self.resolve_type_spec(spec, &site)?;
                    self.check_declared_base(id, base, unit)?
                }
                None => self.inherited_base_class(id)?,
            },
            BindingOrigin::Binary(desc) => {
                let name = desc
                    .extension
                    .attributes()
                    .and_then(|attrs| attrs.base_class.clone());
                match name {
                    Some(name) if self.binding(id).is_role() => {
                        let base = self.get_type_or_problem(&name)?;
                        Some(self.bare_type(base))
                    }
                    _ => None,
                }
            }
            BindingOrigin::Problem(_) => None,
        };
        self.binding_mut(id).base_class = Lazy::Resolved(base);
        Ok(base)
    }

    fn check_declared_base(
        &mut self,
        id: BindingId,
        base: TypeId,
        unit: crate::ids::UnitId,
    ) -> Result<Option<TypeId>, SessionAbort> {
        let span = self.binding(id).span;
        let role_name = self.binding(id).name.clone();
        if !self.binding(id).is_role() {
            self.report_in_unit(unit, PLAYED_BY_IN_NON_ROLE, span, [role_name]);
            return Ok(None);
        }
        if self.is_problem_type(base) {
            return Ok(Some(base));
        }
        let Some(base_binding) = self.binding_of_type(base) else {
            return Ok(Some(base));
        };
        let base_name = self.binding(base_binding).name.clone();

        let chain = self.enclosing_chain(id);
        if chain.contains(&base_binding) || self.reaches(base_binding, id)? {
            self.report_in_unit(unit, BASECLASS_CIRCULARITY, span, [role_name, base_name]);
            return Ok(None);
        }
        let team = self.binding(id).role.as_ref().map(|role| role.team);
        let same_team_role = self.binding(base_binding).is_role()
            && self.binding(base_binding).role.as_ref().map(|role| role.team) == team;
        if same_team_role {
            self.report_in_unit(unit, BASECLASS_IS_ENCLOSING_ROLE, span, [role_name, base_name]);
            return Ok(None);
        }

        if !self.is_visible_from(base_binding, unit, Some(id)) {
            self.report_in_unit(unit, DECAPSULATION, span, [base_name.clone(), role_name.clone()]);
        }

        if let Some(inherited) = self.inherited_base_class(id)? {
            if !self.is_problem_type(inherited) && !self.is_subtype(base, inherited)? {
                let args = [role_name, base_name, self.type_name(inherited)];
                self.report_in_unit(unit, INCOMPATIBLE_BASECLASS_REFINEMENT, span, args);
            }
        }
        Ok(Some(base))
    }

    /// Base class of the superclass role, else of the nearest tsuper role
    fn inherited_base_class(&mut self, id: BindingId) -> Result<Option<TypeId>, SessionAbort> {
        if !self.binding(id).is_role() {
            return Ok(None);
        }
        if let Some(superclass) = self.superclass(id)? {
            if let Some(super_role) = self.binding_of_type(superclass) {
                if self.binding(super_role).is_role() {
                    if let Some(base) = self.base_class(super_role)? {
                        return Ok(Some(base));
                    }
                }
            }
        }
        for tsuper in self.tsuper_roles(id)?.iter() {
            if let Some(base) = self.base_class(*tsuper)? {
                return Ok(Some(base));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use roleweave_descriptor::Modifier;
    use roleweave_diagnostics::id::{
        BASECLASS_CIRCULARITY, BASECLASS_IS_ENCLOSING_ROLE, INCOMPATIBLE_BASECLASS_REFINEMENT,
        PLAYED_BY_IN_NON_ROLE,
    };

    use crate::config::BinderOptions;
    use crate::decl::{CompilationUnitDecl, TypeDecl, TypeSpec};
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

    fn team(name: &str, roles: Vec<TypeDecl>) -> TypeDecl {
        let mut team = TypeDecl::class(name);
        team.modifiers.push(Modifier::Team);
        team.member_types = roles;
        team
    }

    fn role(name: &str, base: Option<&str>) -> TypeDecl {
        let mut role = TypeDecl::class(name);
        role.played_by = base.map(TypeSpec::named);
        role
    }

    #[test]
    fn test_played_by_resolves_and_is_inherited() {
        let mut env = env();
        let base = TypeDecl::class("Account");
        let mut sub = role("Sub", None);
        sub.superclass = Some(TypeSpec::named("R"));
        env.build_unit(unit("Account.rw", vec![base])).unwrap();
        env.build_unit(unit("Bank.rw", vec![team("Bank", vec![role("R", Some("Account")), sub])]))
            .unwrap();
        let account = env.lookup_binding("p.Account").unwrap();
        let r = env.lookup_binding("p.Bank$R").unwrap();
        let sub = env.lookup_binding("p.Bank$Sub").unwrap();
        let base = env.base_class(r).unwrap().unwrap();
        assert_eq!(env.ty(base), &Type::Declared(account));
        assert_eq!(env.base_class(sub).unwrap(), Some(base));
    }

    #[test]
    fn test_tsuper_role_supplies_base() {
        let mut env = env();
        env.build_unit(unit("Account.rw", vec![TypeDecl::class("Account")])).unwrap();
        env.build_unit(unit("Bank.rw", vec![team("Bank", vec![role("R", Some("Account"))])]))
            .unwrap();
        let mut sub_team = team("SubBank", vec![role("R", None)]);
        sub_team.superclass = Some(TypeSpec::named("Bank"));
        env.build_unit(unit("SubBank.rw", vec![sub_team])).unwrap();
        let r = env.lookup_binding("p.Bank$R").unwrap();
        let sub_r = env.lookup_binding("p.SubBank$R").unwrap();
        assert_eq!(env.base_class(sub_r).unwrap(), env.base_class(r).unwrap());
    }

    #[test]
    fn test_base_class_errors() {
        let mut env = env();
        let mut plain = TypeDecl::class("Plain");
        plain.played_by = Some(TypeSpec::named("Plain"));
        env.build_unit(unit("Plain.rw", vec![plain])).unwrap();
        env.build_unit(unit(
            "Bank.rw",
            vec![team(
                "Bank",
                vec![role("Loop", Some("Bank")), role("Other", Some("Mine")), role("Mine", None)],
            )],
        ))
        .unwrap();
        let plain = env.lookup_binding("p.Plain").unwrap();
        assert_eq!(env.base_class(plain).unwrap(), None);
        assert!(env.diagnostics().has(PLAYED_BY_IN_NON_ROLE));
        let looped = env.lookup_binding("p.Bank$Loop").unwrap();
        assert_eq!(env.base_class(looped).unwrap(), None);
        assert!(env.diagnostics().has(BASECLASS_CIRCULARITY));
        let other = env.lookup_binding("p.Bank$Other").unwrap();
        assert_eq!(env.base_class(other).unwrap(), None);
        assert!(env.diagnostics().has(BASECLASS_IS_ENCLOSING_ROLE));
    }

    #[test]
    fn test_refinement_must_be_subtype() {
        let mut env = env();
        env.build_unit(unit("Account.rw", vec![TypeDecl::class("Account")])).unwrap();
        env.build_unit(unit("Ledger.rw", vec![TypeDecl::class("Ledger")])).unwrap();
        let mut sub = role("Sub", Some("Ledger"));
        sub.superclass = Some(TypeSpec::named("R"));
        env.build_unit(unit("Bank.rw", vec![team("Bank", vec![role("R", Some("Account")), sub])]))
            .unwrap();
        let sub = env.lookup_binding("p.Bank$Sub").unwrap();
        env.base_class(sub).unwrap();
        assert!(env.diagnostics().has(INCOMPATIBLE_BASECLASS_REFINEMENT));
    }
}
