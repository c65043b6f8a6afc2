//! Import resolution and base-import verification
//!
//! Imports of a unit are resolved once, the first time anything asks for
//! them. A bad import is reported and dropped; the others stay usable.
//! `base` imports may name types that are otherwise invisible, but only
//! for `playedBy` clauses, and they must be justified by a role of the unit
//! that ends up bound to exactly the imported type.

use std::rc::Rc;

use roleweave_diagnostics::id::{
    BASE_IMPORT_IN_REGULAR_CLASS, CANNOT_IMPORT_PACKAGE, CONFLICTING_IMPORT, DUPLICATE_IMPORT,
    IMPORT_CONFLICTS_WITH_TYPE, IMPORT_NOT_FOUND, IMPORT_NOT_VISIBLE, IMPORT_OF_ROLE_TYPE,
    UNUSED_BASE_IMPORT,
};
use tracing::debug;

use crate::decl::ImportDecl;
use crate::environment::LookupEnvironment;
use crate::error::SessionAbort;
use crate::ids::{BindingId, UnitId};
use crate::lazy::Lazy;
use crate::names;
use crate::scope::{BaseImport, OnDemand, ResolvedImports};

impl LookupEnvironment {
    /// Resolved imports of `unit`, resolving them on first request
    pub fn fault_in_imports(&mut self, unit: UnitId) -> Result<Rc<ResolvedImports>, SessionAbort> {
        match &self.unit(unit).imports {
            Lazy::Resolved(imports) => return Ok(imports.clone()),
            Lazy::InProgress => {
                return Err(SessionAbort::Internal(format!(
                    "imports of '{}' requested while they are being resolved",
                    self.unit(unit).file_name()
                )))
            }
            Lazy::Unresolved => {}
        }
        self.units[unit.index()].imports = Lazy::InProgress;
        let imports = Rc::new(self.check_and_set_imports(unit)?);
        self.units[unit.index()].imports = Lazy::Resolved(imports.clone());
        Ok(imports)
    }

    fn check_and_set_imports(&mut self, unit: UnitId) -> Result<ResolvedImports, SessionAbort> {
        let decl = self.unit(unit).decl.clone();
        debug!(file = %decl.file_name, imports = decl.imports.len(), "resolving imports");
        let has_team = self.unit(unit).has_team;
        let mut resolved = ResolvedImports::default();
        let mut seen: Vec<&ImportDecl> = Vec::with_capacity(decl.imports.len());

        for import in &decl.imports {
            let duplicate = seen.iter().any(|prev| {
                prev.name == import.name
                    && prev.on_demand == import.on_demand
                    && prev.is_static == import.is_static
                    && prev.is_base == import.is_base
            });
            if duplicate {
                self.report_in_unit(unit, DUPLICATE_IMPORT, import.span, [import.name.clone()]);
                continue;
            }
            seen.push(import);
            self.units[unit.index()]
                .references
                .record(&import.name.split('.').collect::<Vec<_>>());

            if import.is_base && !has_team {
                self.report_in_unit(
                    unit,
                    BASE_IMPORT_IN_REGULAR_CLASS,
                    import.span,
                    [import.name.clone()],
                );
                continue;
            }

            if import.on_demand {
                if self.package_exists(&import.name) {
                    resolved.on_demand.push(OnDemand::Package(import.name.clone()));
                } else if let Some(owner) = self.import_type(&import.name)? {
                    resolved.on_demand.push(OnDemand::Type(owner));
                } else {
                    self.report_in_unit(unit, IMPORT_NOT_FOUND, import.span, [import.name.clone()]);
                }
                continue;
            }

            // `import static p.T.m` binds members, not types; only the owner
            // has to exist
            let type_name = if import.is_static {
                match import.name.rfind('.') {
                    Some(i) => &import.name[..i],
                    None => import.name.as_str(),
                }
            } else {
                import.name.as_str()
            };
            let Some(target) = self.import_type(type_name)? else {
                let problem = if !import.is_static && self.package_exists(type_name) {
                    CANNOT_IMPORT_PACKAGE
                } else {
                    IMPORT_NOT_FOUND
                };
                self.report_in_unit(unit, problem, import.span, [import.name.clone()]);
                continue;
            };
            if import.is_static {
                continue;
            }

            if self.binding(target).is_role() {
                self.report_in_unit(unit, IMPORT_OF_ROLE_TYPE, import.span, [import.name.clone()]);
                continue;
            }

            if import.is_base {
                resolved.base.push(BaseImport {
                    binding: target,
                    decl: import.clone(),
                });
                continue;
            }

            if !self.is_visible_from(target, unit, None) {
                self.report_in_unit(unit, IMPORT_NOT_VISIBLE, import.span, [import.name.clone()]);
                continue;
            }

            let simple = self.binding(target).simple_name.clone();
            let declared_here = self
                .unit(unit)
                .types
                .iter()
                .copied()
                .find(|t| self.binding(*t).simple_name == simple);
            if let Some(own) = declared_here {
                if own != target {
                    self.report_in_unit(
                        unit,
                        IMPORT_CONFLICTS_WITH_TYPE,
                        import.span,
                        [import.name.clone()],
                    );
                }
                continue;
            }
            match resolved.single.get(&simple) {
                Some(existing) if *existing != target => {
                    self.report_in_unit(unit, CONFLICTING_IMPORT, import.span, [import.name.clone()]);
                }
                Some(_) => {}
                None => {
                    resolved.single.insert(simple, target);
                }
            }
        }
        Ok(resolved)
    }

    /// Type named by an import, trying `p.A.B` as `p.A$B` when the dotted
    /// name is not a top-level type
    fn import_type(&mut self, name: &str) -> Result<Option<BindingId>, SessionAbort> {
        let mut candidate = name.to_string();
        loop {
            if let Some(found) = self.get_type(&candidate)? {
                if !self.binding(found).is_problem() {
                    return Ok(Some(found));
                }
            }
            match candidate.rfind('.') {
                Some(i) => candidate.replace_range(i..=i, "$"),
                None => return Ok(None),
            }
        }
    }

    /// Whether a package of this name exists in the session or the provider
    pub fn package_exists(&self, package: &str) -> bool {
        if package.is_empty() {
            return false;
        }
        let nested = format!("{}.", package);
        let in_session = self
            .unit_packages
            .keys()
            .any(|name| name == package || name.starts_with(&nested));
        in_session || self.provider.package_exists(package)
    }

    /// Check every base import of `unit` against the base classes its roles
    /// ended up bound to
    pub fn verify_base_imports(&mut self, unit: UnitId) -> Result<(), SessionAbort> {
        if self.unit(unit).base_imports_verified {
            return Ok(());
        }
        self.units[unit.index()].base_imports_verified = true;
        let imports = self.fault_in_imports(unit)?;
        if imports.base.is_empty() {
            return Ok(());
        }

        let roles: Vec<BindingId> = (0..self.binding_count())
            .map(BindingId::from_index)
            .filter(|id| self.binding(*id).unit() == Some(unit) && self.binding(*id).is_role())
            .collect();
        let mut bound = Vec::with_capacity(roles.len());
        for role in roles {
            if let Some(base) = self.base_class(role)? {
                if let Some(b) = self.binding_of_type(base) {
                    bound.push(b);
                }
            }
        }

        for import in imports.base.iter() {
            if bound.contains(&import.binding) {
                continue;
            }
            let problem = if self.is_visible_from(import.binding, unit, None) {
                UNUSED_BASE_IMPORT
            } else {
                IMPORT_NOT_VISIBLE
            };
            self.report_in_unit(unit, problem, import.decl.span, [import.decl.name.clone()]);
        }
        Ok(())
    }

    /// Whether `target` may be referenced from `unit`, from inside `from`
    /// when given
    pub fn is_visible_from(&self, target: BindingId, unit: UnitId, from: Option<BindingId>) -> bool {
        let package = self.unit(unit).package();
        let from_outermost = from.map(|f| self.outermost(f));
        self.enclosing_chain(target).into_iter().all(|t| {
            let binding = self.binding(t);
            if binding.is_problem() || binding.modifiers.is_public() {
                true
            } else if binding.modifiers.is_private() {
                from_outermost == Some(self.outermost(t))
            } else {
                binding.package == package || names::package_of(&binding.name) == package
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use roleweave_descriptor::{Modifier, Modifiers, TypeDescriptor};

    use crate::config::BinderOptions;
    use crate::decl::{CompilationUnitDecl, TypeDecl, TypeSpec};
    use crate::provider::InMemoryProvider;

    use super::*;

    fn env() -> LookupEnvironment {
        let options = BinderOptions::default();
        let mut provider = InMemoryProvider::with_core(&options.well_known);
        provider.insert(TypeDescriptor::new("q.Base"));
        let mut hidden = TypeDescriptor::new("q.Hidden");
        hidden.modifiers = Modifiers::NONE;
        provider.insert(hidden);
        provider.insert(TypeDescriptor::new("q.Other"));
        let mut outer = TypeDescriptor::new("q.Outer");
        outer.member_types.push("q.Outer$Nested".to_string());
        provider.insert(outer);
        let mut nested = TypeDescriptor::new("q.Outer$Nested");
        nested.enclosing = Some("q.Outer".to_string());
        provider.insert(nested);
        provider.insert(TypeDescriptor::new("r.Other"));
        LookupEnvironment::new(Box::new(provider), options).unwrap()
    }

    fn import(name: &str) -> ImportDecl {
        ImportDecl {
            name: name.to_string(),
            on_demand: false,
            is_static: false,
            is_base: false,
            span: Default::default(),
        }
    }

    fn unit_with(imports: Vec<ImportDecl>, types: Vec<TypeDecl>) -> CompilationUnitDecl {
        CompilationUnitDecl {
            file_name: "Main.rw".to_string(),
            package: "p".to_string(),
            team_package: None,
            imports,
            types,
            source: None,
        }
    }

    #[test]
    fn test_bad_imports_are_reported_and_dropped() {
        let mut env = env();
        let on_demand = ImportDecl {
            on_demand: true,
            ..import("q")
        };
        let u = env
            .build_unit(unit_with(
                vec![
                    import("q.Base"),
                    import("q.Base"),
                    import("q.Missing"),
                    import("q"),
                    import("q.Other"),
                    import("r.Other"),
                    import("q.Hidden"),
                    import("q.Outer.Nested"),
                    on_demand,
                ],
                vec![TypeDecl::class("Main")],
            ))
            .unwrap();
        let imports = env.fault_in_imports(u).unwrap();
        let diags = env.diagnostics();
        assert!(diags.has(DUPLICATE_IMPORT));
        assert!(diags.has(IMPORT_NOT_FOUND));
        assert!(diags.has(CANNOT_IMPORT_PACKAGE));
        assert!(diags.has(CONFLICTING_IMPORT));
        assert!(diags.has(IMPORT_NOT_VISIBLE));

        assert!(imports.single("Base").is_some());
        assert_eq!(imports.single("Other"), env.lookup_binding("q.Other"));
        assert_eq!(imports.single("Nested"), env.lookup_binding("q.Outer$Nested"));
        assert_eq!(imports.on_demand().count(), 1);

        // latched: a second request neither re-resolves nor re-reports
        let count = env.diagnostics().problems().len();
        let again = env.fault_in_imports(u).unwrap();
        assert!(Rc::ptr_eq(&imports, &again));
        assert_eq!(env.diagnostics().problems().len(), count);
    }

    #[test]
    fn test_role_import_and_own_type_conflict() {
        let mut env = env();
        let team = TypeDecl {
            modifiers: vec![Modifier::Public, Modifier::Team],
            member_types: vec![TypeDecl::class("R")],
            ..TypeDecl::class("Tm")
        };
        let tm_unit = CompilationUnitDecl {
            file_name: "Tm.rw".to_string(),
            ..unit_with(Vec::new(), vec![team])
        };
        env.build_unit(tm_unit).unwrap();
        let u = env
            .build_unit(unit_with(
                vec![import("p.Tm.R"), import("q.Base")],
                vec![TypeDecl::class("Base")],
            ))
            .unwrap();
        env.fault_in_imports(u).unwrap();
        assert!(env.diagnostics().has(IMPORT_OF_ROLE_TYPE));
        assert!(env.diagnostics().has(IMPORT_CONFLICTS_WITH_TYPE));
    }

    #[test]
    fn test_base_import_outside_team_unit() {
        let mut env = env();
        let base = ImportDecl {
            is_base: true,
            ..import("q.Base")
        };
        let u = env
            .build_unit(unit_with(vec![base], vec![TypeDecl::class("Main")]))
            .unwrap();
        let imports = env.fault_in_imports(u).unwrap();
        assert!(imports.base().is_empty());
        assert!(env.diagnostics().has(BASE_IMPORT_IN_REGULAR_CLASS));
    }

    #[test]
    fn test_unused_base_import_is_reported() {
        let mut env = env();
        let base = ImportDecl {
            is_base: true,
            ..import("q.Base")
        };
        let hidden = ImportDecl {
            is_base: true,
            ..import("q.Hidden")
        };
        let role = TypeDecl {
            played_by: Some(TypeSpec::named("Hidden")),
            ..TypeDecl::class("R")
        };
        let team = TypeDecl {
            modifiers: vec![Modifier::Public, Modifier::Team],
            member_types: vec![role],
            ..TypeDecl::class("Main")
        };
        let u = env.build_unit(unit_with(vec![base, hidden], vec![team])).unwrap();
        env.verify_base_imports(u).unwrap();
        let unused: Vec<_> = env.diagnostics().with_id(UNUSED_BASE_IMPORT).collect();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].arguments, vec!["q.Base".to_string()]);
        assert!(!env.diagnostics().has(IMPORT_NOT_VISIBLE));
    }

    #[test]
    fn test_visibility_rules() {
        let mut env = env();
        let u = env
            .build_unit(unit_with(Vec::new(), vec![TypeDecl::class("Main")]))
            .unwrap();
        let hidden = env.get_type("q.Hidden").unwrap().unwrap();
        let base = env.get_type("q.Base").unwrap().unwrap();
        assert!(!env.is_visible_from(hidden, u, None));
        assert!(env.is_visible_from(base, u, None));
        assert!(env.package_exists("q"));
        assert!(env.package_exists("p"));
        assert!(!env.package_exists("p.Main"));
    }
}
