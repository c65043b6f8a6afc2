//! Whole-session resolution
//!
//! A [`Session`] owns the environment and the units added to it and drives
//! every lazy component to completion in a fixed order, so that all
//! problems of a set of units are reported in one pass.

use roleweave_descriptor::Modifiers;
use roleweave_diagnostics::id::{INCOMPATIBLE_RETURN_TYPE, METHOD_REDUCES_VISIBILITY};
use roleweave_diagnostics::Problem;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::binding::MethodOrigin;
use crate::config::BinderOptions;
use crate::decl::CompilationUnitDecl;
use crate::environment::LookupEnvironment;
use crate::error::SessionAbort;
use crate::ids::{BindingId, MethodId, UnitId};
use crate::provider::TypeProvider;

/// Units compiled together over one environment
pub struct Session {
    env: LookupEnvironment,
    units: Vec<UnitId>,
}

impl Session {
    /// Create an empty session
    pub fn new(provider: Box<dyn TypeProvider>, options: BinderOptions) -> Result<Self, SessionAbort> {
        Ok(Session {
            env: LookupEnvironment::new(provider, options)?,
            units: Vec::new(),
        })
    }

    /// Build bindings for `units`; role files are built after every
    /// regular unit so their teams exist
    pub fn add_units(&mut self, units: Vec<CompilationUnitDecl>) -> Result<&[UnitId], SessionAbort> {
        let first = self.units.len();
        let (role_files, regular): (Vec<_>, Vec<_>) =
            units.into_iter().partition(|u| u.team_package.is_some());
        for decl in regular.into_iter().chain(role_files) {
            let unit = self.env.build_unit(decl)?;
            self.units.push(unit);
        }
        Ok(&self.units[first..])
    }

    /// Resolve everything the added units declare and report what is wrong
    /// with it
    pub fn resolve(&mut self) -> Result<(), SessionAbort> {
        debug!(units = self.units.len(), "resolving session");
        self.env.check_package_collisions();
        for unit in &self.units {
            self.env.fault_in_imports(*unit)?;
        }

        // resolution may create further bindings
        let mut next = 0;
        while next < self.env.binding_count() {
            self.env.resolve_all_components(BindingId::from_index(next))?;
            next += 1;
        }
        self.env.check_deferred_bounds()?;
        for unit in &self.units {
            self.env.verify_base_imports(*unit)?;
        }

        let declared: Vec<BindingId> = self
            .units
            .iter()
            .flat_map(|u| self.declared_types(*u))
            .collect();
        for id in &declared {
            if self.env.binding(*id).is_role() {
                self.env.mappings(*id)?;
                for method in self.env.methods(*id)?.iter() {
                    self.env.check_base_calls(*method);
                }
            }
        }
        for id in &declared {
            if self.env.binding(*id).is_team() {
                self.env.precedence(*id)?;
            }
            self.env.check_overrides(*id)?;
        }
        debug!(
            problems = self.env.diagnostics().problems().len(),
            "session resolved"
        );
        Ok(())
    }

    /// Types declared by `unit`, member types included
    fn declared_types(&self, unit: UnitId) -> Vec<BindingId> {
        let mut found = Vec::new();
        let mut stack: Vec<BindingId> = self.env.unit(unit).types().to_vec();
        while let Some(id) = stack.pop() {
            found.push(id);
            let members = self.env.binding(id).member_types.as_resolved().cloned();
            for member in members.iter().flat_map(|m| m.iter()) {
                if self.env.binding(*member).unit() == Some(unit) {
                    stack.push(*member);
                }
            }
        }
        found.sort_by_key(|id| id.index());
        found
    }

    /// Units added so far
    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    /// The environment
    pub fn env(&self) -> &LookupEnvironment {
        &self.env
    }

    /// The environment, for further queries
    pub fn env_mut(&mut self) -> &mut LookupEnvironment {
        &mut self.env
    }

    /// Consume the session, yielding its problems
    pub fn into_problems(self) -> Vec<Problem> {
        self.env.into_problems()
    }
}

fn visibility_rank(modifiers: Modifiers) -> u8 {
    if modifiers.is_public() {
        3
    } else if modifiers.contains(Modifiers::PROTECTED) {
        2
    } else if modifiers.is_private() {
        0
    } else {
        1
    }
}

impl LookupEnvironment {
    /// Check the source methods of `id` against the superclass methods
    /// they override
    pub fn check_overrides(&mut self, id: BindingId) -> Result<(), SessionAbort> {
        let mut inherited: Vec<MethodId> = Vec::new();
        let mut visited = FxHashSet::default();
        let mut current = self.superclass(id)?;
        while let Some(ty) = current {
            if !visited.insert(ty) {
                break;
            }
            inherited.extend(self.type_methods(ty)?.iter().copied());
            current = self.type_supertypes(ty)?.superclass;
        }
        if inherited.is_empty() {
            return Ok(());
        }

        let own = self.methods(id)?;
        for method in own.iter().copied() {
            let m = self.method(method);
            if !matches!(m.origin, MethodOrigin::Source(_))
                || m.is_constructor()
                || m.modifiers.is_static()
                || m.modifiers.is_private()
            {
                continue;
            }
            let overridden = inherited.iter().copied().find(|s| {
                let sm = self.method(*s);
                sm.name == self.method(method).name
                    && !sm.modifiers.is_private()
                    && !sm.modifiers.is_static()
                    && !sm.is_constructor()
                    && self.same_declared_erasure(method, *s)
            });
            let Some(overridden) = overridden else {
                continue;
            };

            let ret = self.method(method).declared.ret;
            let super_ret = self.method(overridden).declared.ret;
            let problem_ret = self.is_problem_type(ret) || self.is_problem_type(super_ret);
            if !problem_ret && ret != super_ret && !self.is_subtype(ret, super_ret)? {
                let shown = [self.method_display(method), self.method_display(overridden)];
                let span = self.method(method).span;
                self.report_for(id, INCOMPATIBLE_RETURN_TYPE, span, shown);
            }
            if visibility_rank(self.method(method).modifiers) < visibility_rank(self.method(overridden).modifiers) {
                let shown = [self.method_display(method), self.method_display(overridden)];
                let span = self.method(method).span;
                self.report_for(id, METHOD_REDUCES_VISIBILITY, span, shown);
            }
        }
        Ok(())
    }
}
