//! Superclass and super-interface resolution
//!
//! Candidates come from the declaration or the descriptor; each edge is then
//! checked before it is stored. A problem supertype is kept and marks the
//! hierarchy as faulty, a cyclic superclass edge is replaced by the root
//! type and a cyclic interface edge is dropped. While a binding's
//! supertypes are being resolved it answers "no supertypes", which is what
//! lets the cycle walk terminate.

use rustc_hash::FxHashSet;
use tracing::debug;

use roleweave_diagnostics::id::{
    CLASS_EXTENDS_FINAL_CLASS, HIERARCHY_CIRCULARITY, HIERARCHY_HAS_PROBLEMS,
    SUPERCLASS_MUST_BE_CLASS, SUPER_INTERFACE_MUST_BE_INTERFACE,
};

use crate::binding::{BindingOrigin, Supertypes};
use crate::environment::{LookupEnvironment, WellKnown};
use crate::error::SessionAbort;
use crate::ids::{BindingId, TypeId};
use crate::lazy::Lazy;

impl LookupEnvironment {
    /// Superclass and super-interfaces of `id`
    pub fn supertypes(&mut self, id: BindingId) -> Result<Supertypes, SessionAbort> {
        match &self.binding(id).supertypes {
            Lazy::Resolved(supertypes) => return Ok(supertypes.clone()),
            Lazy::InProgress => return Ok(Supertypes::none()),
            Lazy::Unresolved => {}
        }
        self.binding_mut(id).supertypes = Lazy::InProgress;
        debug!(binding = %self.binding(id).name, "resolving supertypes");

        let (superclass, interfaces) = match self.binding(id).origin.clone() {
            BindingOrigin::Source { decl, .. } => self.source_supertype_candidates(id, &decl)?,
            BindingOrigin::Binary(desc) => self.binary_supertype_candidates(id, &desc)?,
            BindingOrigin::Problem(_) => (None, Vec::new()),
        };

        let superclass = match superclass {
            Some(candidate) => self.check_supertype_edge(id, candidate, true)?,
            None => None,
        };
        let mut checked = Vec::with_capacity(interfaces.len());
        for candidate in interfaces {
            if let Some(iface) = self.check_supertype_edge(id, candidate, false)? {
                if !checked.contains(&iface) {
                    checked.push(iface);
                }
            }
        }

        let supertypes = Supertypes {
            superclass,
            interfaces: checked.into(),
        };
        self.binding_mut(id).supertypes = Lazy::Resolved(supertypes.clone());

        let binding = self.binding(id);
        if binding.hierarchy_has_problems && !binding.is_problem() && binding.unit().is_some() {
            let name = binding.name.clone();
            let span = binding.span;
            self.report_for(id, HIERARCHY_HAS_PROBLEMS, span, [name]);
        }
        Ok(supertypes)
    }

    /// Implicit superclass of a type declared without one
    pub(crate) fn default_superclass(&mut self, id: BindingId) -> Result<Option<TypeId>, SessionAbort> {
        let binding = self.binding(id);
        if self.is_object(id) || binding.is_interface() || self.is_confined(id) {
            return Ok(None);
        }
        if binding.is_team() && binding.name != self.options.well_known.team {
            return Ok(Some(self.well_known_type(WellKnown::Team)?));
        }
        Ok(Some(self.well_known_type(WellKnown::Object)?))
    }

    fn check_supertype_edge(
        &mut self,
        id: BindingId,
        candidate: TypeId,
        is_superclass: bool,
    ) -> Result<Option<TypeId>, SessionAbort> {
        let from_source = self.binding(id).unit().is_some();
        let span = self.binding(id).span;
        let Some(target) = self.binding_of_type(candidate) else {
            if from_source {
                let problem = if is_superclass {
                    SUPERCLASS_MUST_BE_CLASS
                } else {
                    SUPER_INTERFACE_MUST_BE_INTERFACE
                };
                let args = [self.binding(id).name.clone(), self.type_name(candidate)];
                self.report_for(id, problem, span, args);
            }
            return self.replacement_edge(id, is_superclass);
        };

        if self.binding(target).is_problem() {
            self.binding_mut(id).hierarchy_has_problems = true;
            return Ok(Some(candidate));
        }

        if target == id || self.reaches(target, id)? {
            let args = [self.binding(id).name.clone(), self.binding(target).name.clone()];
            self.report_for(id, HIERARCHY_CIRCULARITY, span, args);
            return self.replacement_edge(id, is_superclass);
        }

        if self.binding(target).hierarchy_has_problems {
            self.binding_mut(id).hierarchy_has_problems = true;
        }

        if from_source {
            let target_binding = self.binding(target);
            let own_is_interface = self.binding(id).is_interface();
            if is_superclass && target_binding.is_interface() && !own_is_interface {
                let args = [self.binding(id).name.clone(), target_binding.name.clone()];
                self.report_for(id, SUPERCLASS_MUST_BE_CLASS, span, args);
                return self.replacement_edge(id, true);
            }
            if !is_superclass && !target_binding.is_interface() {
                let args = [self.binding(id).name.clone(), target_binding.name.clone()];
                self.report_for(id, SUPER_INTERFACE_MUST_BE_INTERFACE, span, args);
                return Ok(None);
            }
            if is_superclass && target_binding.modifiers.is_final() {
                let args = [self.binding(id).name.clone(), target_binding.name.clone()];
                self.report_for(id, CLASS_EXTENDS_FINAL_CLASS, span, args);
            }
        }
        Ok(Some(candidate))
    }

    fn replacement_edge(
        &mut self,
        id: BindingId,
        is_superclass: bool,
    ) -> Result<Option<TypeId>, SessionAbort> {
        if !is_superclass || self.is_object(id) {
            return Ok(None);
        }
        Ok(Some(self.well_known_type(WellKnown::Object)?))
    }

    /// Whether `target` is `from` or one of its transitive supertypes
    pub(crate) fn reaches(&mut self, from: BindingId, target: BindingId) -> Result<bool, SessionAbort> {
        let mut visited = FxHashSet::default();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == target {
                return Ok(true);
            }
            if !visited.insert(current) {
                continue;
            }
            let supertypes = self.supertypes(current)?;
            if let Some(superclass) = supertypes.superclass.and_then(|s| self.binding_of_type(s)) {
                stack.push(superclass);
            }
            for iface in supertypes.interfaces.iter() {
                if let Some(b) = self.binding_of_type(*iface) {
                    stack.push(b);
                }
            }
        }
        Ok(false)
    }

    /// Whether `sub` is `sup` or inherits from it
    pub fn is_subclass_of(&mut self, sub: BindingId, sup: BindingId) -> Result<bool, SessionAbort> {
        self.reaches(sub, sup)
    }
}

#[cfg(test)]
mod tests {
    use roleweave_descriptor::TypeDescriptor;

    use crate::config::BinderOptions;
    use crate::provider::InMemoryProvider;
    use crate::types::ProblemReason;

    use super::*;

    fn env_with(types: Vec<TypeDescriptor>) -> LookupEnvironment {
        let options = BinderOptions::default();
        let mut provider = InMemoryProvider::with_core(&options.well_known);
        for desc in types {
            provider.insert(desc);
        }
        LookupEnvironment::new(Box::new(provider), options).unwrap()
    }

    fn class(name: &str, superclass: &str) -> TypeDescriptor {
        let mut desc = TypeDescriptor::new(name);
        desc.superclass = Some(superclass.to_string());
        desc
    }

    #[test]
    fn test_cycle_is_reported_and_broken() {
        let mut env = env_with(vec![class("q.A", "q.B"), class("q.B", "q.A")]);
        let a = env.get_type("q.A").unwrap().unwrap();
        let object = env.well_known_type(WellKnown::Object).unwrap();
        assert_eq!(env.superclass(a).unwrap(), Some(object));
        assert!(env.diagnostics().has(HIERARCHY_CIRCULARITY));

        let b = env.get_type("q.B").unwrap().unwrap();
        let b_super = env.superclass(b).unwrap().unwrap();
        assert_eq!(env.binding_of_type(b_super), Some(a));
        assert!(!env.reaches(a, b).unwrap());
    }

    #[test]
    fn test_confined_root_has_no_superclass() {
        let mut env = env_with(Vec::new());
        let confined = env.well_known(WellKnown::Confined).unwrap();
        assert_eq!(env.superclass(confined).unwrap(), None);
        assert!(env.super_interfaces(confined).unwrap().is_empty());
        assert!(env.diagnostics().problems().is_empty());
        assert_eq!(env.default_superclass(confined).unwrap(), None);
    }

    #[test]
    fn test_missing_supertype_marks_hierarchy() {
        let mut env = env_with(vec![class("q.C", "q.Missing"), class("q.D", "q.C")]);
        let d = env.get_type("q.D").unwrap().unwrap();
        env.supertypes(d).unwrap();
        assert!(env.binding(d).hierarchy_has_problems());

        let c = env.get_type("q.C").unwrap().unwrap();
        let c_super = env.superclass(c).unwrap().unwrap();
        let missing = env.binding_of_type(c_super).unwrap();
        assert_eq!(env.binding(missing).problem_reason(), Some(ProblemReason::NotFound));
    }

    #[test]
    fn test_subclass_walk() {
        let mut env = env_with(vec![class("q.A", "core.Object"), class("q.B", "q.A")]);
        let a = env.get_type("q.A").unwrap().unwrap();
        let b = env.get_type("q.B").unwrap().unwrap();
        let object = env.well_known(WellKnown::Object).unwrap();
        assert!(env.is_subclass_of(b, a).unwrap());
        assert!(env.is_subclass_of(b, object).unwrap());
        assert!(!env.is_subclass_of(a, b).unwrap());
    }
}
