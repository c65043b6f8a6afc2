//! Name lookup and type reference resolution
//!
//! A simple name is looked up in this order: type variables of the
//! enclosing declarations, member types of the enclosing types (inherited
//! ones included), the unit's own types, single-type imports, the unit's
//! package, on-demand imports and finally the configured implicit imports.
//! Qualified names try the longest package prefix that names a type. Every
//! lookup records the names it depended on in the unit's reference index.

use roleweave_diagnostics::id::{
    AMBIGUOUS_TYPE, INCORRECT_ARITY_FOR_PARAMETERIZED_TYPE, MALFORMED_TYPE_REFERENCE,
    NON_GENERIC_TYPE, NOT_VISIBLE_TYPE, TYPE_ARGUMENT_MISMATCH, UNDEFINED_TYPE,
};
use roleweave_diagnostics::Span;

use crate::decl::{NameSegment, TypeArgSpec, TypeSpec};
use crate::environment::LookupEnvironment;
use crate::error::SessionAbort;
use crate::ids::{BindingId, TypeId, TypeVarId, UnitId};
use crate::names;
use crate::scope::OnDemand;
use crate::types::{ProblemReason, Type, WildcardKind};

/// Where a type reference is written
#[derive(Debug, Clone)]
pub(crate) struct LookupSite {
    pub(crate) unit: UnitId,
    /// Innermost type whose member types are in scope
    pub(crate) members_of: Option<BindingId>,
    /// Innermost type whose type variables are in scope
    pub(crate) vars_of: Option<BindingId>,
    /// Type variables of the enclosing generic method
    pub(crate) method_vars: Vec<TypeVarId>,
    /// Resolving a `playedBy` clause: base imports apply and visibility is
    /// not enforced
    pub(crate) base_context: bool,
    pub(crate) span: Span,
}

impl LookupSite {
    /// Site of the header (`extends`, `implements`, bounds) of `id`
    pub(crate) fn header(env: &LookupEnvironment, id: BindingId, unit: UnitId) -> Self {
        let binding = env.binding(id);
        LookupSite {
            unit,
            members_of: binding.enclosing,
            vars_of: Some(id),
            method_vars: Vec::new(),
            base_context: false,
            span: binding.span,
        }
    }

    /// Site of the members declared in the body of `id`
    pub(crate) fn body(env: &LookupEnvironment, id: BindingId, unit: UnitId) -> Self {
        LookupSite {
            unit,
            members_of: Some(id),
            vars_of: Some(id),
            method_vars: Vec::new(),
            base_context: false,
            span: env.binding(id).span,
        }
    }

    pub(crate) fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// Outcome of a simple-name lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Lookup {
    Found(BindingId),
    NotFound,
    NotVisible(BindingId),
    Ambiguous(Vec<BindingId>),
}

/// A parameterized type whose arguments are checked against their bounds
/// once all hierarchies are known
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoundCheck {
    pub(crate) ty: TypeId,
    pub(crate) unit: UnitId,
    pub(crate) span: Span,
}

impl LookupEnvironment {
    /// Resolve a type reference written at `site`, reporting what cannot be
    /// resolved and standing in a problem type for it
    pub(crate) fn resolve_type_spec(
        &mut self,
        spec: &TypeSpec,
        site: &LookupSite,
    ) -> Result<TypeId, SessionAbort> {
        match spec {
            TypeSpec::Primitive(keyword) => match spec.base_type() {
                Some(base) => Ok(self.primitive(base)),
                None => {
                    self.report_in_unit(site.unit, MALFORMED_TYPE_REFERENCE, site.span, [keyword.clone()]);
                    Ok(self.problem_type(keyword, ProblemReason::NotFound))
                }
            },
            TypeSpec::Array(component) => {
                let component = self.resolve_type_spec(component, site)?;
                Ok(self.intern(Type::Array(component)))
            }
            TypeSpec::Variable(name) => match self.lookup_type_var(name, site)? {
                Some(var) => Ok(self.type_var(var).declared_type),
                None => {
                    self.record_reference(site.unit, &[name.as_str()]);
                    self.report_in_unit(site.unit, UNDEFINED_TYPE, site.span, [name.clone()]);
                    Ok(self.problem_type(name, ProblemReason::NotFound))
                }
            },
            // the role is looked up in the anchor's team once the anchor
            // resolves; until then a role in scope stands in for it
            TypeSpec::Anchored { role, .. } => match self.find_type(role, site)? {
                Lookup::Found(found) => Ok(self.binding(found).declared_type),
                _ => Ok(self.problem_type(role, ProblemReason::InvalidAnchor)),
            },
            TypeSpec::Named(segments) => self.resolve_named(segments, site),
        }
    }

    fn resolve_named(
        &mut self,
        segments: &[NameSegment],
        site: &LookupSite,
    ) -> Result<TypeId, SessionAbort> {
        let written: Vec<&str> = segments.iter().map(|s| s.name.as_str()).collect();
        self.record_reference(site.unit, &written);
        let Some(first) = segments.first() else {
            self.report_in_unit(site.unit, MALFORMED_TYPE_REFERENCE, site.span, [String::new()]);
            return Ok(self.problem_type("", ProblemReason::NotFound));
        };
        let display = written.join(".");

        if segments.len() == 1 && first.args.is_empty() {
            if let Some(var) = self.lookup_type_var(&first.name, site)? {
                return Ok(self.type_var(var).declared_type);
            }
        }

        // resolve the head: a simple name in scope, or the longest prefix
        // that names a type through its package
        let (head, consumed) = match self.find_type(&first.name, site)? {
            Lookup::Found(id) => (id, 1),
            Lookup::NotVisible(id) if segments.len() == 1 => {
                let name = self.binding(id).name.clone();
                self.report_in_unit(site.unit, NOT_VISIBLE_TYPE, site.span, [name.clone()]);
                return Ok(self.problem_type(&name, ProblemReason::NotVisible));
            }
            Lookup::Ambiguous(candidates) => {
                let mut args = vec![display.clone()];
                args.extend(candidates.iter().map(|c| self.binding(*c).name.clone()));
                self.report_in_unit(site.unit, AMBIGUOUS_TYPE, site.span, args);
                return Ok(self.problem_type(&display, ProblemReason::Ambiguous));
            }
            Lookup::NotVisible(_) | Lookup::NotFound => {
                match self.find_qualified_head(segments)? {
                    Some(found) => found,
                    None => {
                        self.report_in_unit(site.unit, UNDEFINED_TYPE, site.span, [display.clone()]);
                        return Ok(self.problem_type(&display, ProblemReason::NotFound));
                    }
                }
            }
        };

        if !site.base_context && consumed > 1 && !self.is_visible_from(head, site.unit, site.members_of) {
            let name = self.binding(head).name.clone();
            self.report_in_unit(site.unit, NOT_VISIBLE_TYPE, site.span, [name.clone()]);
            return Ok(self.problem_type(&name, ProblemReason::NotVisible));
        }

        let mut current = self.apply_type_args(head, &segments[consumed - 1].args, None, site)?;
        let mut binding = head;
        for segment in &segments[consumed..] {
            let Some(member) = self.find_member_type(binding, &segment.name)? else {
                self.report_in_unit(site.unit, UNDEFINED_TYPE, site.span, [display.clone()]);
                return Ok(self.problem_type(&display, ProblemReason::NotFound));
            };
            if !site.base_context && !self.is_visible_from(member, site.unit, site.members_of) {
                let name = self.binding(member).name.clone();
                self.report_in_unit(site.unit, NOT_VISIBLE_TYPE, site.span, [name.clone()]);
                return Ok(self.problem_type(&name, ProblemReason::NotVisible));
            }
            let enclosing = if self.binding(member).modifiers.is_static() {
                None
            } else {
                Some(current).filter(|e| matches!(self.ty(*e), Type::Parameterized { .. }))
            };
            current = self.apply_type_args(member, &segment.args, enclosing, site)?;
            binding = member;
        }
        let resolved_name = self.binding(binding).name.clone();
        self.units[site.unit.index()]
            .references
            .record_qualified(&resolved_name);
        Ok(current)
    }

    /// First binding named by a package-qualified prefix of `segments`, and
    /// how many segments it consumed
    fn find_qualified_head(
        &mut self,
        segments: &[NameSegment],
    ) -> Result<Option<(BindingId, usize)>, SessionAbort> {
        let mut package = String::new();
        for (i, segment) in segments.iter().enumerate().take(segments.len().saturating_sub(1)) {
            if !package.is_empty() {
                package.push('.');
            }
            package.push_str(&segment.name);
            let candidate = names::qualify(&package, &segments[i + 1].name);
            if let Some(found) = self.get_type(&candidate)? {
                if !self.binding(found).is_problem() {
                    return Ok(Some((found, i + 2)));
                }
            }
        }
        Ok(None)
    }

    fn lookup_type_var(
        &mut self,
        name: &str,
        site: &LookupSite,
    ) -> Result<Option<TypeVarId>, SessionAbort> {
        if let Some(var) = site
            .method_vars
            .iter()
            .copied()
            .find(|v| self.type_var(*v).name == name)
        {
            return Ok(Some(var));
        }
        let Some(owner) = site.vars_of else {
            return Ok(None);
        };
        for t in self.enclosing_chain(owner) {
            if !self.is_generic(t) {
                continue;
            }
            let vars = self.type_variables(t)?;
            if let Some(var) = vars.iter().copied().find(|v| self.type_var(*v).name == name) {
                return Ok(Some(var));
            }
        }
        Ok(None)
    }

    /// Look a simple type name up from `site`
    pub(crate) fn find_type(&mut self, simple: &str, site: &LookupSite) -> Result<Lookup, SessionAbort> {
        if let Some(inner) = site.members_of {
            for t in self.enclosing_chain(inner) {
                if self.binding(t).simple_name == simple {
                    return Ok(Lookup::Found(t));
                }
                if let Some(member) = self.find_member_type(t, simple)? {
                    return Ok(self.check_visible(member, site));
                }
            }
        }

        let own = self
            .unit(site.unit)
            .types
            .iter()
            .copied()
            .find(|t| self.binding(*t).simple_name == simple);
        if let Some(own) = own {
            return Ok(Lookup::Found(own));
        }

        let imports = self.fault_in_imports(site.unit)?;
        if let Some(imported) = imports.single(simple) {
            return Ok(Lookup::Found(imported));
        }
        if site.base_context {
            if let Some(base) = imports.base_named(simple) {
                return Ok(Lookup::Found(base));
            }
        }

        let package = self.unit(site.unit).package().to_string();
        if let Some(found) = self.get_type(&names::qualify(&package, simple))? {
            if !self.binding(found).is_problem() {
                return Ok(self.check_visible(found, site));
            }
        }

        let mut candidates: Vec<BindingId> = Vec::new();
        for target in imports.on_demand.iter() {
            let found = match target {
                OnDemand::Package(pkg) => self
                    .get_type(&names::qualify(pkg, simple))?
                    .filter(|b| !self.binding(*b).is_problem()),
                OnDemand::Type(owner) => self.find_member_type(*owner, simple)?,
            };
            if let Some(found) = found {
                if !candidates.contains(&found) {
                    candidates.push(found);
                }
            }
        }
        match candidates.len() {
            0 => {}
            1 => return Ok(self.check_visible(candidates[0], site)),
            _ => return Ok(Lookup::Ambiguous(candidates)),
        }

        let implicit = self.options.implicit_imports.clone();
        for pkg in &implicit {
            if let Some(found) = self.get_type(&names::qualify(pkg, simple))? {
                if !self.binding(found).is_problem() {
                    return Ok(self.check_visible(found, site));
                }
            }
        }
        Ok(Lookup::NotFound)
    }

    fn check_visible(&self, found: BindingId, site: &LookupSite) -> Lookup {
        if site.base_context || self.is_visible_from(found, site.unit, site.members_of) {
            Lookup::Found(found)
        } else {
            Lookup::NotVisible(found)
        }
    }

    fn record_reference(&mut self, unit: UnitId, segments: &[&str]) {
        self.units[unit.index()].references.record(segments);
    }

    /// Apply written type arguments to `binding`
    fn apply_type_args(
        &mut self,
        binding: BindingId,
        args: &[TypeArgSpec],
        enclosing: Option<TypeId>,
        site: &LookupSite,
    ) -> Result<TypeId, SessionAbort> {
        if args.is_empty() {
            return Ok(self.instantiate(binding, Vec::new(), enclosing));
        }
        if !self.is_generic(binding) {
            let name = self.binding(binding).name.clone();
            self.report_in_unit(site.unit, NON_GENERIC_TYPE, site.span, [name]);
            return Ok(self.binding(binding).declared_type);
        }
        let vars = self.type_variables(binding)?;
        if vars.len() != args.len() {
            let name = self.binding(binding).name.clone();
            self.report_in_unit(
                site.unit,
                INCORRECT_ARITY_FOR_PARAMETERIZED_TYPE,
                site.span,
                [name, vars.len().to_string(), args.len().to_string()],
            );
            return Ok(self.instantiate(binding, Vec::new(), enclosing));
        }
        let mut resolved = Vec::with_capacity(args.len());
        for arg in args {
            let ty = match arg {
                TypeArgSpec::Type(spec) => self.resolve_type_spec(spec, site)?,
                TypeArgSpec::Wildcard => self.intern(Type::Wildcard {
                    kind: WildcardKind::Unbounded,
                    bound: None,
                }),
                TypeArgSpec::Extends(spec) => {
                    let bound = self.resolve_type_spec(spec, site)?;
                    self.intern(Type::Wildcard {
                        kind: WildcardKind::Extends,
                        bound: Some(bound),
                    })
                }
                TypeArgSpec::Super(spec) => {
                    let bound = self.resolve_type_spec(spec, site)?;
                    self.intern(Type::Wildcard {
                        kind: WildcardKind::Super,
                        bound: Some(bound),
                    })
                }
            };
            resolved.push(ty);
        }
        let ty = self.instantiate(binding, resolved, enclosing);
        self.deferred_bound_checks.push(BoundCheck {
            ty,
            unit: site.unit,
            span: site.span,
        });
        Ok(ty)
    }

    /// Check the arguments of every parameterized type written in source
    /// against the bounds of their type variables
    pub fn check_deferred_bounds(&mut self) -> Result<(), SessionAbort> {
        let checks = std::mem::take(&mut self.deferred_bound_checks);
        for check in checks {
            let Type::Parameterized { generic, args, .. } = self.ty(check.ty).clone() else {
                continue;
            };
            let vars = self.type_variables(generic)?;
            let subst = self.substitution_for(check.ty)?;
            for (var, arg) in vars.iter().zip(args.iter()) {
                if matches!(self.ty(*arg), Type::Wildcard { .. }) || self.is_problem_type(*arg) {
                    continue;
                }
                let bounds = self.type_var(*var).bounds.clone();
                for bound in bounds {
                    let bound = match &subst {
                        Some(subst) => self.substitute(subst, bound)?,
                        None => bound,
                    };
                    if !self.is_subtype(*arg, bound)? {
                        let args = [
                            self.type_name(*arg),
                            self.type_var(*var).name.clone(),
                            self.type_name(check.ty),
                        ];
                        self.report_in_unit(check.unit, TYPE_ARGUMENT_MISMATCH, check.span, args);
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
