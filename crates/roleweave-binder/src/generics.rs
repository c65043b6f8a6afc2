//! Generic instantiation: substitution, erasure and type relations
//!
//! Instantiations are interned `Type::Parameterized` / `Type::Raw` entries.
//! Their members are derived from the generic binding on first request by
//! substituting the arguments for the type variables, and memoized per
//! instantiation in [`ParamMembers`]. For a raw instantiation every type
//! variable maps to its erasure.

use std::rc::Rc;

use roleweave_descriptor::BaseType;
use roleweave_diagnostics::Span;
use rustc_hash::FxHashSet;

use crate::binding::{FieldBinding, FieldOrigin, MethodOrigin, Supertypes};
use crate::environment::{LookupEnvironment, WellKnown};
use crate::error::SessionAbort;
use crate::ids::{BindingId, FieldId, MethodId, TypeId, TypeVarId};
use crate::resolve::MethodParts;
use crate::types::{CaptureInfo, Type, WildcardKind};

/// Mapping from type variables to arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    vars: Vec<TypeVarId>,
    args: Vec<TypeId>,
    raw: bool,
    enclosing: Option<Box<Substitution>>,
}

impl Substitution {
    /// Substitution of `args` for `vars`
    pub fn new(vars: Vec<TypeVarId>, args: Vec<TypeId>) -> Self {
        Substitution {
            vars,
            args,
            raw: false,
            enclosing: None,
        }
    }

    /// Whether variables map to their erasure
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    fn lookup(&self, var: TypeVarId) -> Option<VarImage> {
        match self.vars.iter().position(|v| *v == var) {
            Some(_) if self.raw => Some(VarImage::Erased),
            Some(i) => self.args.get(i).copied().map(VarImage::Arg),
            None => self.enclosing.as_deref().and_then(|e| e.lookup(var)),
        }
    }
}

enum VarImage {
    Arg(TypeId),
    Erased,
}

/// Members of one instantiation, derived on first request
#[derive(Debug, Clone, Default)]
pub(crate) struct ParamMembers {
    supertypes: Option<Supertypes>,
    fields: Option<Rc<[FieldId]>>,
    methods: Option<Rc<[MethodId]>>,
    member_types: Option<Rc<[TypeId]>>,
}

/// Erased shape of a type, compared without interning
#[derive(Debug, PartialEq, Eq)]
enum Erased {
    Primitive(BaseType),
    Null,
    Class(BindingId),
    Root,
    Array(Box<Erased>),
}

impl LookupEnvironment {
    // ── Instantiation ───────────────────────────────────────────────────

    /// Type of `generic` applied to `args`; raw when a generic type gets no
    /// arguments
    pub fn instantiate(
        &mut self,
        generic: BindingId,
        args: Vec<TypeId>,
        enclosing: Option<TypeId>,
    ) -> TypeId {
        if args.is_empty() && self.is_generic(generic) {
            return self.intern(Type::Raw { generic, enclosing });
        }
        if !args.is_empty() || enclosing.is_some() {
            return self.intern(Type::Parameterized {
                generic,
                args,
                enclosing,
            });
        }
        self.binding(generic).declared_type
    }

    /// `generic` used without arguments
    pub fn bare_type(&mut self, binding: BindingId) -> TypeId {
        self.instantiate(binding, Vec::new(), None)
    }

    /// Substitution an instantiation applies to its generic's members
    pub fn substitution_for(&mut self, ty: TypeId) -> Result<Option<Substitution>, SessionAbort> {
        let (generic, args, raw, enclosing) = match self.ty(ty).clone() {
            Type::Parameterized {
                generic,
                args,
                enclosing,
            } => (generic, args, false, enclosing),
            Type::Raw { generic, enclosing } => (generic, Vec::new(), true, enclosing),
            Type::Anchored { role, .. } => return self.substitution_for(role),
            _ => return Ok(None),
        };
        let vars = self.type_variables(generic)?.to_vec();
        let enclosing = match enclosing {
            Some(outer) => self.substitution_for(outer)?.map(Box::new),
            None => None,
        };
        Ok(Some(Substitution {
            vars,
            args,
            raw,
            enclosing,
        }))
    }

    /// Rewrite every type variable occurrence in `ty`
    pub fn substitute(&mut self, subst: &Substitution, ty: TypeId) -> Result<TypeId, SessionAbort> {
        match self.ty(ty).clone() {
            Type::Variable(var) => match subst.lookup(var) {
                Some(VarImage::Arg(arg)) => Ok(arg),
                Some(VarImage::Erased) => self.erasure(ty),
                None => Ok(ty),
            },
            Type::Parameterized {
                generic,
                args,
                enclosing,
            } => {
                let mut substituted = Vec::with_capacity(args.len());
                for arg in args {
                    substituted.push(self.substitute(subst, arg)?);
                }
                let enclosing = match enclosing {
                    Some(outer) => Some(self.substitute(subst, outer)?),
                    None => None,
                };
                Ok(self.intern(Type::Parameterized {
                    generic,
                    args: substituted,
                    enclosing,
                }))
            }
            Type::Raw {
                generic,
                enclosing: Some(outer),
            } => {
                let enclosing = Some(self.substitute(subst, outer)?);
                Ok(self.intern(Type::Raw { generic, enclosing }))
            }
            Type::Wildcard {
                kind,
                bound: Some(bound),
            } => {
                let bound = Some(self.substitute(subst, bound)?);
                Ok(self.intern(Type::Wildcard { kind, bound }))
            }
            Type::Array(component) => {
                let component = self.substitute(subst, component)?;
                Ok(self.intern(Type::Array(component)))
            }
            Type::Anchored { role, anchor } => {
                let role = self.substitute(subst, role)?;
                Ok(self.intern(Type::Anchored { role, anchor }))
            }
            _ => Ok(ty),
        }
    }

    /// Erasure of `ty`: instantiations erase to their generic's declared
    /// type, type variables to the erasure of their first bound
    pub fn erasure(&mut self, ty: TypeId) -> Result<TypeId, SessionAbort> {
        let mut seen = FxHashSet::default();
        self.erasure_inner(ty, &mut seen)
    }

    fn erasure_inner(
        &mut self,
        ty: TypeId,
        seen: &mut FxHashSet<TypeVarId>,
    ) -> Result<TypeId, SessionAbort> {
        match self.ty(ty).clone() {
            Type::Parameterized { generic, .. } | Type::Raw { generic, .. } => {
                Ok(self.binding(generic).declared_type)
            }
            Type::Variable(var) => {
                let first = self.type_var(var).bounds.first().copied();
                match first {
                    Some(bound) if seen.insert(var) => self.erasure_inner(bound, seen),
                    _ => self.well_known_type(WellKnown::Object),
                }
            }
            Type::Captured(capture) => {
                let upper = self.capture_info(capture).upper;
                self.erasure_inner(upper, seen)
            }
            Type::Wildcard {
                kind: WildcardKind::Extends,
                bound: Some(bound),
            } => self.erasure_inner(bound, seen),
            Type::Wildcard { .. } => self.well_known_type(WellKnown::Object),
            Type::Array(component) => {
                let component = self.erasure_inner(component, seen)?;
                Ok(self.intern(Type::Array(component)))
            }
            Type::Anchored { role, .. } => self.erasure_inner(role, seen),
            _ => Ok(ty),
        }
    }

    /// Whether two types have the same erasure, without interning anything
    pub fn erasure_eq(&self, a: TypeId, b: TypeId) -> bool {
        a == b || self.erased(a, 0) == self.erased(b, 0)
    }

    fn erased(&self, ty: TypeId, depth: usize) -> Erased {
        if depth > 32 {
            return Erased::Root;
        }
        match self.ty(ty) {
            Type::Primitive(base) => Erased::Primitive(*base),
            Type::Null => Erased::Null,
            Type::Declared(b) if self.is_object(*b) => Erased::Root,
            Type::Declared(b)
            | Type::Parameterized { generic: b, .. }
            | Type::Raw { generic: b, .. } => Erased::Class(*b),
            Type::Variable(var) => match self.type_var(*var).bounds.first() {
                Some(bound) => self.erased(*bound, depth + 1),
                None => Erased::Root,
            },
            Type::Captured(capture) => self.erased(self.capture_info(*capture).upper, depth + 1),
            Type::Wildcard {
                kind: WildcardKind::Extends,
                bound: Some(bound),
            } => self.erased(*bound, depth + 1),
            Type::Wildcard { .. } => Erased::Root,
            Type::Array(component) => Erased::Array(Box::new(self.erased(*component, depth + 1))),
            Type::Anchored { role, .. } => self.erased(*role, depth + 1),
        }
    }

    // ── Members of instantiations ───────────────────────────────────────

    fn param_members(&mut self, ty: TypeId) -> &mut ParamMembers {
        self.param_members.entry(ty).or_default()
    }

    /// Supertypes of any reference type, substituted for instantiations
    pub fn type_supertypes(&mut self, ty: TypeId) -> Result<Supertypes, SessionAbort> {
        let generic = match self.ty(ty).clone() {
            Type::Declared(b) => return self.supertypes(b),
            Type::Parameterized { generic, .. } | Type::Raw { generic, .. } => generic,
            Type::Anchored { role, .. } => return self.type_supertypes(role),
            Type::Captured(capture) => {
                let upper = self.capture_info(capture).upper;
                return Ok(Supertypes {
                    superclass: Some(upper),
                    interfaces: Rc::from(Vec::new()),
                });
            }
            Type::Variable(var) => {
                let bounds = self.type_var(var).bounds.clone();
                let superclass = match bounds.first() {
                    Some(first) => Some(*first),
                    None => Some(self.well_known_type(WellKnown::Object)?),
                };
                return Ok(Supertypes {
                    superclass,
                    interfaces: Rc::from(bounds.get(1..).unwrap_or_default().to_vec()),
                });
            }
            _ => return Ok(Supertypes::none()),
        };
        if let Some(cached) = self.param_member_slot(ty, |m| m.supertypes.clone()) {
            return Ok(cached);
        }
        let declared = self.supertypes(generic)?;
        let subst = self.substitution_for(ty)?;
        let superclass = match (declared.superclass, &subst) {
            (Some(sc), Some(subst)) => Some(self.substitute(subst, sc)?),
            (sc, _) => sc,
        };
        let mut interfaces = Vec::with_capacity(declared.interfaces.len());
        for iface in declared.interfaces.iter() {
            interfaces.push(match &subst {
                Some(subst) => self.substitute(subst, *iface)?,
                None => *iface,
            });
        }
        let supertypes = Supertypes {
            superclass,
            interfaces: Rc::from(interfaces),
        };
        self.param_members(ty).supertypes = Some(supertypes.clone());
        Ok(supertypes)
    }

    fn param_member_slot<T>(&self, ty: TypeId, get: impl Fn(&ParamMembers) -> Option<T>) -> Option<T> {
        self.param_members.get(&ty).and_then(get)
    }

    /// Fields of any reference type, substituted for instantiations
    pub fn type_fields(&mut self, ty: TypeId) -> Result<Rc<[FieldId]>, SessionAbort> {
        let (generic, subst) = match self.instantiation_parts(ty)? {
            Some(parts) => parts,
            None => {
                return match self.binding_of_type(ty) {
                    Some(b) => self.fields(b),
                    None => Ok(Rc::from(Vec::new())),
                }
            }
        };
        if let Some(cached) = self.param_member_slot(ty, |m| m.fields.clone()) {
            return Ok(cached);
        }
        let originals = self.fields(generic)?;
        let mut list = Vec::with_capacity(originals.len());
        for original in originals.iter().copied() {
            let declared = self.field_type(original)?;
            let substituted = self.substitute(&subst, declared)?;
            let source = self.field(original).clone();
            list.push(self.push_field(FieldBinding {
                id: FieldId::from_index(0),
                ty: substituted,
                pending_anchor: None,
                origin: FieldOrigin::Parameterized { original },
                ..source
            }));
        }
        let list: Rc<[FieldId]> = Rc::from(list);
        self.param_members(ty).fields = Some(list.clone());
        Ok(list)
    }

    /// Methods of any reference type, substituted for instantiations
    pub fn type_methods(&mut self, ty: TypeId) -> Result<Rc<[MethodId]>, SessionAbort> {
        let (generic, subst) = match self.instantiation_parts(ty)? {
            Some(parts) => parts,
            None => {
                return match self.binding_of_type(ty) {
                    Some(b) => self.methods(b),
                    None => Ok(Rc::from(Vec::new())),
                }
            }
        };
        if let Some(cached) = self.param_member_slot(ty, |m| m.methods.clone()) {
            return Ok(cached);
        }
        let originals = self.methods(generic)?;
        let mut list = Vec::with_capacity(originals.len());
        for original in originals.iter().copied() {
            let source = self.method(original).clone();
            let mut params = Vec::with_capacity(source.declared.params.len());
            for param in source.declared.params.iter() {
                params.push(self.substitute(&subst, *param)?);
            }
            let ret = self.substitute(&subst, source.declared.ret)?;
            let mut exceptions = Vec::with_capacity(source.exceptions.len());
            for thrown in source.exceptions.iter() {
                exceptions.push(self.substitute(&subst, *thrown)?);
            }
            list.push(self.add_method(MethodParts {
                name: source.name,
                modifiers: source.modifiers,
                declaring: source.declaring,
                type_variables: source.type_variables,
                params,
                ret,
                exceptions,
                origin: MethodOrigin::Parameterized { original },
                span: source.span,
            })?);
        }
        let list: Rc<[MethodId]> = Rc::from(list);
        self.param_members(ty).methods = Some(list.clone());
        Ok(list)
    }

    /// Member types of any reference type; non-static members of an
    /// instantiation are instantiated with it as their enclosing type
    pub fn type_member_types(&mut self, ty: TypeId) -> Result<Rc<[TypeId]>, SessionAbort> {
        let Some(owner) = self.binding_of_type(ty) else {
            return Ok(Rc::from(Vec::new()));
        };
        let parameterized = matches!(self.ty(ty), Type::Parameterized { .. });
        if parameterized {
            if let Some(cached) = self.param_member_slot(ty, |m| m.member_types.clone()) {
                return Ok(cached);
            }
        }
        let members = self.member_types(owner)?;
        let mut list = Vec::with_capacity(members.len());
        for member in members.iter().copied() {
            let enclosing = (parameterized && !self.binding(member).modifiers.is_static()).then_some(ty);
            list.push(self.instantiate(member, Vec::new(), enclosing));
        }
        let list: Rc<[TypeId]> = Rc::from(list);
        if parameterized {
            self.param_members(ty).member_types = Some(list.clone());
        }
        Ok(list)
    }

    fn instantiation_parts(
        &mut self,
        ty: TypeId,
    ) -> Result<Option<(BindingId, Substitution)>, SessionAbort> {
        let generic = match self.ty(ty) {
            Type::Parameterized { generic, .. } | Type::Raw { generic, .. } => *generic,
            Type::Anchored { role, .. } => {
                let role = *role;
                return self.instantiation_parts(role);
            }
            _ => return Ok(None),
        };
        Ok(self.substitution_for(ty)?.map(|subst| (generic, subst)))
    }

    /// Base class of a role type, substituted when the role is instantiated
    pub fn base_class_of(&mut self, ty: TypeId) -> Result<Option<TypeId>, SessionAbort> {
        let Some(role) = self.binding_of_type(ty) else {
            return Ok(None);
        };
        let Some(base) = self.base_class(role)? else {
            return Ok(None);
        };
        match self.substitution_for(ty)? {
            Some(subst) => Ok(Some(self.substitute(&subst, base)?)),
            None => Ok(Some(base)),
        }
    }

    // ── Relations ───────────────────────────────────────────────────────

    /// Whether the type argument `arg` contains `other`
    pub fn contains(&mut self, arg: TypeId, other: TypeId) -> Result<bool, SessionAbort> {
        if arg == other {
            return Ok(true);
        }
        let object = self.well_known_type(WellKnown::Object)?;
        match (self.ty(arg).clone(), self.ty(other).clone()) {
            // ? contains everything
            (Type::Wildcard { kind: WildcardKind::Unbounded, .. }, _) => Ok(true),

            // ? extends T contains ? extends S if S <: T
            (
                Type::Wildcard { kind: WildcardKind::Extends, bound: Some(upper) },
                Type::Wildcard { kind: WildcardKind::Extends, bound: Some(bound) },
            ) => self.is_subtype(bound, upper),

            // ? extends T contains ? and ? super S only if T is the root
            (Type::Wildcard { kind: WildcardKind::Extends, bound: Some(upper) }, Type::Wildcard { .. }) => {
                Ok(upper == object)
            }
            (Type::Wildcard { kind: WildcardKind::Extends, bound: Some(upper) }, _) => {
                self.is_subtype(other, upper)
            }

            // ? super T contains ? super S if T <: S
            (
                Type::Wildcard { kind: WildcardKind::Super, bound: Some(lower) },
                Type::Wildcard { kind: WildcardKind::Super, bound: Some(bound) },
            ) => self.is_subtype(lower, bound),
            (Type::Wildcard { kind: WildcardKind::Super, .. }, Type::Wildcard { .. }) => Ok(false),
            (Type::Wildcard { kind: WildcardKind::Super, bound: Some(lower) }, _) => {
                self.is_subtype(lower, other)
            }

            // a concrete argument only contains an equivalent one
            (_, Type::Wildcard { .. }) => Ok(false),
            _ => self.is_equivalent(arg, other),
        }
    }

    /// Whether two types denote the same type
    pub fn is_equivalent(&mut self, a: TypeId, b: TypeId) -> Result<bool, SessionAbort> {
        if a == b {
            return Ok(true);
        }
        match (self.ty(a).clone(), self.ty(b).clone()) {
            (
                Type::Parameterized { generic: g1, args: a1, enclosing: e1 },
                Type::Parameterized { generic: g2, args: a2, enclosing: e2 },
            ) => {
                if g1 != g2 || a1.len() != a2.len() {
                    return Ok(false);
                }
                for (x, y) in a1.iter().zip(a2.iter()) {
                    if !(self.contains(*x, *y)? && self.contains(*y, *x)?) {
                        return Ok(false);
                    }
                }
                match (e1, e2) {
                    (None, None) => Ok(true),
                    (Some(x), Some(y)) => self.is_equivalent(x, y),
                    _ => Ok(false),
                }
            }
            (Type::Raw { generic: g1, .. }, Type::Raw { generic: g2, .. }) => Ok(g1 == g2),
            (Type::Array(x), Type::Array(y)) => self.is_equivalent(x, y),
            (Type::Anchored { role: r1, anchor: p1 }, Type::Anchored { role: r2, anchor: p2 }) => {
                Ok(p1 == p2 && self.is_equivalent(r1, r2)?)
            }
            _ => Ok(false),
        }
    }

    /// Whether `sub` is a subtype of `sup`; a problem type is compatible
    /// with everything so one error is not reported twice
    pub fn is_subtype(&mut self, sub: TypeId, sup: TypeId) -> Result<bool, SessionAbort> {
        // Reflexivity
        if sub == sup || self.is_problem_type(sub) || self.is_problem_type(sup) {
            return Ok(true);
        }
        let object = self.well_known_type(WellKnown::Object)?;
        match (self.ty(sub).clone(), self.ty(sup).clone()) {
            // Primitives only relate to themselves
            (Type::Primitive(_), _) | (_, Type::Primitive(_)) => Ok(false),

            // Every reference type is a subtype of the root
            (_, Type::Declared(b)) if self.binding(b).declared_type == object => Ok(true),

            // null converts to every reference type
            (Type::Null, _) => Ok(true),

            // Arrays are covariant in reference components
            (Type::Array(c1), Type::Array(c2)) => {
                if matches!(self.ty(c1), Type::Primitive(_)) || matches!(self.ty(c2), Type::Primitive(_)) {
                    return Ok(c1 == c2);
                }
                self.is_subtype(c1, c2)
            }

            // Type variables and captures go through their bounds
            (Type::Variable(var), _) => {
                let bounds = self.type_var(var).bounds.clone();
                for bound in bounds {
                    if self.is_subtype(bound, sup)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            (Type::Captured(capture), _) => {
                let upper = self.capture_info(capture).upper;
                self.is_subtype(upper, sup)
            }
            (_, Type::Captured(capture)) => match self.capture_info(capture).lower {
                Some(lower) => self.is_subtype(sub, lower),
                None => Ok(false),
            },

            // An anchored type is only a subtype of a type with the same anchor
            (Type::Anchored { role: r1, anchor: p1 }, Type::Anchored { role: r2, anchor: p2 }) => {
                Ok(p1 == p2 && self.is_subtype(r1, r2)?)
            }
            (_, Type::Anchored { .. }) => Ok(false),
            (Type::Anchored { role, .. }, _) => self.is_subtype(role, sup),

            // Class types: walk the substituted supertypes
            (_, Type::Declared(_) | Type::Parameterized { .. } | Type::Raw { .. }) => {
                self.reaches_type(sub, sup)
            }
            _ => Ok(false),
        }
    }

    fn reaches_type(&mut self, sub: TypeId, sup: TypeId) -> Result<bool, SessionAbort> {
        let Some(target) = self.binding_of_type(sup) else {
            return Ok(false);
        };
        let mut visited = FxHashSet::default();
        let mut stack = vec![sub];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if self.binding_of_type(current) == Some(target) {
                match (self.ty(current).clone(), self.ty(sup).clone()) {
                    (_, Type::Declared(_) | Type::Raw { .. }) => return Ok(true),
                    (Type::Raw { .. }, Type::Parameterized { .. }) => {}
                    (
                        Type::Parameterized { args: found, .. },
                        Type::Parameterized { args: wanted, .. },
                    ) => {
                        let mut all = found.len() == wanted.len();
                        for (w, f) in wanted.iter().zip(found.iter()) {
                            if !all {
                                break;
                            }
                            all = self.contains(*w, *f)?;
                        }
                        if all {
                            return Ok(true);
                        }
                    }
                    // the generic used inside its own declaration
                    (Type::Declared(_), Type::Parameterized { .. }) => {}
                    _ => {}
                }
                continue;
            }
            let supertypes = self.type_supertypes(current)?;
            if let Some(superclass) = supertypes.superclass {
                stack.push(superclass);
            }
            stack.extend(supertypes.interfaces.iter().copied());
        }
        Ok(false)
    }

    /// Whether a value of type `from` may be passed where `to` is expected:
    /// subtyping, primitive widening, or an unchecked conversion between a
    /// raw type and an instantiation of the same generic
    pub fn is_compatible(&mut self, from: TypeId, to: TypeId) -> Result<bool, SessionAbort> {
        if self.is_subtype(from, to)? {
            return Ok(true);
        }
        if let (Type::Primitive(a), Type::Primitive(b)) = (self.ty(from), self.ty(to)) {
            return Ok(widens(*a, *b));
        }
        let raw_involved = matches!(self.ty(from), Type::Raw { .. }) || matches!(self.ty(to), Type::Raw { .. });
        if raw_involved {
            let from = self.erasure(from)?;
            let to = self.erasure(to)?;
            return self.is_subtype(from, to);
        }
        Ok(false)
    }

    /// Capture conversion: every wildcard argument of `ty` is replaced by a
    /// fresh capture variable that remembers where it came from
    pub fn capture(&mut self, ty: TypeId, site: Span) -> Result<TypeId, SessionAbort> {
        let Type::Parameterized {
            generic,
            args,
            enclosing,
        } = self.ty(ty).clone()
        else {
            return Ok(ty);
        };
        if !args.iter().any(|a| matches!(self.ty(*a), Type::Wildcard { .. })) {
            return Ok(ty);
        }
        let vars = self.type_variables(generic)?;
        let object = self.well_known_type(WellKnown::Object)?;
        let mut captured = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().copied().enumerate() {
            let Type::Wildcard { kind, bound } = self.ty(arg).clone() else {
                captured.push(arg);
                continue;
            };
            let declared_bound = vars
                .get(index)
                .and_then(|v| self.type_var(*v).bounds.first().copied())
                .unwrap_or(object);
            let (upper, lower) = match (kind, bound) {
                (WildcardKind::Extends, Some(bound)) => (bound, None),
                (WildcardKind::Super, Some(bound)) => (declared_bound, Some(bound)),
                _ => (declared_bound, None),
            };
            let id = self.push_capture(CaptureInfo {
                wildcard: arg,
                index,
                site,
                upper,
                lower,
            });
            captured.push(self.intern(Type::Captured(id)));
        }
        Ok(self.intern(Type::Parameterized {
            generic,
            args: captured,
            enclosing,
        }))
    }
}

/// Primitive widening conversion
fn widens(from: BaseType, to: BaseType) -> bool {
    use BaseType::*;
    if from == to {
        return true;
    }
    matches!(
        (from, to),
        (Byte, Short | Int | Long | Float | Double)
            | (Short, Int | Long | Float | Double)
            | (Char, Int | Long | Float | Double)
            | (Int, Long | Float | Double)
            | (Long, Float | Double)
            | (Float, Double)
    )
}
