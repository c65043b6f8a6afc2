//! Callin and callout bindings
//!
//! The method mappings of a role are resolved together, the first time any
//! of them is asked for. Source roles resolve their declarations against
//! the role and its bound base class; roles read from descriptors rebuild
//! theirs from the compiled attribute records without reporting. Every
//! resolved mapping lives in the environment's mapping arena.

pub mod flow;
pub mod precedence;
mod resolve;
mod surrogate;

use std::rc::Rc;

use roleweave_descriptor::{parse_method, CallinKind, CalloutKind, TypeDescriptor};
use roleweave_diagnostics::Span;
use tracing::{debug, warn};

use crate::binding::BindingOrigin;
use crate::decl::ParamMapping;
use crate::environment::LookupEnvironment;
use crate::error::{Component, SessionAbort};
use crate::ids::{BindingId, FieldId, MappingId, MethodId};
use crate::lazy::Lazy;

/// Kind of a method mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingKind {
    /// Role method intercepting base methods
    Callin(CallinKind),
    /// Role method forwarding to a base method or field
    Callout(CalloutKind),
}

impl MappingKind {
    /// Callin kind, if this is a callin
    pub fn callin(self) -> Option<CallinKind> {
        match self {
            MappingKind::Callin(kind) => Some(kind),
            MappingKind::Callout(_) => None,
        }
    }
}

/// A resolved callin or callout binding
#[derive(Debug, Clone)]
pub struct MethodMapping {
    pub(crate) id: MappingId,
    pub(crate) role: BindingId,
    pub(crate) kind: MappingKind,
    pub(crate) label: Option<String>,
    pub(crate) role_method: Option<MethodId>,
    pub(crate) base_methods: Vec<MethodId>,
    pub(crate) base_field: Option<FieldId>,
    pub(crate) param_map: Vec<ParamMapping>,
    pub(crate) surrogate: Option<MethodId>,
    pub(crate) is_override: bool,
    pub(crate) decl_index: usize,
    pub(crate) span: Span,
}

impl MethodMapping {
    pub(crate) fn new(role: BindingId, kind: MappingKind, decl_index: usize, span: Span) -> Self {
        MethodMapping {
            id: MappingId::from_index(0),
            role,
            kind,
            label: None,
            role_method: None,
            base_methods: Vec::new(),
            base_field: None,
            param_map: Vec::new(),
            surrogate: None,
            is_override: false,
            decl_index,
            span,
        }
    }

    /// Handle of this mapping
    pub fn id(&self) -> MappingId {
        self.id
    }

    /// Declaring role
    pub fn role(&self) -> BindingId {
        self.role
    }

    /// Mapping kind
    pub fn kind(&self) -> MappingKind {
        self.kind
    }

    /// Label referenced by precedence declarations
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Role method, absent when it could not be resolved
    pub fn role_method(&self) -> Option<MethodId> {
        self.role_method
    }

    /// Bound base methods
    pub fn base_methods(&self) -> &[MethodId] {
        &self.base_methods
    }

    /// Base field of a callout-to-field
    pub fn base_field(&self) -> Option<FieldId> {
        self.base_field
    }

    /// Explicit parameter mappings
    pub fn param_map(&self) -> &[ParamMapping] {
        &self.param_map
    }

    /// Base-call surrogate of a replace callin
    pub fn surrogate(&self) -> Option<MethodId> {
        self.surrogate
    }

    /// Whether a callout was declared to override an inherited role method
    pub fn is_override(&self) -> bool {
        self.is_override
    }

    /// Position among the role's declarations of the same kind family
    pub fn decl_index(&self) -> usize {
        self.decl_index
    }

    /// Source range
    pub fn span(&self) -> Span {
        self.span
    }

    /// Whether every part of the binding resolved
    pub fn is_complete(&self) -> bool {
        self.role_method.is_some() && (!self.base_methods.is_empty() || self.base_field.is_some())
    }
}

impl LookupEnvironment {
    /// Get a mapping by id
    pub fn mapping(&self, id: MappingId) -> &MethodMapping {
        &self.mappings[id.index()]
    }

    pub(crate) fn push_mapping(&mut self, mut mapping: MethodMapping) -> MappingId {
        let id = MappingId::from_index(self.mappings.len());
        mapping.id = id;
        self.mappings.push(mapping);
        id
    }

    /// Callin and callout bindings declared by `role`, in declaration order
    /// (callins first)
    pub fn mappings(&mut self, role: BindingId) -> Result<Rc<[MappingId]>, SessionAbort> {
        match self.role_mappings.get(&role) {
            Some(Lazy::Resolved(list)) => return Ok(list.clone()),
            Some(Lazy::InProgress) => return Err(self.reentrant(role, Component::Mappings)),
            _ => {}
        }
        if !self.binding(role).is_role() {
            return Ok(Rc::from(Vec::new()));
        }
        self.role_mappings.insert(role, Lazy::InProgress);
        debug!(binding = %self.binding(role).name, "resolving method mappings");
        let list = match self.binding(role).origin.clone() {
            BindingOrigin::Source { decl, unit } => self.source_mappings(role, &decl, unit)?,
            BindingOrigin::Binary(desc) => self.binary_mappings(role, &desc)?,
            BindingOrigin::Problem(_) => Vec::new(),
        };
        let list: Rc<[MappingId]> = Rc::from(list);
        self.role_mappings.insert(role, Lazy::Resolved(list.clone()));
        Ok(list)
    }

    /// Callin bindings of `role`
    pub fn callins(&mut self, role: BindingId) -> Result<Vec<MappingId>, SessionAbort> {
        let all = self.mappings(role)?;
        Ok(all
            .iter()
            .copied()
            .filter(|m| matches!(self.mapping(*m).kind, MappingKind::Callin(_)))
            .collect())
    }

    fn binary_mappings(
        &mut self,
        role: BindingId,
        desc: &TypeDescriptor,
    ) -> Result<Vec<MappingId>, SessionAbort> {
        let Some(attrs) = desc.extension.attributes().cloned() else {
            return Ok(Vec::new());
        };
        let base = self.base_class(role)?.and_then(|b| self.binding_of_type(b));
        let mut list = Vec::with_capacity(attrs.callins.len() + attrs.callouts.len());

        for (index, record) in attrs.callins.iter().enumerate() {
            let mut mapping = MethodMapping::new(role, MappingKind::Callin(record.kind), index, Span::none());
            mapping.label = Some(record.label.clone());
            mapping.role_method =
                self.binary_member(role, &record.role_method, &record.role_signature)?;
            if let Some(base) = base {
                for base_ref in &record.base_methods {
                    if let Some(m) = self.binary_member(base, &base_ref.name, &base_ref.signature)? {
                        mapping.base_methods.push(m);
                    }
                }
            }
            if record.kind == CallinKind::Replace {
                mapping.surrogate = mapping
                    .role_method
                    .and_then(|m| self.method(m).base_call_surrogate);
            }
            if !mapping.is_complete() {
                warn!(
                    role = %self.binding(role).name,
                    label = %record.label,
                    "compiled callin does not match the current types"
                );
            }
            list.push(self.push_mapping(mapping));
        }

        for (index, record) in attrs.callouts.iter().enumerate() {
            let mut mapping = MethodMapping::new(role, MappingKind::Callout(record.kind), index, Span::none());
            mapping.role_method =
                self.binary_member(role, &record.role_method, &record.role_signature)?;
            if let Some(base) = base {
                match record.kind {
                    CalloutKind::Method => {
                        mapping.base_methods.extend(self.binary_member(
                            base,
                            &record.base_member,
                            &record.base_signature,
                        )?);
                    }
                    CalloutKind::Get | CalloutKind::Set => {
                        mapping.base_field = self.find_field(base, &record.base_member)?;
                    }
                }
            }
            list.push(self.push_mapping(mapping));
        }
        Ok(list)
    }

    /// Method of `owner` named `name` whose parameter count matches a
    /// compiled signature
    fn binary_member(
        &mut self,
        owner: BindingId,
        name: &str,
        signature: &str,
    ) -> Result<Option<MethodId>, SessionAbort> {
        let candidates = self.find_methods(owner, name)?;
        let arity = parse_method(signature).ok().map(|sig| sig.params.len());
        Ok(candidates.iter().copied().find(|m| match arity {
            Some(arity) => self.method(*m).declared.params.len() == arity,
            None => true,
        }))
    }
}
