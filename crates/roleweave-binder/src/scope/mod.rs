//! Compilation unit scopes
//!
//! A [`UnitScope`] owns what one compilation unit contributes to the
//! session: its declared types, its imports (resolved once, on first
//! request) and the reference index that name lookup fills in. Role files
//! are units whose package is the qualified name of a team; the roles they
//! declare become members of that team.

mod build;
mod imports;
mod lookup;

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::decl::{CompilationUnitDecl, ImportDecl};
use crate::ids::{BindingId, UnitId};
use crate::lazy::Lazy;
use crate::references::ReferenceIndex;

pub(crate) use lookup::{BoundCheck, Lookup, LookupSite};

/// Target of an on-demand import
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDemandTarget<'a> {
    /// `import p.*`
    Package(&'a str),
    /// `import p.T.*`
    Type(BindingId),
}

/// An on-demand import that resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OnDemand {
    Package(String),
    Type(BindingId),
}

impl OnDemand {
    fn target(&self) -> OnDemandTarget<'_> {
        match self {
            OnDemand::Package(name) => OnDemandTarget::Package(name),
            OnDemand::Type(id) => OnDemandTarget::Type(*id),
        }
    }
}

/// A `base` import that resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseImport {
    /// Imported type
    pub binding: BindingId,
    /// The declaration
    pub decl: ImportDecl,
}

/// Imports of a unit after resolution
#[derive(Debug, Clone, Default)]
pub struct ResolvedImports {
    pub(crate) single: FxHashMap<String, BindingId>,
    pub(crate) on_demand: Vec<OnDemand>,
    pub(crate) base: Vec<BaseImport>,
}

impl ResolvedImports {
    /// Type a single-type import binds `simple` to
    pub fn single(&self, simple: &str) -> Option<BindingId> {
        self.single.get(simple).copied()
    }

    /// Number of single-type imports
    pub fn single_count(&self) -> usize {
        self.single.len()
    }

    /// On-demand imports in declaration order
    pub fn on_demand(&self) -> impl Iterator<Item = OnDemandTarget<'_>> {
        self.on_demand.iter().map(OnDemand::target)
    }

    /// Base imports in declaration order
    pub fn base(&self) -> &[BaseImport] {
        &self.base
    }

    pub(crate) fn base_named(&self, simple: &str) -> Option<BindingId> {
        self.base
            .iter()
            .find(|import| crate::names::simple_name(&import.decl.name) == simple)
            .map(|import| import.binding)
    }
}

/// Scope of one compilation unit
#[derive(Debug, Clone)]
pub struct UnitScope {
    pub(crate) id: UnitId,
    pub(crate) decl: Rc<CompilationUnitDecl>,
    pub(crate) types: Vec<BindingId>,
    pub(crate) imports: Lazy<Rc<ResolvedImports>>,
    pub(crate) base_imports_verified: bool,
    pub(crate) references: ReferenceIndex,
    pub(crate) has_team: bool,
}

impl UnitScope {
    /// Handle of this unit
    pub fn id(&self) -> UnitId {
        self.id
    }

    /// File name
    pub fn file_name(&self) -> &str {
        &self.decl.file_name
    }

    /// Declaration tree
    pub fn decl(&self) -> &CompilationUnitDecl {
        &self.decl
    }

    /// Declared package
    pub fn package(&self) -> &str {
        &self.decl.package
    }

    /// Top-level types in declaration order; for role files, the roles
    pub fn types(&self) -> &[BindingId] {
        &self.types
    }

    /// Names this unit's lookups depended on
    pub fn references(&self) -> &ReferenceIndex {
        &self.references
    }

    /// Whether this unit is a role file
    pub fn is_role_file(&self) -> bool {
        self.decl.team_package.is_some()
    }

    /// Resolved imports, if resolution already ran
    pub fn imports(&self) -> Option<&Rc<ResolvedImports>> {
        self.imports.as_resolved()
    }

    /// Whether the unit declares or belongs to a team
    pub fn has_team(&self) -> bool {
        self.has_team
    }
}
