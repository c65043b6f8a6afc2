//! Interned types
//!
//! Every type the binder talks about is interned in a [`TypeTable`], so
//! structurally identical types share one [`TypeId`] and equality is an
//! integer comparison. Generic instantiations are `Parameterized` and `Raw`
//! entries over the generic binding; capture variables are unique per
//! capture site, so two captures of the same wildcard never compare equal.

use roleweave_descriptor::BaseType;
use roleweave_diagnostics::Span;
use rustc_hash::FxHashMap;

use crate::ids::{BindingId, CaptureId, FieldId, TypeId, TypeVarId};

/// Kind of a wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WildcardKind {
    /// `?`
    Unbounded,
    /// `? extends T`
    Extends,
    /// `? super T`
    Super,
}

/// A type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Primitive or `void`
    Primitive(BaseType),
    /// Type of `null`
    Null,
    /// A declared type used without arguments; also the erasure of its
    /// instantiations
    Declared(BindingId),
    /// A generic type applied to arguments
    Parameterized {
        /// Generic binding
        generic: BindingId,
        /// Arguments, possibly wildcards
        args: Vec<TypeId>,
        /// Parameterized enclosing type of a non-static member
        enclosing: Option<TypeId>,
    },
    /// A generic type used without arguments
    Raw {
        /// Generic binding
        generic: BindingId,
        /// Enclosing type of a non-static member
        enclosing: Option<TypeId>,
    },
    /// Type variable
    Variable(TypeVarId),
    /// Wildcard type argument
    Wildcard {
        /// Wildcard kind
        kind: WildcardKind,
        /// Bound, absent for `?`
        bound: Option<TypeId>,
    },
    /// Capture of a wildcard at one use site
    Captured(CaptureId),
    /// Array
    Array(TypeId),
    /// Role type anchored to a final field path
    Anchored {
        /// Role type
        role: TypeId,
        /// Field path, outermost first
        anchor: Vec<FieldId>,
    },
}

impl Type {
    /// Whether values of this type are references
    pub fn is_reference(&self) -> bool {
        !matches!(self, Type::Primitive(_))
    }
}

/// Why a problem binding stands in for a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemReason {
    /// No type with this name
    NotFound,
    /// The type exists but is not accessible
    NotVisible,
    /// Several on-demand imports provide the name
    Ambiguous,
    /// Replaced to break a hierarchy cycle
    HierarchyCycle,
    /// Anchor resolution failed
    InvalidAnchor,
    /// A descriptor could not be read
    Corrupt,
}

/// Capture variable created by capture conversion
#[derive(Debug, Clone)]
pub struct CaptureInfo {
    /// Wildcard this variable captures
    pub wildcard: TypeId,
    /// Position of the wildcard in the argument list
    pub index: usize,
    /// Use site the capture was made for
    pub site: Span,
    /// Upper bound
    pub upper: TypeId,
    /// Lower bound (`? super`)
    pub lower: Option<TypeId>,
}

/// Storage and interning of types
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: Vec<Type>,
    type_to_id: FxHashMap<Type, TypeId>,
}

impl TypeTable {
    /// Create a table with primitives and `null` pre-interned
    pub fn new() -> Self {
        let mut table = TypeTable::default();
        for base in PRIMITIVES {
            table.intern(Type::Primitive(*base));
        }
        table.intern(Type::Null);
        table
    }

    /// Intern a type, returning its id
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.type_to_id.get(&ty) {
            return id;
        }
        let id = TypeId::from_index(self.types.len());
        self.types.push(ty.clone());
        self.type_to_id.insert(ty, id);
        id
    }

    /// Look a type up without interning it
    pub fn lookup(&self, ty: &Type) -> Option<TypeId> {
        self.type_to_id.get(ty).copied()
    }

    /// Get a type by id
    pub fn get(&self, id: TypeId) -> &Type {
        // Ids only come from `intern`, so the index is always in range
        &self.types[id.index()]
    }

    /// Number of interned types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Id of a primitive
    pub fn primitive(&self, base: BaseType) -> TypeId {
        let index = PRIMITIVES.iter().position(|b| *b == base).unwrap_or(0);
        TypeId::from_index(index)
    }

    /// Id of the `null` type
    pub fn null(&self) -> TypeId {
        TypeId::from_index(PRIMITIVES.len())
    }
}

const PRIMITIVES: &[BaseType] = &[
    BaseType::Void,
    BaseType::Boolean,
    BaseType::Byte,
    BaseType::Char,
    BaseType::Short,
    BaseType::Int,
    BaseType::Long,
    BaseType::Float,
    BaseType::Double,
];
