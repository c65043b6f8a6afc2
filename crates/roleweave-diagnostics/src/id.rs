//! Numeric problem identifiers
//!
//! Every problem the binder can report carries a stable numeric id. The
//! upper bits of an id select a category (type, field, method, ...); the
//! team/role extension uses dedicated numeric blocks below the category
//! bits. Ids are append-only: retired ids stay in [`PROBLEMS`] with
//! `deprecated: true` and are never handed out again, because build state
//! persisted elsewhere refers to them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::problem::Severity;

/// Category bit for type-related problems
pub const TYPE_RELATED: u32 = 0x0100_0000;
/// Category bit for field-related problems
pub const FIELD_RELATED: u32 = 0x0200_0000;
/// Category bit for method-related problems
pub const METHOD_RELATED: u32 = 0x0400_0000;
/// Category bit for constructor-related problems
pub const CONSTRUCTOR_RELATED: u32 = 0x0800_0000;
/// Category bit for import-related problems
pub const IMPORT_RELATED: u32 = 0x1000_0000;
/// Category bit for internal problems
pub const INTERNAL: u32 = 0x2000_0000;
/// Category bit for syntax problems
pub const SYNTAX: u32 = 0x4000_0000;

/// Mask that strips the category bits
pub const IGNORE_CATEGORIES_MASK: u32 = 0x00FF_FFFF;

/// Base of the team/role extension blocks
pub const EXTENSION_BASE: u32 = 1_000_000;
/// Size of one extension block
pub const EXTENSION_BLOCK: u32 = 100_000;

/// Team-related problems (role files, role imports, team packages)
pub const TEAM_RELATED: u32 = EXTENSION_BASE + EXTENSION_BLOCK;
/// Role-to-base binding problems (`playedBy`)
pub const ROLE_BASE_BINDING: u32 = EXTENSION_BASE + 2 * EXTENSION_BLOCK;
/// Callout binding problems
pub const CALLOUT_RELATED: u32 = EXTENSION_BASE + 3 * EXTENSION_BLOCK;
/// Callin binding problems
pub const CALLIN_RELATED: u32 = EXTENSION_BASE + 4 * EXTENSION_BLOCK;
/// Encapsulation / decapsulation problems
pub const ENCAPSULATION_RELATED: u32 = EXTENSION_BASE + 5 * EXTENSION_BLOCK;
/// Dependent (anchored) type problems
pub const DEPENDENT_TYPE_RELATED: u32 = EXTENSION_BASE + 6 * EXTENSION_BLOCK;
/// Combinations that are not supported yet
pub const LIMITATIONS: u32 = EXTENSION_BASE + 9 * EXTENSION_BLOCK;

/// Stable numeric identifier of a problem kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemId(pub u32);

/// Coarse classification derived from a [`ProblemId`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Type resolution and hierarchy
    Type,
    /// Field lookup
    Field,
    /// Method lookup and overriding
    Method,
    /// Constructors
    Constructor,
    /// Imports
    Import,
    /// Internal inconsistencies
    Internal,
    /// Malformed input structure
    Syntax,
    /// Teams, role files, role imports
    Team,
    /// Role-to-base binding
    RoleBaseBinding,
    /// Callout bindings
    Callout,
    /// Callin bindings and precedence
    Callin,
    /// Decapsulation
    Encapsulation,
    /// Anchored types
    DependentType,
    /// Unsupported combinations
    Limitation,
    /// Not covered by any block
    Other,
}

impl ProblemId {
    /// Raw numeric value
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Category this id belongs to
    pub fn category(self) -> Category {
        let bits = self.0 & !IGNORE_CATEGORIES_MASK;
        match bits {
            TYPE_RELATED => return Category::Type,
            FIELD_RELATED => return Category::Field,
            METHOD_RELATED => return Category::Method,
            CONSTRUCTOR_RELATED => return Category::Constructor,
            IMPORT_RELATED => return Category::Import,
            INTERNAL => return Category::Internal,
            SYNTAX => return Category::Syntax,
            _ => {}
        }
        let raw = self.0 & IGNORE_CATEGORIES_MASK;
        if raw < EXTENSION_BASE {
            return Category::Other;
        }
        match (raw - EXTENSION_BASE) / EXTENSION_BLOCK {
            1 => Category::Team,
            2 => Category::RoleBaseBinding,
            3 => Category::Callout,
            4 => Category::Callin,
            5 => Category::Encapsulation,
            6 => Category::DependentType,
            9 => Category::Limitation,
            _ => Category::Other,
        }
    }

    /// Static description from the problem table
    pub fn info(self) -> Option<&'static ProblemInfo> {
        PROBLEMS.iter().find(|info| info.id == self)
    }

    /// Symbolic name, or `"Unknown"` for ids outside the table
    pub fn name(self) -> &'static str {
        self.info().map(|info| info.name).unwrap_or("Unknown")
    }

    /// Severity used when no configuration overrides it
    pub fn default_severity(self) -> Severity {
        self.info()
            .map(|info| info.default_severity)
            .unwrap_or(Severity::Error)
    }

    /// Whether this id has been retired
    pub fn is_deprecated(self) -> bool {
        self.info().map(|info| info.deprecated).unwrap_or(false)
    }

    /// Look an id up by its symbolic name
    pub fn from_name(name: &str) -> Option<ProblemId> {
        PROBLEMS
            .iter()
            .find(|info| info.name == name)
            .map(|info| info.id)
    }
}

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the problem table
#[derive(Debug, Clone, Copy)]
pub struct ProblemInfo {
    /// Numeric id
    pub id: ProblemId,
    /// Symbolic name (used in configuration files and rendered output)
    pub name: &'static str,
    /// Default severity
    pub default_severity: Severity,
    /// Retired ids are kept but never reported
    pub deprecated: bool,
}

macro_rules! problems {
    ($( $(#[$doc:meta])* $konst:ident = $value:expr, $severity:ident $(, $deprecated:ident)?; )*) => {
        $(
            $(#[$doc])*
            pub const $konst: ProblemId = ProblemId($value);
        )*

        /// Table of every problem id ever assigned
        pub static PROBLEMS: &[ProblemInfo] = &[
            $(
                ProblemInfo {
                    id: $konst,
                    name: stringify!($konst),
                    default_severity: Severity::$severity,
                    deprecated: problems!(@deprecated $($deprecated)?),
                },
            )*
        ];
    };
    (@deprecated) => { false };
    (@deprecated deprecated) => { true };
}

problems! {
    // ── Types ───────────────────────────────────────────────────────────
    /// A referenced type cannot be found
    UNDEFINED_TYPE = TYPE_RELATED + 2, Error;
    /// A type exists but is not visible from the referencing scope
    NOT_VISIBLE_TYPE = TYPE_RELATED + 3, Error;
    /// A simple name matches several on-demand imports
    AMBIGUOUS_TYPE = TYPE_RELATED + 4, Error;
    /// A type is its own supertype
    HIERARCHY_CIRCULARITY = TYPE_RELATED + 5, Error;
    /// A supertype could not be resolved
    HIERARCHY_HAS_PROBLEMS = TYPE_RELATED + 6, Error;
    /// `extends` names an interface
    SUPERCLASS_MUST_BE_CLASS = TYPE_RELATED + 7, Error;
    /// `implements` names a class
    SUPER_INTERFACE_MUST_BE_INTERFACE = TYPE_RELATED + 8, Error;
    /// Two types with the same name in one scope
    DUPLICATE_TYPES = TYPE_RELATED + 9, Error;
    /// A public type is declared in a unit with a different name
    PUBLIC_CLASS_MUST_MATCH_FILE_NAME = TYPE_RELATED + 10, Error;
    /// A type has the same qualified name as a package
    TYPE_COLLIDES_WITH_PACKAGE = TYPE_RELATED + 11, Error;
    /// Wrong number of type arguments
    INCORRECT_ARITY_FOR_PARAMETERIZED_TYPE = TYPE_RELATED + 12, Error;
    /// A type argument violates its variable's bound
    TYPE_ARGUMENT_MISMATCH = TYPE_RELATED + 13, Error;
    /// A class extends a final class
    CLASS_EXTENDS_FINAL_CLASS = TYPE_RELATED + 14, Error;
    /// Retired: merged into HIERARCHY_HAS_PROBLEMS
    SUPERTYPE_NOT_RESOLVED = TYPE_RELATED + 15, Error, deprecated;
    /// Type arguments applied to a non-generic type
    NON_GENERIC_TYPE = TYPE_RELATED + 16, Error;

    // ── Fields ──────────────────────────────────────────────────────────
    /// A referenced field cannot be found
    UNDEFINED_FIELD = FIELD_RELATED + 1, Error;
    /// Two fields with the same name
    DUPLICATE_FIELD = FIELD_RELATED + 2, Error;

    // ── Methods ─────────────────────────────────────────────────────────
    /// A referenced method cannot be found
    UNDEFINED_METHOD = METHOD_RELATED + 1, Error;
    /// A method reference matches several candidates
    AMBIGUOUS_METHOD = METHOD_RELATED + 2, Error;
    /// Two methods with the same signature
    DUPLICATE_METHOD = METHOD_RELATED + 3, Error;
    /// An override changes the return type incompatibly
    INCOMPATIBLE_RETURN_TYPE = METHOD_RELATED + 4, Error;
    /// An override reduces visibility
    METHOD_REDUCES_VISIBILITY = METHOD_RELATED + 5, Error;

    // ── Imports ─────────────────────────────────────────────────────────
    /// An import names nothing
    IMPORT_NOT_FOUND = IMPORT_RELATED + 1, Error;
    /// Two single-type imports bind one simple name to different types
    CONFLICTING_IMPORT = IMPORT_RELATED + 2, Error;
    /// A single-type import names a package
    CANNOT_IMPORT_PACKAGE = IMPORT_RELATED + 3, Error;
    /// The same import appears twice
    DUPLICATE_IMPORT = IMPORT_RELATED + 4, Warning;
    /// An imported type is not visible
    IMPORT_NOT_VISIBLE = IMPORT_RELATED + 5, Error;
    /// An import collides with a type declared in the unit
    IMPORT_CONFLICTS_WITH_TYPE = IMPORT_RELATED + 6, Error;

    // ── Internal / syntax ───────────────────────────────────────────────
    /// The environment detected an inconsistency it recovered from
    INTERNAL_INCONSISTENCY = INTERNAL + 1, Error;
    /// A binary descriptor could not be decoded
    CORRUPT_DESCRIPTOR = INTERNAL + 2, Error;
    /// A type reference in the declaration tree is malformed
    MALFORMED_TYPE_REFERENCE = SYNTAX + 1, Error;
    /// A binary signature string is malformed
    MALFORMED_SIGNATURE = SYNTAX + 2, Error;

    // ── Teams ───────────────────────────────────────────────────────────
    /// A role file does not declare a role named like the file
    ROLE_FILE_MUST_DECLARE_ROLE = TEAM_RELATED + 1, Error;
    /// Roles cannot be imported
    IMPORT_OF_ROLE_TYPE = TEAM_RELATED + 2, Error;
    /// `base` imports are only allowed in team units
    BASE_IMPORT_IN_REGULAR_CLASS = TEAM_RELATED + 3, Error;
    /// A role file names a team that does not exist
    ROLE_FILE_TEAM_NOT_FOUND = TEAM_RELATED + 4, Error;
    /// A role overrides a tsuper role method with an incompatible return type
    TSUPER_RETURN_MISMATCH = TEAM_RELATED + 5, Error;

    // ── Role/base binding ───────────────────────────────────────────────
    /// A role is bound to a type that leads back to the role itself
    BASECLASS_CIRCULARITY = ROLE_BASE_BINDING + 1, Error;
    /// `playedBy` on a type that is not a role
    PLAYED_BY_IN_NON_ROLE = ROLE_BASE_BINDING + 2, Error;
    /// A sub-role's base class does not refine the super-role's base class
    INCOMPATIBLE_BASECLASS_REFINEMENT = ROLE_BASE_BINDING + 3, Error;
    /// A method mapping in a role without `playedBy`
    MAPPING_IN_UNBOUND_ROLE = ROLE_BASE_BINDING + 4, Error;
    /// A role is bound to a role of its own team
    BASECLASS_IS_ENCLOSING_ROLE = ROLE_BASE_BINDING + 5, Error;

    // ── Callout ─────────────────────────────────────────────────────────
    /// The base method of a callout cannot be found
    UNRESOLVED_CALLOUT_METHOD = CALLOUT_RELATED + 1, Error;
    /// The base method of a callout is ambiguous
    AMBIGUOUS_CALLOUT_METHOD = CALLOUT_RELATED + 2, Error;
    /// Callout arguments do not fit the base parameters
    CALLOUT_PARAMETER_MISMATCH = CALLOUT_RELATED + 3, Error;
    /// The base result does not fit the role result
    CALLOUT_RETURN_MISMATCH = CALLOUT_RELATED + 4, Error;
    /// The base field of a callout-to-field cannot be found
    UNRESOLVED_CALLOUT_FIELD = CALLOUT_RELATED + 5, Error;
    /// Field and accessor types do not match
    CALLOUT_TO_FIELD_TYPE_MISMATCH = CALLOUT_RELATED + 6, Error;
    /// A setter callout targets a final field
    CALLOUT_SETTER_TO_FINAL_FIELD = CALLOUT_RELATED + 7, Error;
    /// A callout binds a role method that is not abstract and not overriding
    CALLOUT_OVERRIDES_WITHOUT_FLAG = CALLOUT_RELATED + 8, Error;
    /// A short callout's signature depends on the callout being resolved
    CALLOUT_SIGNATURE_CYCLE = CALLOUT_RELATED + 9, Error;

    // ── Callin ──────────────────────────────────────────────────────────
    /// The role method of a callin cannot be found
    UNRESOLVED_CALLIN_ROLE_METHOD = CALLIN_RELATED + 1, Error;
    /// The base method of a callin cannot be found
    UNRESOLVED_CALLIN_BASE_METHOD = CALLIN_RELATED + 2, Error;
    /// The base method of a callin is ambiguous
    AMBIGUOUS_CALLIN_BASE_METHOD = CALLIN_RELATED + 3, Error;
    /// Base arguments do not fit the role parameters
    CALLIN_PARAMETER_MISMATCH = CALLIN_RELATED + 4, Error;
    /// Role result does not fit the base result of a replace binding
    CALLIN_RETURN_MISMATCH = CALLIN_RELATED + 5, Error;
    /// A replace binding names a method without the `callin` modifier
    REPLACE_NEEDS_CALLIN_METHOD = CALLIN_RELATED + 6, Error;
    /// A before/after binding names a `callin` method
    CALLIN_METHOD_BOUND_NON_REPLACE = CALLIN_RELATED + 7, Error;
    /// No path through a callin method calls base
    DEFINITELY_MISSING_BASE_CALL = CALLIN_RELATED + 8, Warning;
    /// Some path through a callin method does not call base
    POTENTIALLY_MISSING_BASE_CALL = CALLIN_RELATED + 9, Warning;
    /// Every path through a callin method calls base more than once
    DEFINITELY_DUPLICATE_BASE_CALL = CALLIN_RELATED + 10, Error;
    /// Some path through a callin method may call base more than once
    POTENTIALLY_DUPLICATE_BASE_CALL = CALLIN_RELATED + 11, Warning;
    /// Two precedence declarations order the same pair differently
    INCOMPATIBLE_PRECEDENCE = CALLIN_RELATED + 12, Error;
    /// Several callins on one join point and no order can be derived
    PRECEDENCE_REQUIRED = CALLIN_RELATED + 13, Error;
    /// A precedence entry names no callin binding or role
    UNKNOWN_PRECEDENCE_ELEMENT = CALLIN_RELATED + 14, Error;
    /// A callin method overrides a regular method or vice versa
    CALLIN_OVERRIDES_REGULAR = CALLIN_RELATED + 15, Error;
    /// Two callin bindings in one team share a label
    DUPLICATE_CALLIN_LABEL = CALLIN_RELATED + 16, Error;

    // ── Encapsulation ───────────────────────────────────────────────────
    /// A base import decapsulates an otherwise invisible type
    DECAPSULATION = ENCAPSULATION_RELATED + 1, Info;
    /// A base import is never used by a `playedBy`
    UNUSED_BASE_IMPORT = ENCAPSULATION_RELATED + 2, Warning;
    /// A callout reaches an otherwise invisible base member
    CALLOUT_DECAPSULATION = ENCAPSULATION_RELATED + 3, Info;

    // ── Dependent types ─────────────────────────────────────────────────
    /// Resolving an anchor leads back to itself
    ANCHOR_CYCLE = DEPENDENT_TYPE_RELATED + 1, Error;
    /// An anchor field is not final
    ANCHOR_NOT_FINAL = DEPENDENT_TYPE_RELATED + 2, Error;
    /// An anchor field is not of a team type
    ANCHOR_NOT_A_TEAM = DEPENDENT_TYPE_RELATED + 3, Error;
    /// The anchored role is not a role of the anchor's team
    ROLE_NOT_IN_ANCHOR_TEAM = DEPENDENT_TYPE_RELATED + 4, Error;
    /// The anchor field cannot be found
    UNRESOLVED_ANCHOR = DEPENDENT_TYPE_RELATED + 5, Error;

    // ── Limitations ─────────────────────────────────────────────────────
    /// The team/role attribute block has an unknown version
    UNSUPPORTED_EXTENSION_VERSION = LIMITATIONS + 1, Warning;
    /// The team/role attribute block is malformed
    CORRUPT_EXTENSION_ATTRIBUTE = LIMITATIONS + 2, Warning;
    /// Parameter mappings on a callout-to-field are not supported
    PARAMETER_MAPPING_ON_FIELD_ACCESS = LIMITATIONS + 3, Error;
}
