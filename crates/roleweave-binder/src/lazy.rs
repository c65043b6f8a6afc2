//! First-access resolution slots
//!
//! Each lazily resolved component of a binding is a [`Lazy`] slot. A slot
//! moves `Unresolved -> InProgress -> Resolved` exactly once; the resolved
//! value is never replaced. [`ResolutionState`] is derived from the slots,
//! so it cannot disagree with them.

use std::fmt;

/// A component that is resolved on first access
#[derive(Debug, Clone, Default)]
pub enum Lazy<T> {
    /// Not yet requested
    #[default]
    Unresolved,
    /// Resolution is running further up the stack
    InProgress,
    /// Final value
    Resolved(T),
}

impl<T: Clone> Lazy<T> {
    /// Resolved value, if any
    pub fn get(&self) -> Option<T> {
        match self {
            Lazy::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl<T> Lazy<T> {
    /// Whether resolution has not started
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Lazy::Unresolved)
    }

    /// Whether resolution is running
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Lazy::InProgress)
    }

    /// Whether the value is final
    pub fn is_resolved(&self) -> bool {
        matches!(self, Lazy::Resolved(_))
    }

    /// Borrow the resolved value
    pub fn as_resolved(&self) -> Option<&T> {
        match self {
            Lazy::Resolved(value) => Some(value),
            _ => None,
        }
    }
}

/// Bitset of components still waiting for first access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResolutionState(u8);

impl ResolutionState {
    /// Superclass not yet resolved
    pub const SUPERCLASS: ResolutionState = ResolutionState(0x01);
    /// Super-interfaces not yet resolved
    pub const INTERFACES: ResolutionState = ResolutionState(0x02);
    /// Member types not yet resolved
    pub const MEMBER_TYPES: ResolutionState = ResolutionState(0x04);
    /// Type variables not yet resolved
    pub const TYPE_VARIABLES: ResolutionState = ResolutionState(0x08);
    /// Fields not yet resolved
    pub const FIELDS: ResolutionState = ResolutionState(0x10);
    /// Methods not yet resolved
    pub const METHODS: ResolutionState = ResolutionState(0x20);
    /// Base class not yet resolved
    pub const BASE_CLASS: ResolutionState = ResolutionState(0x40);

    /// Everything resolved
    pub const fn empty() -> Self {
        ResolutionState(0)
    }

    /// Raw bits
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set
    pub const fn contains(self, other: ResolutionState) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether nothing is pending
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub(crate) fn set_if(&mut self, bit: ResolutionState, pending: bool) {
        if pending {
            self.0 |= bit.0;
        }
    }
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: &[(ResolutionState, &str)] = &[
            (ResolutionState::SUPERCLASS, "superclass"),
            (ResolutionState::INTERFACES, "interfaces"),
            (ResolutionState::MEMBER_TYPES, "member-types"),
            (ResolutionState::TYPE_VARIABLES, "type-variables"),
            (ResolutionState::FIELDS, "fields"),
            (ResolutionState::METHODS, "methods"),
            (ResolutionState::BASE_CLASS, "base-class"),
        ];
        let pending: Vec<&str> = NAMES
            .iter()
            .filter(|(bit, _)| self.contains(*bit))
            .map(|(_, name)| *name)
            .collect();
        if pending.is_empty() {
            f.write_str("resolved")
        } else {
            f.write_str(&pending.join("|"))
        }
    }
}
