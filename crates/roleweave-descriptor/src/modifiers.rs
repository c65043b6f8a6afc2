//! Modifier bits shared by descriptors and bindings

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// A set of modifier flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modifiers(pub u32);

impl Modifiers {
    /// No modifiers
    pub const NONE: Modifiers = Modifiers(0);
    /// `public`
    pub const PUBLIC: Modifiers = Modifiers(0x0001);
    /// `private`
    pub const PRIVATE: Modifiers = Modifiers(0x0002);
    /// `protected`
    pub const PROTECTED: Modifiers = Modifiers(0x0004);
    /// `static`
    pub const STATIC: Modifiers = Modifiers(0x0008);
    /// `final`
    pub const FINAL: Modifiers = Modifiers(0x0010);
    /// Interface type
    pub const INTERFACE: Modifiers = Modifiers(0x0200);
    /// `abstract`
    pub const ABSTRACT: Modifiers = Modifiers(0x0400);
    /// Generated by the compiler
    pub const SYNTHETIC: Modifiers = Modifiers(0x1000);
    /// Enum type
    pub const ENUM: Modifiers = Modifiers(0x4000);
    /// Team type
    pub const TEAM: Modifiers = Modifiers(0x0001_0000);
    /// Role type (set by resolution, never declared)
    pub const ROLE: Modifiers = Modifiers(0x0002_0000);
    /// Callin method
    pub const CALLIN: Modifiers = Modifiers(0x0004_0000);
    /// Deprecated element
    pub const DEPRECATED: Modifiers = Modifiers(0x0008_0000);

    /// Visibility bits
    pub const VISIBILITY: Modifiers = Modifiers(0x0007);

    /// Raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set
    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any bit of `other` is set
    pub const fn intersects(self, other: Modifiers) -> bool {
        self.0 & other.0 != 0
    }

    /// Set the bits of `other`
    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }

    /// Clear the bits of `other`
    pub fn remove(&mut self, other: Modifiers) {
        self.0 &= !other.0;
    }

    /// Copy with the bits of `other` set
    pub const fn with(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    /// Copy with the bits of `other` cleared
    pub const fn without(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 & !other.0)
    }

    /// Shorthand predicates
    pub const fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    /// `private`
    pub const fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    /// `static`
    pub const fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    /// `final`
    pub const fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    /// Interface type
    pub const fn is_interface(self) -> bool {
        self.contains(Self::INTERFACE)
    }

    /// Team type
    pub const fn is_team(self) -> bool {
        self.contains(Self::TEAM)
    }

    /// Role type
    pub const fn is_role(self) -> bool {
        self.contains(Self::ROLE)
    }

    /// Callin method
    pub const fn is_callin(self) -> bool {
        self.contains(Self::CALLIN)
    }

    /// Compiler-generated
    pub const fn is_synthetic(self) -> bool {
        self.contains(Self::SYNTHETIC)
    }

    /// Build from source keywords
    pub fn from_keywords(keywords: &[Modifier]) -> Modifiers {
        keywords
            .iter()
            .fold(Modifiers::NONE, |acc, keyword| acc | keyword.bits())
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Modifiers) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Modifiers {
    type Output = Modifiers;

    fn bitand(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 & rhs.0)
    }
}

const NAMES: &[(Modifiers, &str)] = &[
    (Modifiers::PUBLIC, "public"),
    (Modifiers::PRIVATE, "private"),
    (Modifiers::PROTECTED, "protected"),
    (Modifiers::STATIC, "static"),
    (Modifiers::FINAL, "final"),
    (Modifiers::ABSTRACT, "abstract"),
    (Modifiers::INTERFACE, "interface"),
    (Modifiers::ENUM, "enum"),
    (Modifiers::TEAM, "team"),
    (Modifiers::ROLE, "role"),
    (Modifiers::CALLIN, "callin"),
    (Modifiers::SYNTHETIC, "synthetic"),
    (Modifiers::DEPRECATED, "deprecated"),
];

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (bit, name) in NAMES {
            if self.contains(*bit) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A modifier keyword as written in source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    /// `public`
    Public,
    /// `private`
    Private,
    /// `protected`
    Protected,
    /// `static`
    Static,
    /// `final`
    Final,
    /// `abstract`
    Abstract,
    /// `team`
    Team,
    /// `callin`
    Callin,
    /// `deprecated`
    Deprecated,
}

impl Modifier {
    /// Bit for this keyword
    pub const fn bits(self) -> Modifiers {
        match self {
            Modifier::Public => Modifiers::PUBLIC,
            Modifier::Private => Modifiers::PRIVATE,
            Modifier::Protected => Modifiers::PROTECTED,
            Modifier::Static => Modifiers::STATIC,
            Modifier::Final => Modifiers::FINAL,
            Modifier::Abstract => Modifiers::ABSTRACT,
            Modifier::Team => Modifiers::TEAM,
            Modifier::Callin => Modifiers::CALLIN,
            Modifier::Deprecated => Modifiers::DEPRECATED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut m = Modifiers::PUBLIC;
        m.insert(Modifiers::STATIC);
        assert!(m.is_static());
        m.remove(Modifiers::STATIC);
        assert!(!m.is_static());
        assert!(m.is_public());
    }

    #[test]
    fn test_from_keywords() {
        let m = Modifiers::from_keywords(&[Modifier::Public, Modifier::Team]);
        assert!(m.is_team());
        assert!(m.is_public());
        assert!(!m.is_role());
    }

    #[test]
    fn test_display() {
        let m = Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::CALLIN;
        assert_eq!(m.to_string(), "public static callin");
    }
}
