//! Sources of binary type descriptors
//!
//! The environment asks its [`TypeProvider`] for a descriptor the first time
//! a qualified name is requested and never asks again for the same name.

use roleweave_descriptor::{
    DescriptorError, ExtensionBlock, MethodDescriptor, Modifiers, TeamRoleAttributes,
    TypeDescriptor, EXT_CONFINED, EXT_ROLE, EXT_TEAM,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::WellKnownNames;
use crate::names;

/// Looks up compiled types by qualified name
pub trait TypeProvider {
    /// Descriptor of the type `name` (`p.q.Outer$Inner`), `Ok(None)` if
    /// there is no such type
    fn find_type(&self, name: &str) -> Result<Option<TypeDescriptor>, DescriptorError>;

    /// Whether a package of this name contains compiled types
    fn package_exists(&self, package: &str) -> bool;
}

/// Provider backed by a map, used for tests and as the CLI's builtin layer
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    types: FxHashMap<String, TypeDescriptor>,
    packages: FxHashSet<String>,
}

impl InMemoryProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider holding the core types named in `well_known`
    pub fn with_core(well_known: &WellKnownNames) -> Self {
        let mut provider = Self::new();
        for descriptor in core_types(well_known) {
            provider.insert(descriptor);
        }
        provider
    }

    /// Add or replace a descriptor
    pub fn insert(&mut self, descriptor: TypeDescriptor) {
        let mut package = names::package_of(&descriptor.name);
        while !package.is_empty() {
            self.packages.insert(package.to_string());
            package = match package.rfind('.') {
                Some(i) => &package[..i],
                None => "",
            };
        }
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    /// Decode and add an encoded descriptor
    pub fn insert_bytes(&mut self, data: &[u8]) -> Result<(), DescriptorError> {
        let descriptor = TypeDescriptor::decode(data)?;
        self.insert(descriptor);
        Ok(())
    }

    /// Number of descriptors
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the provider holds no descriptors
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeProvider for InMemoryProvider {
    fn find_type(&self, name: &str) -> Result<Option<TypeDescriptor>, DescriptorError> {
        Ok(self.types.get(name).cloned())
    }

    fn package_exists(&self, package: &str) -> bool {
        self.packages.contains(package)
    }
}

/// A provider consulting `first`, then `second`
pub struct LayeredProvider<A, B> {
    first: A,
    second: B,
}

impl<A: TypeProvider, B: TypeProvider> LayeredProvider<A, B> {
    /// Layer two providers
    pub fn new(first: A, second: B) -> Self {
        LayeredProvider { first, second }
    }
}

impl<A: TypeProvider, B: TypeProvider> TypeProvider for LayeredProvider<A, B> {
    fn find_type(&self, name: &str) -> Result<Option<TypeDescriptor>, DescriptorError> {
        match self.first.find_type(name)? {
            Some(descriptor) => Ok(Some(descriptor)),
            None => self.second.find_type(name),
        }
    }

    fn package_exists(&self, package: &str) -> bool {
        self.first.package_exists(package) || self.second.package_exists(package)
    }
}

fn extension(flags: u16) -> ExtensionBlock {
    ExtensionBlock::V1(TeamRoleAttributes {
        flags,
        ..TeamRoleAttributes::default()
    })
}

fn core_types(well_known: &WellKnownNames) -> Vec<TypeDescriptor> {
    let object_sig = format!("L{};", well_known.object.replace('.', "/"));

    let mut object = TypeDescriptor::new(well_known.object.as_str());
    object.methods.push(MethodDescriptor {
        name: "<init>".to_string(),
        modifiers: Modifiers::PUBLIC,
        signature: "()V".to_string(),
    });
    object.methods.push(MethodDescriptor {
        name: "toString".to_string(),
        modifiers: Modifiers::PUBLIC,
        signature: format!("()L{};", well_known.string.replace('.', "/")),
    });
    object.methods.push(MethodDescriptor {
        name: "equals".to_string(),
        modifiers: Modifiers::PUBLIC,
        signature: format!("({})Z", object_sig),
    });

    let mut team = TypeDescriptor::new(well_known.team.as_str());
    team.modifiers = Modifiers::PUBLIC | Modifiers::TEAM;
    team.superclass = Some(well_known.object.clone());
    team.member_types.push(well_known.confined.clone());
    team.extension = extension(EXT_TEAM);
    team.methods.push(MethodDescriptor {
        name: "activate".to_string(),
        modifiers: Modifiers::PUBLIC,
        signature: "()V".to_string(),
    });
    team.methods.push(MethodDescriptor {
        name: "deactivate".to_string(),
        modifiers: Modifiers::PUBLIC,
        signature: "()V".to_string(),
    });

    let mut confined = TypeDescriptor::new(well_known.confined.as_str());
    confined.modifiers = Modifiers::PUBLIC | Modifiers::ABSTRACT;
    confined.enclosing = Some(well_known.team.clone());
    confined.extension = extension(EXT_ROLE | EXT_CONFINED);

    let mut string = TypeDescriptor::new(well_known.string.as_str());
    string.modifiers = Modifiers::PUBLIC | Modifiers::FINAL;
    string.superclass = Some(well_known.object.clone());
    string.methods.push(MethodDescriptor {
        name: "length".to_string(),
        modifiers: Modifiers::PUBLIC,
        signature: "()I".to_string(),
    });

    let mut throwable = TypeDescriptor::new(well_known.throwable.as_str());
    throwable.superclass = Some(well_known.object.clone());

    let mut bound_base = TypeDescriptor::new(well_known.bound_base.as_str());
    bound_base.modifiers = Modifiers::PUBLIC | Modifiers::INTERFACE | Modifiers::ABSTRACT;

    vec![object, team, confined, string, throwable, bound_base]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_types_present() {
        let provider = InMemoryProvider::with_core(&WellKnownNames::default());
        let confined = provider.find_type("core.Team$Confined").unwrap().unwrap();
        assert!(confined.superclass.is_none());
        assert!(confined.extension.attributes().unwrap().is_confined());
        let team = provider.find_type("core.Team").unwrap().unwrap();
        assert!(team.modifiers.is_team());
        assert!(provider.package_exists("core"));
        assert!(!provider.package_exists("core.Team"));
    }

    #[test]
    fn test_insert_registers_parent_packages() {
        let mut provider = InMemoryProvider::new();
        provider.insert(TypeDescriptor::new("a.b.c.T"));
        assert!(provider.package_exists("a"));
        assert!(provider.package_exists("a.b"));
        assert!(provider.package_exists("a.b.c"));
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn test_insert_bytes_round_trips() {
        let mut provider = InMemoryProvider::new();
        let bytes = TypeDescriptor::new("q.Base").encode();
        provider.insert_bytes(&bytes).unwrap();
        assert!(provider.find_type("q.Base").unwrap().is_some());
        assert!(provider.insert_bytes(b"nope").is_err());
    }

    #[test]
    fn test_layered_lookup_order() {
        let mut first = InMemoryProvider::new();
        let mut shadowed = TypeDescriptor::new("p.T");
        shadowed.modifiers = Modifiers::FINAL;
        first.insert(shadowed);
        let mut second = InMemoryProvider::new();
        second.insert(TypeDescriptor::new("p.T"));
        second.insert(TypeDescriptor::new("r.U"));
        let layered = LayeredProvider::new(first, second);
        let found = layered.find_type("p.T").unwrap().unwrap();
        assert_eq!(found.modifiers, Modifiers::FINAL);
        assert!(layered.find_type("r.U").unwrap().is_some());
        assert!(layered.package_exists("r"));
    }
}
