//! Descriptor directory provider
//!
//! A type `p.q.Outer$Inner` is read from `<root>/p/q/Outer$Inner.rwtd` the
//! first time the binder asks for it.

use std::io::ErrorKind;
use std::path::PathBuf;

use roleweave_binder::TypeProvider;
use roleweave_descriptor::{DescriptorError, TypeDescriptor};
use tracing::debug;

/// File extension of encoded descriptors
pub const DESCRIPTOR_EXTENSION: &str = "rwtd";

/// Reads descriptors from a directory tree mirroring the package structure
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryProvider { root: root.into() }
    }

    /// Path of the descriptor file for `name`
    pub fn path_of(&self, name: &str) -> PathBuf {
        let mut path = self.root.clone();
        let mut segments = name.split('.').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{}.{}", segment, DESCRIPTOR_EXTENSION));
            }
        }
        path
    }

    fn package_dir(&self, package: &str) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(package.split('.'));
        path
    }
}

impl TypeProvider for DirectoryProvider {
    fn find_type(&self, name: &str) -> Result<Option<TypeDescriptor>, DescriptorError> {
        let path = self.path_of(name);
        let data = match std::fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "loading descriptor");
        TypeDescriptor::decode(&data).map(Some)
    }

    fn package_exists(&self, package: &str) -> bool {
        !package.is_empty() && self.package_dir(package).is_dir()
    }
}
