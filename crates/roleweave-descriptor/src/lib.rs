//! Roleweave binary type descriptors
//!
//! Compiled types are described by a small binary file: structural data
//! (modifiers, supertypes, members and their signatures) followed by an
//! optional, independently versioned team/role extension block. The
//! [`signature`] module parses the generic signature grammar used inside
//! descriptors.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod descriptor;
pub mod encoder;
pub mod extension;
pub mod modifiers;
pub mod signature;

pub use descriptor::{
    DescriptorError, FieldDescriptor, MethodDescriptor, TypeDescriptor, HEADER_SIZE, MAGIC,
    VERSION,
};
pub use encoder::{DecodeError, DescriptorReader, DescriptorWriter};
pub use extension::{
    AnchorRecord, BaseMethodRef, CallinKind, CallinRecord, CalloutKind, CalloutRecord,
    ExtensionBlock, PrecedenceRecord, TeamRoleAttributes, EXTENSION_VERSION, EXT_CONFINED,
    EXT_ROLE, EXT_TEAM,
};
pub use modifiers::{Modifier, Modifiers};
pub use signature::{
    parse_class, parse_method, parse_type, BaseType, ClassSegment, ClassSignature,
    ClassTypeSig, FormalTypeParam, MethodSignature, SignatureError, TypeArgSig, TypeSig,
};
