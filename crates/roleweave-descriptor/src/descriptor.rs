//! Binary type descriptors
//!
//! File layout:
//!
//! ```text
//! magic "RWTD" | u16 version | u16 flags | u32 crc32(payload) | payload
//! ```
//!
//! The payload holds the type's structural description; the team/role
//! extension block follows when `flags::HAS_EXTENSION` is set.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encoder::{DecodeError, DescriptorReader, DescriptorWriter};
use crate::extension::ExtensionBlock;
use crate::modifiers::Modifiers;

/// Magic number for descriptor files: "RWTD"
pub const MAGIC: [u8; 4] = *b"RWTD";

/// Current descriptor format version
pub const VERSION: u16 = 1;

/// Size of the fixed header in bytes
pub const HEADER_SIZE: usize = 12;

/// Header flags
pub mod flags {
    /// The payload ends with an extension block
    pub const HAS_EXTENSION: u16 = 0x0001;
}

/// Descriptor file errors
#[derive(Debug, Error)]
pub enum DescriptorError {
    /// Decode error
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Invalid magic number
    #[error("Invalid magic number: expected RWTD, got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Unsupported version
    #[error("Unsupported version: {0} (current: {VERSION})")]
    UnsupportedVersion(u16),

    /// Checksum mismatch
    #[error("Checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch {
        /// Stored checksum
        expected: u32,
        /// Computed checksum
        actual: u32,
    },

    /// The descriptor file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A field in a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Modifier bits
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Type signature
    pub signature: String,
}

/// A method in a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Method name (`<init>` for constructors)
    pub name: String,
    /// Modifier bits
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Method signature, including formal type parameters and throws
    pub signature: String,
}

/// Structural description of one compiled type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Qualified name (`p.q.Outer$Inner`)
    pub name: String,
    /// Modifier bits
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Class header signature, present for generic types
    #[serde(default)]
    pub signature: Option<String>,
    /// Superclass qualified name
    #[serde(default)]
    pub superclass: Option<String>,
    /// Super-interface qualified names
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Enclosing type qualified name
    #[serde(default)]
    pub enclosing: Option<String>,
    /// Member type qualified names
    #[serde(default)]
    pub member_types: Vec<String>,
    /// Fields
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    /// Methods
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
    /// Team/role extension block
    #[serde(default)]
    pub extension: ExtensionBlock,
}

impl TypeDescriptor {
    /// Minimal descriptor with a name
    pub fn new(name: impl Into<String>) -> Self {
        TypeDescriptor {
            name: name.into(),
            modifiers: Modifiers::PUBLIC,
            signature: None,
            superclass: None,
            interfaces: Vec::new(),
            enclosing: None,
            member_types: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            extension: ExtensionBlock::Absent,
        }
    }

    /// Simple name: the part after the last `.` or `$`
    pub fn simple_name(&self) -> &str {
        self.name
            .rsplit(|c| c == '.' || c == '$')
            .next()
            .unwrap_or(&self.name)
    }

    /// Encode to the binary file format
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = DescriptorWriter::new();
        writer.emit_bytes(&MAGIC);
        writer.emit_u16(VERSION);
        let flags = if self.extension.is_present() {
            flags::HAS_EXTENSION
        } else {
            0
        };
        writer.emit_u16(flags);
        let crc32_offset = writer.offset();
        writer.emit_u32(0); // Placeholder for CRC32

        writer.emit_string(&self.name);
        writer.emit_u32(self.modifiers.bits());
        writer.emit_opt_string(self.signature.as_deref());
        writer.emit_opt_string(self.superclass.as_deref());
        writer.emit_strings(&self.interfaces);
        writer.emit_opt_string(self.enclosing.as_deref());
        writer.emit_strings(&self.member_types);

        writer.emit_u32(self.fields.len() as u32);
        for field in &self.fields {
            writer.emit_string(&field.name);
            writer.emit_u32(field.modifiers.bits());
            writer.emit_string(&field.signature);
        }

        writer.emit_u32(self.methods.len() as u32);
        for method in &self.methods {
            writer.emit_string(&method.name);
            writer.emit_u32(method.modifiers.bits());
            writer.emit_string(&method.signature);
        }

        self.extension.encode(&mut writer);

        let crc32 = crc32fast::hash(&writer.buffer()[HEADER_SIZE..]);
        writer.patch_u32(crc32_offset, crc32);
        writer.into_bytes()
    }

    /// Decode from the binary file format
    ///
    /// A damaged extension block does not fail the decode; it surfaces as
    /// [`ExtensionBlock::Unsupported`] or [`ExtensionBlock::Corrupt`].
    pub fn decode(data: &[u8]) -> Result<Self, DescriptorError> {
        let mut reader = DescriptorReader::new(data);

        let magic = reader.read_array::<4>()?;
        if magic != MAGIC {
            return Err(DescriptorError::InvalidMagic(magic));
        }
        let version = reader.read_u16()?;
        if version != VERSION {
            return Err(DescriptorError::UnsupportedVersion(version));
        }
        let header_flags = reader.read_u16()?;
        let stored_crc32 = reader.read_u32()?;

        let calculated_crc32 = crc32fast::hash(&data[HEADER_SIZE..]);
        if stored_crc32 != calculated_crc32 {
            return Err(DescriptorError::ChecksumMismatch {
                expected: stored_crc32,
                actual: calculated_crc32,
            });
        }

        let name = reader.read_string()?;
        let modifiers = Modifiers(reader.read_u32()?);
        let signature = reader.read_opt_string()?;
        let superclass = reader.read_opt_string()?;
        let interfaces = reader.read_strings()?;
        let enclosing = reader.read_opt_string()?;
        let member_types = reader.read_strings()?;

        let field_count = reader.read_u32()? as usize;
        let mut fields = Vec::new();
        for _ in 0..field_count {
            fields.push(FieldDescriptor {
                name: reader.read_string()?,
                modifiers: Modifiers(reader.read_u32()?),
                signature: reader.read_string()?,
            });
        }

        let method_count = reader.read_u32()? as usize;
        let mut methods = Vec::new();
        for _ in 0..method_count {
            methods.push(MethodDescriptor {
                name: reader.read_string()?,
                modifiers: Modifiers(reader.read_u32()?),
                signature: reader.read_string()?,
            });
        }

        let extension = if header_flags & flags::HAS_EXTENSION != 0 {
            ExtensionBlock::decode(&mut reader)?
        } else {
            ExtensionBlock::Absent
        };
        reader.expect_end()?;

        Ok(TypeDescriptor {
            name,
            modifiers,
            signature,
            superclass,
            interfaces,
            enclosing,
            member_types,
            fields,
            methods,
            extension,
        })
    }
}
