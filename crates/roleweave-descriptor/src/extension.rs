//! Team/role extension block
//!
//! The block is versioned independently of the descriptor so that older
//! readers can skip attributes they do not understand. Layout on the wire:
//! `u16 block_version`, `u32 length`, then `length` bytes of body. Version 1
//! body:
//!
//! ```text
//! u16 flags            (ROLE, TEAM, CONFINED)
//! opt base_class
//! u32 n, n * callin    (label, role_method, role_signature, u8 kind,
//!                       u32 m, m * (base_method, base_signature))
//! u32 n, n * callout   (role_method, role_signature, u8 kind,
//!                       base_member, base_signature)
//! u32 n, n * anchor    (member, anchor_path)
//! strings              methods calling the base constructor
//! u32 n, n * precedence (u8 after, strings labels)
//! ```

use serde::{Deserialize, Serialize};

use crate::encoder::{DecodeError, DescriptorReader, DescriptorWriter};

/// Highest block version this crate understands
pub const EXTENSION_VERSION: u16 = 1;

/// Flag: the type is a role
pub const EXT_ROLE: u16 = 0x0001;
/// Flag: the type is a team
pub const EXT_TEAM: u16 = 0x0002;
/// Flag: the type is a confined role (no superclass)
pub const EXT_CONFINED: u16 = 0x0004;

/// Kind of a callin binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallinKind {
    /// Runs before the base method
    Before,
    /// Runs after the base method
    After,
    /// Replaces the base method
    Replace,
}

impl CallinKind {
    fn to_u8(self) -> u8 {
        match self {
            CallinKind::Before => 0,
            CallinKind::After => 1,
            CallinKind::Replace => 2,
        }
    }

    fn from_u8(value: u8, offset: usize) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(CallinKind::Before),
            1 => Ok(CallinKind::After),
            2 => Ok(CallinKind::Replace),
            _ => Err(DecodeError::InvalidTag(value, offset)),
        }
    }
}

/// Kind of a callout binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalloutKind {
    /// Delegates to a base method
    Method,
    /// Reads a base field
    Get,
    /// Writes a base field
    Set,
}

impl CalloutKind {
    fn to_u8(self) -> u8 {
        match self {
            CalloutKind::Method => 0,
            CalloutKind::Get => 1,
            CalloutKind::Set => 2,
        }
    }

    fn from_u8(value: u8, offset: usize) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(CalloutKind::Method),
            1 => Ok(CalloutKind::Get),
            2 => Ok(CalloutKind::Set),
            _ => Err(DecodeError::InvalidTag(value, offset)),
        }
    }
}

/// A base method reference inside a callin record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseMethodRef {
    /// Method name
    pub name: String,
    /// Method signature
    pub signature: String,
}

/// A compiled callin binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallinRecord {
    /// Binding label used by precedence declarations
    pub label: String,
    /// Role method name
    pub role_method: String,
    /// Role method signature
    pub role_signature: String,
    /// Binding kind
    pub kind: CallinKind,
    /// Bound base methods
    pub base_methods: Vec<BaseMethodRef>,
}

/// A compiled callout binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalloutRecord {
    /// Role method name
    pub role_method: String,
    /// Role method signature
    pub role_signature: String,
    /// Binding kind
    pub kind: CalloutKind,
    /// Base method or field name
    pub base_member: String,
    /// Base method or field signature
    pub base_signature: String,
}

/// A member whose type is anchored to a value path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRecord {
    /// Field or method carrying the anchored type
    pub member: String,
    /// Dotted path of the anchor field
    pub anchor_path: String,
}

/// A compiled precedence declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecedenceRecord {
    /// Declared as `precedence after`
    pub after: bool,
    /// Binding labels, highest priority first
    pub labels: Vec<String>,
}

/// Version 1 team/role attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRoleAttributes {
    /// `EXT_*` flags
    pub flags: u16,
    /// Bound base class of a role
    pub base_class: Option<String>,
    /// Callin bindings declared by a role
    #[serde(default)]
    pub callins: Vec<CallinRecord>,
    /// Callout bindings declared by a role
    #[serde(default)]
    pub callouts: Vec<CalloutRecord>,
    /// Anchored member types
    #[serde(default)]
    pub anchors: Vec<AnchorRecord>,
    /// Constructors or methods that call the base constructor
    #[serde(default)]
    pub calls_base_ctor: Vec<String>,
    /// Precedence declarations
    #[serde(default)]
    pub precedences: Vec<PrecedenceRecord>,
}

impl TeamRoleAttributes {
    /// Whether the role flag is set
    pub fn is_role(&self) -> bool {
        self.flags & EXT_ROLE != 0
    }

    /// Whether the team flag is set
    pub fn is_team(&self) -> bool {
        self.flags & EXT_TEAM != 0
    }

    /// Whether the confined flag is set
    pub fn is_confined(&self) -> bool {
        self.flags & EXT_CONFINED != 0
    }

    pub(crate) fn encode(&self, writer: &mut DescriptorWriter) {
        writer.emit_u16(self.flags);
        writer.emit_opt_string(self.base_class.as_deref());

        writer.emit_u32(self.callins.len() as u32);
        for callin in &self.callins {
            writer.emit_string(&callin.label);
            writer.emit_string(&callin.role_method);
            writer.emit_string(&callin.role_signature);
            writer.emit_u8(callin.kind.to_u8());
            writer.emit_u32(callin.base_methods.len() as u32);
            for base in &callin.base_methods {
                writer.emit_string(&base.name);
                writer.emit_string(&base.signature);
            }
        }

        writer.emit_u32(self.callouts.len() as u32);
        for callout in &self.callouts {
            writer.emit_string(&callout.role_method);
            writer.emit_string(&callout.role_signature);
            writer.emit_u8(callout.kind.to_u8());
            writer.emit_string(&callout.base_member);
            writer.emit_string(&callout.base_signature);
        }

        writer.emit_u32(self.anchors.len() as u32);
        for anchor in &self.anchors {
            writer.emit_string(&anchor.member);
            writer.emit_string(&anchor.anchor_path);
        }

        writer.emit_strings(&self.calls_base_ctor);

        writer.emit_u32(self.precedences.len() as u32);
        for precedence in &self.precedences {
            writer.emit_u8(precedence.after as u8);
            writer.emit_strings(&precedence.labels);
        }
    }

    pub(crate) fn decode(reader: &mut DescriptorReader<'_>) -> Result<Self, DecodeError> {
        let flags = reader.read_u16()?;
        let base_class = reader.read_opt_string()?;

        let count = reader.read_u32()? as usize;
        let mut callins = Vec::new();
        for _ in 0..count {
            let label = reader.read_string()?;
            let role_method = reader.read_string()?;
            let role_signature = reader.read_string()?;
            let offset = reader.position();
            let kind = CallinKind::from_u8(reader.read_u8()?, offset)?;
            let base_count = reader.read_u32()? as usize;
            let mut base_methods = Vec::new();
            for _ in 0..base_count {
                base_methods.push(BaseMethodRef {
                    name: reader.read_string()?,
                    signature: reader.read_string()?,
                });
            }
            callins.push(CallinRecord {
                label,
                role_method,
                role_signature,
                kind,
                base_methods,
            });
        }

        let count = reader.read_u32()? as usize;
        let mut callouts = Vec::new();
        for _ in 0..count {
            let role_method = reader.read_string()?;
            let role_signature = reader.read_string()?;
            let offset = reader.position();
            let kind = CalloutKind::from_u8(reader.read_u8()?, offset)?;
            callouts.push(CalloutRecord {
                role_method,
                role_signature,
                kind,
                base_member: reader.read_string()?,
                base_signature: reader.read_string()?,
            });
        }

        let count = reader.read_u32()? as usize;
        let mut anchors = Vec::new();
        for _ in 0..count {
            anchors.push(AnchorRecord {
                member: reader.read_string()?,
                anchor_path: reader.read_string()?,
            });
        }

        let calls_base_ctor = reader.read_strings()?;

        let count = reader.read_u32()? as usize;
        let mut precedences = Vec::new();
        for _ in 0..count {
            let offset = reader.position();
            let after = match reader.read_u8()? {
                0 => false,
                1 => true,
                tag => return Err(DecodeError::InvalidTag(tag, offset)),
            };
            precedences.push(PrecedenceRecord {
                after,
                labels: reader.read_strings()?,
            });
        }

        Ok(TeamRoleAttributes {
            flags,
            base_class,
            callins,
            callouts,
            anchors,
            calls_base_ctor,
            precedences,
        })
    }
}

/// State of a descriptor's extension block after decoding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ExtensionBlock {
    /// No block present
    #[default]
    Absent,
    /// A version 1 block
    V1(TeamRoleAttributes),
    /// A block of a version this reader does not understand
    Unsupported {
        /// Block version found
        version: u16,
        /// Raw body, preserved for re-encoding
        body: Vec<u8>,
    },
    /// A block of a known version whose body failed to decode
    Corrupt {
        /// Block version found
        version: u16,
        /// Decoder message
        reason: String,
        /// Raw body, preserved for re-encoding
        body: Vec<u8>,
    },
}

impl ExtensionBlock {
    /// Attributes, if the block decoded cleanly
    pub fn attributes(&self) -> Option<&TeamRoleAttributes> {
        match self {
            ExtensionBlock::V1(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Whether a block is present
    pub fn is_present(&self) -> bool {
        !matches!(self, ExtensionBlock::Absent)
    }

    pub(crate) fn encode(&self, writer: &mut DescriptorWriter) {
        let (version, body) = match self {
            ExtensionBlock::Absent => return,
            ExtensionBlock::V1(attrs) => {
                let mut body = DescriptorWriter::new();
                attrs.encode(&mut body);
                (EXTENSION_VERSION, body.into_bytes())
            }
            ExtensionBlock::Unsupported { version, body }
            | ExtensionBlock::Corrupt { version, body, .. } => (*version, body.clone()),
        };
        writer.emit_u16(version);
        writer.emit_u32(body.len() as u32);
        writer.emit_bytes(&body);
    }

    /// Decode a block; only a truncated frame is an error, body problems
    /// are reported through the returned variant
    pub(crate) fn decode(reader: &mut DescriptorReader<'_>) -> Result<Self, DecodeError> {
        let version = reader.read_u16()?;
        let len = reader.read_u32()? as usize;
        let body = reader.read_slice(len)?;
        if version != EXTENSION_VERSION {
            return Ok(ExtensionBlock::Unsupported {
                version,
                body: body.to_vec(),
            });
        }
        let mut body_reader = DescriptorReader::new(body);
        let decoded = TeamRoleAttributes::decode(&mut body_reader)
            .and_then(|attrs| body_reader.expect_end().map(|_| attrs));
        Ok(match decoded {
            Ok(attrs) => ExtensionBlock::V1(attrs),
            Err(err) => ExtensionBlock::Corrupt {
                version,
                reason: err.to_string(),
                body: body.to_vec(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TeamRoleAttributes {
        TeamRoleAttributes {
            flags: EXT_ROLE,
            base_class: Some("p.Base".to_string()),
            callins: vec![CallinRecord {
                label: "log".to_string(),
                role_method: "trace".to_string(),
                role_signature: "()V".to_string(),
                kind: CallinKind::Replace,
                base_methods: vec![BaseMethodRef {
                    name: "run".to_string(),
                    signature: "(I)V".to_string(),
                }],
            }],
            callouts: vec![CalloutRecord {
                role_method: "getName".to_string(),
                role_signature: "()Lcore/String;".to_string(),
                kind: CalloutKind::Get,
                base_member: "name".to_string(),
                base_signature: "Lcore/String;".to_string(),
            }],
            anchors: Vec::new(),
            calls_base_ctor: vec!["<init>".to_string()],
            precedences: vec![PrecedenceRecord {
                after: true,
                labels: vec!["a".to_string(), "b".to_string()],
            }],
        }
    }

    #[test]
    fn test_v1_block() {
        let block = ExtensionBlock::V1(sample());
        let mut writer = DescriptorWriter::new();
        block.encode(&mut writer);
        let bytes = writer.into_bytes();
        let decoded = ExtensionBlock::decode(&mut DescriptorReader::new(&bytes)).unwrap();
        assert_eq!(decoded, block);
        assert!(decoded.attributes().unwrap().is_role());
    }

    #[test]
    fn test_unknown_version_is_unsupported() {
        let mut writer = DescriptorWriter::new();
        writer.emit_u16(7);
        writer.emit_u32(3);
        writer.emit_bytes(&[1, 2, 3]);
        let bytes = writer.into_bytes();
        let decoded = ExtensionBlock::decode(&mut DescriptorReader::new(&bytes)).unwrap();
        assert_eq!(
            decoded,
            ExtensionBlock::Unsupported {
                version: 7,
                body: vec![1, 2, 3]
            }
        );
    }

    #[test]
    fn test_garbage_body_is_corrupt() {
        let mut writer = DescriptorWriter::new();
        writer.emit_u16(EXTENSION_VERSION);
        writer.emit_u32(2);
        writer.emit_bytes(&[0xFF, 0xFF]);
        let bytes = writer.into_bytes();
        let decoded = ExtensionBlock::decode(&mut DescriptorReader::new(&bytes)).unwrap();
        assert!(matches!(decoded, ExtensionBlock::Corrupt { version: 1, .. }));
    }

    #[test]
    fn test_truncated_frame_is_error() {
        let mut writer = DescriptorWriter::new();
        writer.emit_u16(EXTENSION_VERSION);
        writer.emit_u32(100);
        let bytes = writer.into_bytes();
        assert!(ExtensionBlock::decode(&mut DescriptorReader::new(&bytes)).is_err());
    }
}
