//! `roleweave describe`: print a compiled descriptor as JSON.

use std::path::Path;

use anyhow::Context;
use roleweave_descriptor::{ExtensionBlock, TypeDescriptor};
use tracing::warn;

pub fn execute(file: &Path) -> anyhow::Result<()> {
    let data = std::fs::read(file).with_context(|| format!("failed to read '{}'", file.display()))?;
    let descriptor = TypeDescriptor::decode(&data)
        .with_context(|| format!("failed to decode '{}'", file.display()))?;
    match &descriptor.extension {
        ExtensionBlock::Unsupported { version, .. } => {
            warn!(version, "extension block of an unknown version");
        }
        ExtensionBlock::Corrupt { reason, .. } => {
            warn!(%reason, "extension block is damaged");
        }
        _ => {}
    }
    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(())
}
