//! `roleweave encode`: write the binary form of a JSON descriptor.

use std::path::Path;

use anyhow::Context;
use roleweave_descriptor::TypeDescriptor;
use tracing::info;

pub fn execute(file: &Path, output: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read '{}'", file.display()))?;
    let descriptor: TypeDescriptor = serde_json::from_str(&text)
        .with_context(|| format!("invalid descriptor '{}'", file.display()))?;
    let bytes = descriptor.encode();
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
    std::fs::write(output, &bytes)
        .with_context(|| format!("failed to write '{}'", output.display()))?;
    info!(name = %descriptor.name, bytes = bytes.len(), "descriptor written");
    Ok(())
}
