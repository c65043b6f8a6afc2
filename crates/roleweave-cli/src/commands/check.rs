//! `roleweave check`: resolve a set of units and report their problems.

use std::path::{Path, PathBuf};

use anyhow::Context;
use roleweave_binder::decl::CompilationUnitDecl;
use roleweave_binder::{BinderOptions, InMemoryProvider, LayeredProvider, Session, TypeProvider};
use roleweave_diagnostics::SourceFiles;
use termcolor::ColorChoice;
use tracing::info;

use crate::output::{StyledOutput, Tally};
use crate::provider::DirectoryProvider;
use crate::Format;

/// Configuration file picked up from the working directory
pub const DEFAULT_CONFIG: &str = "roleweave.toml";

pub struct CheckOptions {
    pub units: PathBuf,
    pub descriptors: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub format: Format,
    pub color: ColorChoice,
}

/// Run the check; the returned exit code is 1 when errors were reported
pub fn execute(opts: CheckOptions) -> anyhow::Result<i32> {
    let options = load_options(opts.config.as_deref())?;
    let units = load_units(&opts.units)?;
    let unit_count = units.len();

    let mut sources = SourceFiles::new();
    for unit in &units {
        if let Some(source) = &unit.source {
            sources.add(unit.file_name.clone(), source.clone());
        }
    }

    let core = InMemoryProvider::with_core(&options.well_known);
    let provider: Box<dyn TypeProvider> = match &opts.descriptors {
        Some(dir) => {
            if !dir.is_dir() {
                anyhow::bail!("descriptor directory '{}' does not exist", dir.display());
            }
            Box::new(LayeredProvider::new(DirectoryProvider::new(dir), core))
        }
        None => Box::new(core),
    };

    let mut session = Session::new(provider, options)?;
    session.add_units(units)?;
    session.resolve()?;
    let problems = session.into_problems();
    info!(units = unit_count, problems = problems.len(), "check finished");

    match opts.format {
        Format::Json => {
            println!("{}", roleweave_diagnostics::to_json(&problems)?);
        }
        Format::Pretty => {
            roleweave_diagnostics::emit(&problems, &sources, opts.color)
                .context("failed to render problems")?;
            StyledOutput::new(opts.color).summary(unit_count, Tally::of(&problems));
        }
    }
    Ok(if problems.iter().any(|p| p.is_error()) { 1 } else { 0 })
}

/// Options from `path`, else from `roleweave.toml` in the working
/// directory, else defaults
pub fn load_options(path: Option<&Path>) -> anyhow::Result<BinderOptions> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG);
            if !default.is_file() {
                return Ok(BinderOptions::default());
            }
            default
        }
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config '{}'", path.display()))?;
    let options: BinderOptions =
        toml::from_str(&text).with_context(|| format!("invalid config '{}'", path.display()))?;
    options
        .severity_config()
        .with_context(|| format!("invalid severities in '{}'", path.display()))?;
    Ok(options)
}

fn load_units(path: &Path) -> anyhow::Result<Vec<CompilationUnitDecl>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read units '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid units '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use roleweave_binder::WeavingScheme;

    use super::*;

    #[test]
    fn test_load_options_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "weaving_scheme = \"static\"\nstrict = true\n").unwrap();
        let options = load_options(Some(&path)).unwrap();
        assert_eq!(options.weaving_scheme, WeavingScheme::Static);
        assert!(options.strict);
    }

    #[test]
    fn test_bad_severity_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[severities]\nNOT_A_PROBLEM = \"error\"\n").unwrap();
        let err = load_options(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid severities"));
    }

    #[test]
    fn test_missing_units_file() {
        let err = load_units(Path::new("/nonexistent/units.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read units"));
    }
}
