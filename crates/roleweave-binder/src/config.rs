//! Binder configuration
//!
//! Loaded by the driver from `roleweave.toml`; every field has a default so
//! an empty file is a valid configuration.
//!
//! ```toml
//! weaving_scheme = "dynamic"
//! implicit_imports = ["core"]
//! strict = false
//!
//! [well_known]
//! object = "core.Object"
//!
//! [severities]
//! UNUSED_BASE_IMPORT = "ignore"
//! ```

use std::collections::BTreeMap;

use roleweave_diagnostics::{ConfigError, SeverityConfig, SeverityLevel};
use serde::{Deserialize, Serialize};

/// How callin methods are woven, which fixes the extra arguments their
/// enhanced signature carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeavingScheme {
    /// Load-time weaving through a dispatch table
    #[default]
    Dynamic,
    /// Weaving into the base classes at compile time
    Static,
    /// No weaving: callin methods keep their declared signature
    None,
}

/// One synthetic argument prepended to a callin method's signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhancingArg {
    /// The base object, typed as the bound-base interface
    BaseArg,
    /// Active teams, typed as a team array
    Teams,
    /// Index into the team array
    Index,
    /// Callin ids of the active bindings
    CallinIds,
    /// Id of the intercepted base method
    BoundMethodId,
    /// Boxed original arguments
    Args,
}

impl EnhancingArg {
    /// Name of the synthetic parameter
    pub fn name(self) -> &'static str {
        match self {
            EnhancingArg::BaseArg => "_weave$baseArg",
            EnhancingArg::Teams => "_weave$teams",
            EnhancingArg::Index => "_weave$index",
            EnhancingArg::CallinIds => "_weave$callinIds",
            EnhancingArg::BoundMethodId => "_weave$boundMethodId",
            EnhancingArg::Args => "_weave$args",
        }
    }
}

const DYNAMIC_ARGS: &[EnhancingArg] = &[
    EnhancingArg::BaseArg,
    EnhancingArg::Teams,
    EnhancingArg::Index,
    EnhancingArg::CallinIds,
];

const STATIC_ARGS: &[EnhancingArg] = &[
    EnhancingArg::BaseArg,
    EnhancingArg::Teams,
    EnhancingArg::Index,
    EnhancingArg::CallinIds,
    EnhancingArg::BoundMethodId,
    EnhancingArg::Args,
];

impl WeavingScheme {
    /// Synthetic arguments in the order they precede the declared ones
    pub fn enhancing_args(self) -> &'static [EnhancingArg] {
        match self {
            WeavingScheme::Dynamic => DYNAMIC_ARGS,
            WeavingScheme::Static => STATIC_ARGS,
            WeavingScheme::None => &[],
        }
    }

    /// Number of synthetic arguments
    pub fn enhancing_arg_count(self) -> usize {
        self.enhancing_args().len()
    }
}

/// Qualified names of types the binder treats specially
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WellKnownNames {
    /// Root of the class hierarchy
    pub object: String,
    /// Implicit superclass of every team
    pub team: String,
    /// Confined role root; has no superclass
    pub confined: String,
    /// String type
    pub string: String,
    /// Root of thrown types
    pub throwable: String,
    /// Interface implemented by every bound base class
    pub bound_base: String,
}

impl Default for WellKnownNames {
    fn default() -> Self {
        WellKnownNames {
            object: "core.Object".to_string(),
            team: "core.Team".to_string(),
            confined: "core.Team$Confined".to_string(),
            string: "core.String".to_string(),
            throwable: "core.Throwable".to_string(),
            bound_base: "core.BoundBase".to_string(),
        }
    }
}

/// Options controlling one binding session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BinderOptions {
    /// Weaving scheme for callin methods
    pub weaving_scheme: WeavingScheme,
    /// Well-known type names
    pub well_known: WellKnownNames,
    /// Packages imported on demand by every unit
    pub implicit_imports: Vec<String>,
    /// Per-problem severity overrides by symbolic name
    pub severities: BTreeMap<String, SeverityLevel>,
    /// Report every warning as an error
    pub strict: bool,
}

impl Default for BinderOptions {
    fn default() -> Self {
        BinderOptions {
            weaving_scheme: WeavingScheme::default(),
            well_known: WellKnownNames::default(),
            implicit_imports: vec!["core".to_string()],
            severities: BTreeMap::new(),
            strict: false,
        }
    }
}

impl BinderOptions {
    /// Options with the given weaving scheme and defaults otherwise
    pub fn with_scheme(weaving_scheme: WeavingScheme) -> Self {
        BinderOptions {
            weaving_scheme,
            ..Self::default()
        }
    }

    /// Severity configuration built from `severities` and `strict`
    pub fn severity_config(&self) -> Result<SeverityConfig, ConfigError> {
        SeverityConfig::from_table(&self.severities, self.strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhancing_arg_counts() {
        assert_eq!(WeavingScheme::Dynamic.enhancing_arg_count(), 4);
        assert_eq!(WeavingScheme::Static.enhancing_arg_count(), 6);
        assert_eq!(WeavingScheme::None.enhancing_arg_count(), 0);
    }

    #[test]
    fn test_defaults() {
        let options = BinderOptions::default();
        assert_eq!(options.well_known.confined, "core.Team$Confined");
        assert_eq!(options.implicit_imports, vec!["core".to_string()]);
        assert!(options.severity_config().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let options: BinderOptions = toml::from_str(
            r#"
            weaving_scheme = "static"
            strict = true

            [well_known]
            object = "lang.Object"

            [severities]
            UNUSED_BASE_IMPORT = "ignore"
            "#,
        )
        .unwrap();
        assert_eq!(options.weaving_scheme, WeavingScheme::Static);
        assert_eq!(options.well_known.object, "lang.Object");
        assert_eq!(options.well_known.team, "core.Team");
        let config = options.severity_config().unwrap();
        assert!(config.strict);
    }

    #[test]
    fn test_unknown_severity_name_is_rejected() {
        let mut options = BinderOptions::default();
        options
            .severities
            .insert("NO_SUCH_PROBLEM".to_string(), SeverityLevel::Error);
        assert!(options.severity_config().is_err());
    }
}
