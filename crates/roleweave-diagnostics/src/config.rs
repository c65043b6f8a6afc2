//! Severity configuration: per-problem overrides and strict mode

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::ProblemId;
use crate::problem::Severity;

/// Severity as written in configuration files, including `ignore`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    /// Report as error
    Error,
    /// Report as warning
    Warning,
    /// Report as info
    Info,
    /// Do not report
    Ignore,
}

impl SeverityLevel {
    fn to_severity(self) -> Option<Severity> {
        match self {
            SeverityLevel::Error => Some(Severity::Error),
            SeverityLevel::Warning => Some(Severity::Warning),
            SeverityLevel::Info => Some(Severity::Info),
            SeverityLevel::Ignore => None,
        }
    }
}

/// Errors in a severity table
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A table key does not name a problem
    #[error("unknown problem name '{0}'")]
    UnknownProblem(String),

    /// A table key names a retired problem
    #[error("problem '{0}' is deprecated and can no longer be configured")]
    DeprecatedProblem(String),
}

/// Per-problem severity overrides
#[derive(Debug, Clone, Default)]
pub struct SeverityConfig {
    /// `None` means the problem is ignored
    overrides: FxHashMap<ProblemId, Option<Severity>>,
    /// When true, every warning is reported as an error
    pub strict: bool,
}

impl SeverityConfig {
    /// Configuration without overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict mode: all warnings become errors
    pub fn strict() -> Self {
        SeverityConfig {
            strict: true,
            ..Self::default()
        }
    }

    /// Build from a `[severities]` table keyed by symbolic problem name
    pub fn from_table(
        table: &BTreeMap<String, SeverityLevel>,
        strict: bool,
    ) -> Result<Self, ConfigError> {
        let mut config = SeverityConfig {
            strict,
            ..Self::default()
        };
        for (name, level) in table {
            let id = ProblemId::from_name(name)
                .ok_or_else(|| ConfigError::UnknownProblem(name.clone()))?;
            if id.is_deprecated() {
                return Err(ConfigError::DeprecatedProblem(name.clone()));
            }
            config.overrides.insert(id, level.to_severity());
        }
        Ok(config)
    }

    /// Override the severity of one problem
    pub fn set_severity(&mut self, id: ProblemId, severity: Severity) {
        self.overrides.insert(id, Some(severity));
    }

    /// Suppress one problem
    pub fn ignore(&mut self, id: ProblemId) {
        self.overrides.insert(id, None);
    }

    /// Effective severity, `None` if the problem is suppressed
    pub fn effective_severity(&self, id: ProblemId) -> Option<Severity> {
        let severity = match self.overrides.get(&id) {
            Some(overridden) => *overridden,
            None => Some(id.default_severity()),
        }?;
        if self.strict && severity == Severity::Warning {
            Some(Severity::Error)
        } else {
            Some(severity)
        }
    }
}
