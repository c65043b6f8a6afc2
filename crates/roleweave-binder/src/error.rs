//! Fatal session errors
//!
//! Everything recoverable is reported through the problem sink and
//! represented in the binding graph by problem bindings. The errors here
//! mean the environment itself can no longer be trusted.

use std::fmt;

use roleweave_diagnostics::ConfigError;
use thiserror::Error;

/// A lazily resolved component of a type binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    /// Superclass and super-interfaces
    Supertypes,
    /// Member types
    MemberTypes,
    /// Type variables
    TypeVariables,
    /// Fields
    Fields,
    /// Methods
    Methods,
    /// Bound base class of a role
    BaseClass,
    /// tsuper roles of a role
    TsuperRoles,
    /// Callin and callout mappings of a role
    Mappings,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Supertypes => "supertypes",
            Component::MemberTypes => "member types",
            Component::TypeVariables => "type variables",
            Component::Fields => "fields",
            Component::Methods => "methods",
            Component::BaseClass => "base class",
            Component::TsuperRoles => "tsuper roles",
            Component::Mappings => "method mappings",
        };
        f.write_str(name)
    }
}

/// Unrecoverable condition that aborts a compilation session
#[derive(Debug, Error)]
pub enum SessionAbort {
    /// A component was requested while its own resolution was running
    #[error("re-entrant resolution of {component} for '{binding}'")]
    Reentrant {
        /// Qualified name of the binding
        binding: String,
        /// Component being resolved
        component: Component,
    },

    /// An environment invariant does not hold
    #[error("internal inconsistency: {0}")]
    Internal(String),

    /// The binder configuration is unusable
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A signature view switch did not balance
    #[error(transparent)]
    View(#[from] ViewError),
}

/// Misuse of the signature view switch of a method
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ViewError {
    /// Only callin methods under an enhancing weaving scheme have two views
    #[error("method '{0}' has no enhanced signature")]
    NotEnhanceable(String),

    /// `exit_source_view` without a matching `enter_source_view`
    #[error("method '{0}' is not in its source view")]
    NotInSourceView(String),
}
