//! Reported problems and the sink that collects them

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SeverityConfig;
use crate::id::ProblemId;

/// Severity of a reported problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational note
    Info,
    /// Warning, does not block code generation
    Warning,
    /// Error, blocks code generation
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Source position range of a problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset
    pub start: u32,
    /// End byte offset (exclusive)
    pub end: u32,
    /// 1-based line of `start`, 0 if unknown
    #[serde(default)]
    pub line: u32,
    /// 1-based column of `start`, 0 if unknown
    #[serde(default)]
    pub column: u32,
}

impl Span {
    /// Create a new span
    pub const fn new(start: u32, end: u32, line: u32, column: u32) -> Self {
        Span {
            start,
            end,
            line,
            column,
        }
    }

    /// Span used for problems on binary types, which have no source
    pub const fn none() -> Self {
        Span::new(0, 0, 0, 0)
    }

    /// Whether this span carries no position
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A single reported problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Stable numeric id
    pub id: ProblemId,
    /// Effective severity (after configuration)
    pub severity: Severity,
    /// Unit the problem belongs to, if any
    pub file: Option<String>,
    /// Position range
    pub span: Span,
    /// Message arguments (names, types) in id-specific order
    pub arguments: Vec<String>,
}

impl Problem {
    /// Whether this problem is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.severity, self.id, self.id.name())?;
        if !self.arguments.is_empty() {
            write!(f, ": {}", self.arguments.join(", "))?;
        }
        Ok(())
    }
}

/// Collects problems, applying the severity configuration
///
/// The sink also remembers which unit is currently being processed so that
/// deep resolution code does not need to thread file names around.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    config: SeverityConfig,
    problems: Vec<Problem>,
    current_file: Option<String>,
}

impl Diagnostics {
    /// Create a sink with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink with the given configuration
    pub fn with_config(config: SeverityConfig) -> Self {
        Diagnostics {
            config,
            problems: Vec::new(),
            current_file: None,
        }
    }

    /// Set the unit subsequent problems are attributed to
    ///
    /// Returns the previous unit so callers can restore it.
    pub fn set_current_file(&mut self, file: Option<String>) -> Option<String> {
        std::mem::replace(&mut self.current_file, file)
    }

    /// Unit problems are currently attributed to
    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    /// Report a problem at `span` with message arguments
    ///
    /// Returns `false` when the configuration suppresses the id.
    pub fn report<I, S>(&mut self, id: ProblemId, span: Span, arguments: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if id.is_deprecated() {
            return false;
        }
        let severity = match self.config.effective_severity(id) {
            Some(severity) => severity,
            None => return false,
        };
        self.problems.push(Problem {
            id,
            severity,
            file: self.current_file.clone(),
            span,
            arguments: arguments.into_iter().map(Into::into).collect(),
        });
        true
    }

    /// All problems in report order
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Consume the sink
    pub fn into_problems(self) -> Vec<Problem> {
        self.problems
    }

    /// Problems with the given id
    pub fn with_id(&self, id: ProblemId) -> impl Iterator<Item = &Problem> {
        self.problems.iter().filter(move |p| p.id == id)
    }

    /// Whether any problem with the given id was reported
    pub fn has(&self, id: ProblemId) -> bool {
        self.with_id(id).next().is_some()
    }

    /// Number of errors
    pub fn error_count(&self) -> usize {
        self.problems.iter().filter(|p| p.is_error()).count()
    }

    /// Whether any error was reported
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::*;

    #[test]
    fn test_report_uses_default_severity() {
        let mut diags = Diagnostics::new();
        diags.report(DUPLICATE_IMPORT, Span::new(0, 5, 1, 1), ["p.T"]);
        assert_eq!(diags.problems().len(), 1);
        assert_eq!(diags.problems()[0].severity, Severity::Warning);
        assert!(!diags.has_errors());
    }

    #[test]
    fn test_report_attributes_current_file() {
        let mut diags = Diagnostics::new();
        let previous = diags.set_current_file(Some("A.rw".to_string()));
        assert!(previous.is_none());
        diags.report(UNDEFINED_TYPE, Span::none(), ["Missing"]);
        assert_eq!(diags.problems()[0].file.as_deref(), Some("A.rw"));
        assert_eq!(diags.problems()[0].arguments, vec!["Missing".to_string()]);
    }

    #[test]
    fn test_deprecated_ids_are_not_reported() {
        let mut diags = Diagnostics::new();
        assert!(!diags.report(SUPERTYPE_NOT_RESOLVED, Span::none(), Vec::<String>::new()));
        assert!(diags.problems().is_empty());
    }

    #[test]
    fn test_ignored_ids_are_dropped() {
        let mut config = SeverityConfig::new();
        config.ignore(UNUSED_BASE_IMPORT);
        let mut diags = Diagnostics::with_config(config);
        assert!(!diags.report(UNUSED_BASE_IMPORT, Span::none(), ["p.B"]));
        assert!(diags.problems().is_empty());
    }

    #[test]
    fn test_display() {
        let mut diags = Diagnostics::new();
        diags.report(IMPORT_NOT_FOUND, Span::none(), ["p.Missing"]);
        let text = diags.problems()[0].to_string();
        assert!(text.starts_with("error [268435457] IMPORT_NOT_FOUND"));
        assert!(text.ends_with("p.Missing"));
    }
}
