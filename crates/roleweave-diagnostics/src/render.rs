//! Rendering problems for terminals and tools
//!
//! Terminal output goes through `codespan-reporting`; the code of each
//! rendered diagnostic is the numeric problem id and the message is the
//! symbolic name followed by the arguments. Tools get JSON instead.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, Severity as CsSeverity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::problem::{Problem, Severity};

/// Source texts known to the renderer, keyed by unit file name
pub struct SourceFiles {
    files: SimpleFiles<String, String>,
    ids: FxHashMap<String, usize>,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceFiles {
    /// Create an empty set
    pub fn new() -> Self {
        SourceFiles {
            files: SimpleFiles::new(),
            ids: FxHashMap::default(),
        }
    }

    /// Register a unit's source text
    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        let name = name.into();
        let id = self.files.add(name.clone(), source.into());
        self.ids.insert(name, id);
        id
    }

    /// File id of a registered unit
    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    /// Underlying codespan file database
    pub fn files(&self) -> &SimpleFiles<String, String> {
        &self.files
    }
}

fn to_cs_severity(severity: Severity) -> CsSeverity {
    match severity {
        Severity::Error => CsSeverity::Error,
        Severity::Warning => CsSeverity::Warning,
        Severity::Info => CsSeverity::Note,
    }
}

/// Convert a problem into a codespan diagnostic
///
/// A label is attached only when the problem's unit has registered source.
pub fn to_codespan(problem: &Problem, sources: &SourceFiles) -> CsDiagnostic<usize> {
    let mut message = problem.id.name().to_string();
    if !problem.arguments.is_empty() {
        message.push_str(": ");
        message.push_str(&problem.arguments.join(", "));
    }
    let mut diag = CsDiagnostic::new(to_cs_severity(problem.severity))
        .with_code(problem.id.to_string())
        .with_message(message);

    let file_id = problem.file.as_deref().and_then(|name| sources.id_of(name));
    match file_id {
        Some(file_id) if !problem.span.is_empty() => {
            let range = problem.span.start as usize..problem.span.end as usize;
            diag = diag.with_labels(vec![Label::primary(file_id, range)]);
        }
        _ => {
            if let Some(file) = &problem.file {
                diag = diag.with_notes(vec![format!("in {}", file)]);
            }
        }
    }
    diag
}

/// Emit problems to stderr
pub fn emit(
    problems: &[Problem],
    sources: &SourceFiles,
    color: ColorChoice,
) -> Result<(), codespan_reporting::files::Error> {
    let mut writer = StandardStream::stderr(color);
    let config = term::Config::default();
    for problem in problems {
        term::emit(&mut writer, &config, sources.files(), &to_codespan(problem, sources))?;
    }
    Ok(())
}

/// JSON representation of a problem for tools
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonProblem {
    /// Numeric id, the durable marker of the problem's nature
    pub id: u32,
    /// Symbolic name
    pub name: String,
    /// Severity
    pub severity: Severity,
    /// Unit file name
    pub file: Option<String>,
    /// Start offset
    pub start: u32,
    /// End offset
    pub end: u32,
    /// Start line
    pub line: u32,
    /// Start column
    pub column: u32,
    /// Message arguments
    pub arguments: Vec<String>,
}

impl From<&Problem> for JsonProblem {
    fn from(problem: &Problem) -> Self {
        JsonProblem {
            id: problem.id.value(),
            name: problem.id.name().to_string(),
            severity: problem.severity,
            file: problem.file.clone(),
            start: problem.span.start,
            end: problem.span.end,
            line: problem.span.line,
            column: problem.span.column,
            arguments: problem.arguments.clone(),
        }
    }
}

/// Serialize problems as a pretty JSON array
pub fn to_json(problems: &[Problem]) -> Result<String, serde_json::Error> {
    let json: Vec<JsonProblem> = problems.iter().map(JsonProblem::from).collect();
    serde_json::to_string_pretty(&json)
}
