//! Roleweave diagnostics
//!
//! The numeric problem taxonomy shared by every roleweave crate, the sink
//! that collects reported problems, severity configuration, and rendering
//! through `codespan-reporting` or JSON.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod id;
pub mod problem;
pub mod render;

pub use config::{ConfigError, SeverityConfig, SeverityLevel};
pub use id::{Category, ProblemId, ProblemInfo, PROBLEMS};
pub use problem::{Diagnostics, Problem, Severity, Span};
pub use render::{emit, to_codespan, to_json, JsonProblem, SourceFiles};
