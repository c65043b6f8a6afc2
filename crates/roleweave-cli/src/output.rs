//! Colored summary output
//!
//! Uses `termcolor`; respects `NO_COLOR` and the `--color` flag.

use std::io::Write;

use roleweave_diagnostics::{Problem, Severity};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Resolve `ColorChoice` from the CLI flag and environment.
///
/// Priority: `NO_COLOR` env > `--color` flag > auto-detect TTY.
pub fn resolve_color_choice(flag: Option<&str>) -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_some() {
        return ColorChoice::Never;
    }
    match flag {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}

/// Problem counts by severity
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl Tally {
    pub fn of(problems: &[Problem]) -> Self {
        let mut tally = Tally::default();
        for problem in problems {
            match problem.severity {
                Severity::Error => tally.errors += 1,
                Severity::Warning => tally.warnings += 1,
                Severity::Info => tally.infos += 1,
            }
        }
        tally
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

/// Styled writer for stderr summaries
pub struct StyledOutput {
    stderr: StandardStream,
}

impl StyledOutput {
    pub fn new(choice: ColorChoice) -> Self {
        Self {
            stderr: StandardStream::stderr(choice),
        }
    }

    fn write_styled(&mut self, text: &str, color: Option<Color>, bold: bool) {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_bold(bold);
        let _ = self.stderr.set_color(&spec);
        let _ = write!(self.stderr, "{}", text);
        let _ = self.stderr.reset();
    }

    /// One-line result of a check: `ok` or the counts per severity
    pub fn summary(&mut self, units: usize, tally: Tally) {
        if tally.errors == 0 {
            self.write_styled("ok", Some(Color::Green), true);
        } else {
            self.write_styled("failed", Some(Color::Red), true);
        }
        let _ = write!(self.stderr, ": {} checked", plural(units, "unit"));
        if tally.errors > 0 {
            let _ = write!(self.stderr, ", ");
            self.write_styled(&plural(tally.errors, "error"), Some(Color::Red), false);
        }
        if tally.warnings > 0 {
            let _ = write!(self.stderr, ", ");
            self.write_styled(&plural(tally.warnings, "warning"), Some(Color::Yellow), false);
        }
        if tally.infos > 0 {
            let _ = write!(self.stderr, ", {}", plural(tally.infos, "note"));
        }
        let _ = writeln!(self.stderr);
        let _ = self.stderr.flush();
    }
}
