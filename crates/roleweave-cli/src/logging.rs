//! Tracing subscriber setup
//!
//! `ROLEWEAVE_LOG` holds an `EnvFilter` directive (default `warn`).
//! `ROLEWEAVE_LOG_STYLE` is `compact` (default) or `full`, which adds
//! timestamps, targets and span open/close events.

use std::io::IsTerminal;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "ROLEWEAVE_LOG";
const STYLE_ENV: &str = "ROLEWEAVE_LOG_STYLE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Compact,
    Full,
}

impl Style {
    fn parse(value: Option<&str>) -> Style {
        match value {
            Some("full") => Style::Full,
            _ => Style::Compact,
        }
    }
}

/// Install the global subscriber, writing to stderr
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let ansi = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(ansi);

    // an already installed subscriber stays in place
    let _ = match Style::parse(std::env::var(STYLE_ENV).ok().as_deref()) {
        Style::Full => builder
            .with_target(true)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .try_init(),
        Style::Compact => builder.with_target(false).without_time().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_defaults_to_compact() {
        assert_eq!(Style::parse(Some("full")), Style::Full);
        assert_eq!(Style::parse(Some("compact")), Style::Compact);
        assert_eq!(Style::parse(Some("loud")), Style::Compact);
        assert_eq!(Style::parse(None), Style::Compact);
    }
}
