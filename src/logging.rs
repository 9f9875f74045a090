//! Diagnostics for the logger itself.
//!
//! The router reports its own housekeeping (attach/detach, ignored threshold
//! changes, failed writes) through `tracing`. Those events go to stderr so
//! they never interleave with the terminal destination on stdout.

use colored::*;
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// Prefix marking lines emitted by the logger rather than by tests.
const DIAGNOSTIC_PREFIX: &str = "[test-logger]";

/// Colours each diagnostic line by its `tracing` level.
pub struct ColorizedFormatter;

impl<S, N> FormatEvent<S, N> for ColorizedFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut buffer = String::new();
        let mut buf_writer = Writer::new(&mut buffer);
        ctx.format_fields(buf_writer.by_ref(), event)?;

        let line = format!(
            "{} {:<5} {}",
            DIAGNOSTIC_PREFIX,
            event.metadata().level(),
            buffer
        );
        let colored_output = match *event.metadata().level() {
            Level::ERROR => line.red(),
            Level::WARN => line.yellow(),
            Level::INFO => line.normal(),
            Level::DEBUG => line.cyan(),
            Level::TRACE => line.dimmed(),
        };

        writeln!(writer, "{}", colored_output)
    }
}

/// Install the diagnostics subscriber.
///
/// `RUST_LOG` overrides `default_directive` (e.g. `"test_logger=warn"`).
/// Returns `false` when a global subscriber was already installed.
pub fn init_diagnostics(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .event_format(ColorizedFormatter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_diagnostics_is_idempotent() {
        let _ = init_diagnostics("test_logger=debug");
        assert!(!init_diagnostics("test_logger=debug"));
    }
}
