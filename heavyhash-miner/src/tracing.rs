//! Logging setup.
//!
//! `main` installs a subscriber once with [`init_journald_or_stdout`]. Other
//! modules pull the event macros in through `use crate::tracing::prelude::*`.
//!
//! On a terminal each event is one line of
//! ```text
//! 14:02:11 INFO  miner: Found block
//!                hash=e5db..., nonce=9726784189895547883
//! ```
//! with structured fields, if any, on the indented second line.

use std::env;
use std::fmt::{self, Write as _};

use time::OffsetDateTime;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{format::Writer, time::FormatTime, FmtContext, FormatEvent, FormatFields},
    prelude::*,
    registry::LookupSpan,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

use prelude::*;

/// Prefix of event targets inside this crate, elided when printing.
const CRATE_PREFIX: &str = "heavyhash_miner::";

/// Width of the timestamp and level columns, for aligning field lines.
const FIELD_INDENT: usize = 15;

/// Install journald logging under systemd, stdout otherwise.
pub fn init_journald_or_stdout() {
    if env::var("JOURNAL_STREAM").is_err() {
        use_stdout();
        return;
    }

    match tracing_journald::layer() {
        Ok(layer) => tracing_subscriber::registry().with(layer).init(),
        Err(e) => {
            use_stdout();
            error!(error = %e, "Failed to initialize journald logging, using stdout");
        }
    }
}

// INFO unless RUST_LOG says otherwise.
fn use_stdout() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(LocalTimer)
                .event_format(TwoLineFormat),
        )
        .init();
}

/// Message and fields of one event, as display strings.
#[derive(Default)]
struct EventFields {
    message: String,
    fields: Vec<(&'static str, String)>,
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let text = format!("{value:?}");
        if field.name() == "message" {
            self.message = text;
        } else {
            self.fields.push((field.name(), text));
        }
    }
}

impl EventFields {
    /// Target recorded by the `log` bridge, if this event came through it.
    fn log_target(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| *name == "log.target")
            .map(|(_, value)| value.as_str())
    }
}

/// Shorten an event target for display.
///
/// Our own modules lose the crate prefix; events bridged from `log` show
/// their original target; dependencies keep their full path.
fn display_target<'a>(target: &'a str, fields: &'a EventFields) -> &'a str {
    if let Some(stripped) = target.strip_prefix(CRATE_PREFIX) {
        stripped
    } else if target == "log" {
        fields.log_target().unwrap_or(target)
    } else {
        target
    }
}

fn level_style(level: Level) -> (&'static str, &'static str) {
    match level {
        Level::ERROR => ("\x1b[31m", "ERROR"),
        Level::WARN => ("\x1b[33m", "WARN "),
        Level::INFO => ("\x1b[32m", "INFO "),
        Level::DEBUG => ("\x1b[34m", "DEBUG"),
        Level::TRACE => ("\x1b[35m", "TRACE"),
    }
}

struct TwoLineFormat;

impl<S, N> FormatEvent<S, N> for TwoLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = EventFields::default();
        event.record(&mut fields);

        LocalTimer.format_time(&mut writer)?;

        let (color, label) = level_style(*event.metadata().level());
        let target = display_target(event.metadata().target(), &fields);
        write!(writer, " {color}{label}\x1b[0m {target}: {}", fields.message)?;

        let mut extra = String::new();
        for (name, value) in fields.fields.iter().filter(|(n, _)| !n.starts_with("log.")) {
            if !extra.is_empty() {
                extra.push_str(", ");
            }
            write!(extra, "{name}={}", value.trim_matches('"'))?;
        }
        if !extra.is_empty() {
            write!(writer, "\n\x1b[90m{:FIELD_INDENT$}{extra}\x1b[0m", "")?;
        }

        writeln!(writer)
    }
}

/// Local wall-clock time to the second.
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let text = now
            .format(time::macros::format_description!("[hour]:[minute]:[second]"))
            .map_err(|_| fmt::Error)?;
        w.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_target() {
        let empty = EventFields::default();
        assert_eq!(display_target("heavyhash_miner::miner", &empty), "miner");
        assert_eq!(display_target("tokio::net", &empty), "tokio::net");

        let bridged = EventFields {
            message: String::new(),
            fields: vec![("log.target", "mio::poll".to_string())],
        };
        assert_eq!(display_target("log", &bridged), "mio::poll");
        assert_eq!(display_target("log", &empty), "log");
    }
}
