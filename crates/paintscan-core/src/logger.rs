//! Stderr logger for scan sessions.
//!
//! Lines read `[elapsed LEVEL module] message`, where `module` is the last
//! segment of the record target (`capture`, `lifecycle`, `rectify`, ...).
//! The lifecycle controller and the session log on every tracking update, so
//! [`LogFilter`] gives those targets their own `frame_level`: a debug run of
//! the capture path does not have to print one line per camera frame.

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

/// Targets that log once per tracking update.
pub const FRAME_RATE_TARGETS: [&str; 2] = ["paintscan::lifecycle", "paintscan::session"];

/// Level limits for the stderr logger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogFilter {
    /// Limit for everything except [`FRAME_RATE_TARGETS`].
    pub level: LevelFilter,
    /// Limit for [`FRAME_RATE_TARGETS`].
    pub frame_level: LevelFilter,
}

impl LogFilter {
    pub const fn new(level: LevelFilter) -> Self {
        Self {
            level,
            frame_level: level,
        }
    }

    pub const fn with_frame_level(mut self, frame_level: LevelFilter) -> Self {
        self.frame_level = frame_level;
        self
    }

    pub fn allows(&self, target: &str, level: Level) -> bool {
        let limit = if is_frame_rate(target) {
            self.frame_level
        } else {
            self.level
        };
        level <= limit
    }

    fn max_level(&self) -> LevelFilter {
        self.level.max(self.frame_level)
    }
}

fn is_frame_rate(target: &str) -> bool {
    FRAME_RATE_TARGETS.iter().any(|t| target.starts_with(t))
}

fn module_tag(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

fn format_line(elapsed: f64, level: Level, target: &str, args: &fmt::Arguments<'_>) -> String {
    format!("[{elapsed:8.3}s {level:>5} {}] {args}", module_tag(target))
}

struct ScanLogger {
    filter: LogFilter,
    started: Instant,
}

impl Log for ScanLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.filter.allows(metadata.target(), metadata.level())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args(),
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<ScanLogger> = OnceLock::new();

/// Install the stderr logger with `filter`.
///
/// Only the first call installs anything; later calls return `Ok(())` and
/// keep the original filter.
pub fn init_logger(filter: LogFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| ScanLogger {
            filter,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(filter.max_level());
    }
    Ok(())
}

/// [`init_logger`] with one level for every target.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    init_logger(LogFilter::new(level))
}

/// Filter used by [`init_tracing`] when `RUST_LOG` is unset: `info`, with the
/// per-frame targets held at `warn`.
#[cfg(feature = "tracing")]
pub const DEFAULT_TRACING_FILTER: &str = "info,paintscan::lifecycle=warn,paintscan::session=warn";

/// Install a `tracing` subscriber; `RUST_LOG` overrides [`DEFAULT_TRACING_FILTER`].
///
/// Span close events carry the rectify timings recorded by `instrument`.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_TRACING_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE);
    let _ = if json {
        builder.json().flatten_event(true).finish().try_init()
    } else {
        builder
            .with_timer(tracing_subscriber::fmt::time::Uptime::default())
            .finish()
            .try_init()
    };
}
