#![forbid(unsafe_code)]

//! Subscriber installation for host applications.
//!
//! The engine only emits `tracing` events and spans; it never installs a
//! subscriber itself. Hosts that do not have their own logging setup can
//! call [`init_logging`] once at startup.
//!
//! # Levels
//!
//! - `warn`: input rejected by a field (value kept)
//! - `debug`: commits, undo recording and vetoes, replays, history clears
//! - `trace`: no-op populates, skipped unknown identities, suppressed
//!   notifications
//!
//! Notification fan-out runs inside a `styleform.notify` span carrying the
//! `field` and `listeners` count.
//!
//! ```ignore
//! use styleform_runtime::logging::{init_logging, LogConfig, LogFormat};
//!
//! init_logging(&LogConfig::new("styleform_runtime=debug").with_format(LogFormat::Json))?;
//! ```

use std::error::Error;
use std::io;

use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub type InitResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    /// One JSON object per line.
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` directives, e.g. `"styleform_runtime=debug,warn"`.
    pub filter: String,
    pub format: LogFormat,
    pub with_target: bool,
    /// Emit an event when a span (e.g. `styleform.notify`) closes.
    pub with_span_events: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

impl LogConfig {
    #[must_use]
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            format: LogFormat::default(),
            with_target: true,
            with_span_events: false,
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_target(mut self, enable: bool) -> Self {
        self.with_target = enable;
        self
    }

    #[must_use]
    pub fn with_span_events(mut self, enable: bool) -> Self {
        self.with_span_events = enable;
        self
    }

    /// Parse [`Self::filter`].
    pub fn env_filter(&self) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
        EnvFilter::try_new(&self.filter)
    }

    fn span_events(&self) -> fmt::format::FmtSpan {
        if self.with_span_events {
            fmt::format::FmtSpan::CLOSE
        } else {
            fmt::format::FmtSpan::NONE
        }
    }
}

/// Install a global subscriber writing to stderr.
///
/// Fails on a bad filter or if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> InitResult {
    init_logging_with_writer(config, io::stderr)
}

/// Install a global subscriber writing to `writer`.
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W) -> InitResult
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = config.env_filter()?;
    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(config.with_target)
                    .with_span_events(config.span_events()),
            )
            .try_init()?,
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(writer)
                    .with_target(config.with_target)
                    .with_span_events(config.span_events()),
            )
            .try_init()?,
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_target(config.with_target)
                    .with_span_events(config.span_events()),
            )
            .try_init()?,
    }
    Ok(())
}

/// Shorthand for JSON output to stderr.
pub fn init_json(filter: &str) -> InitResult {
    init_logging(&LogConfig::new(filter).with_format(LogFormat::Json))
}

/// Shorthand for human-readable output to stderr.
pub fn init_pretty(filter: &str) -> InitResult {
    init_logging(&LogConfig::new(filter))
}
