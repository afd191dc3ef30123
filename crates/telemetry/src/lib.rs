use color_eyre::config::HookBuilder;
use tracing::{error, info_span};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, MakeWriter, writer::BoxMakeWriter},
    prelude::*,
    util::TryInitError,
};

#[derive(Default)]
pub struct TelemetryConfig {
    console_writer: Option<BoxMakeWriter>,
    file_writer: Option<BoxMakeWriter>,
}

impl TelemetryConfig {
    /// Compact, coloured output for a terminal.
    pub fn with_console_writer<W>(mut self, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        self.console_writer = Some(BoxMakeWriter::new(writer));
        self
    }

    /// Verbose output without colours, for log files.
    pub fn with_file_writer<W>(mut self, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        self.file_writer = Some(BoxMakeWriter::new(writer));
        self
    }
}

#[must_use]
pub struct TelemetryGuard {
    _private: (),
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!("telemetry shutting down");
    }
}

/// Installs the global subscriber. Filters come from `RUST_LOG`, defaulting to `info`.
pub fn install(config: TelemetryConfig) -> Result<TelemetryGuard, TryInitError> {
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(filter_layer)
        .with(config.file_writer.map(|file_writer| {
            fmt::layer()
                .pretty()
                .with_ansi(false)
                .without_time()
                .with_writer(file_writer)
        }))
        .with(config.console_writer.map(|writer| {
            fmt::layer()
                .compact()
                .with_ansi(true)
                .without_time()
                .with_target(false)
                .with_writer(writer)
        }))
        .try_init()?;

    Ok(TelemetryGuard { _private: () })
}

/// Installs `color-eyre`'s report and panic hooks.
///
/// Without `full_tracebacks` reports stay short: no span traces unless asked for through the
/// environment, and no hints about how to ask for them.
pub fn install_error_handler(full_tracebacks: bool) {
    let _ = HookBuilder::default()
        .issue_url(concat!(env!("CARGO_PKG_REPOSITORY"), "/issues/new"))
        .add_issue_metadata("version", env!("CARGO_PKG_VERSION"))
        .capture_span_trace_by_default(full_tracebacks)
        .display_env_section(full_tracebacks)
        .install();
}

/// Runs `f` inside a root span, logging the error if it fails.
pub fn with_root_span<T, F>(name: &str, operation: &str, f: F) -> color_eyre::Result<T>
where
    F: FnOnce() -> color_eyre::Result<T>,
{
    let span = info_span!("root", program = name);
    let _entered = span.enter();

    let result = f();
    if let Err(e) = &result {
        error!(error = ?e, "failed to {operation}");
    }

    result
}
