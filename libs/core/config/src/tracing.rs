use crate::{env_or_default, ConfigError, Environment};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::LevelFilter, layer::Identity, prelude::*, EnvFilter, Layer, Registry,
};

/// Directory for the production log file
pub const LOG_DIR_VAR: &str = "LOG_DIR";
pub const DEFAULT_LOG_DIR: &str = "logs";

const LOG_FILE_PREFIX: &str = "paperlight";
const LOG_FILE_SUFFIX: &str = "log";
const MAX_LOG_FILES: usize = 10;

pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install color-eyre with a project-standard configuration.
///
/// Call this early in main() before any fallible operations. Safe to call
/// multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Keeps the background log-file writer alive.
///
/// Hold it for the life of the process; dropping it flushes pending lines
/// and stops the writer.
#[derive(Default)]
pub struct TracingGuard {
    file: Option<WorkerGuard>,
}

impl TracingGuard {
    pub fn writes_file(&self) -> bool {
        self.file.is_some()
    }
}

/// Everything [`init_tracing_with`] installs, before installation.
pub struct TracingLayers {
    pub layers: Vec<BoxedLayer>,
    pub guard: TracingGuard,
    /// Set when the production file log was wanted but could not be opened
    pub file_error: Option<ConfigError>,
}

/// Build the layer stack for `environment`.
///
/// - Console: JSON lines in production (default filter `info`), pretty
///   output otherwise (default filter `debug`). `RUST_LOG` overrides the
///   default and applies to the console only.
/// - `extra` sits beside the console with no filter of its own, so
///   `RUST_LOG` cannot silence it.
/// - Production adds a daily-rotated plain-text file under `LOG_DIR`
///   (`INFO` and above, 10 files kept).
pub fn tracing_layers<L>(environment: &Environment, extra: Option<L>) -> TracingLayers
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    let is_production = environment.is_production();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if is_production {
            EnvFilter::new("info")
        } else {
            EnvFilter::new("debug")
        }
    });

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if let Some(extra) = extra {
        layers.push(extra.boxed());
    }

    let console: BoxedLayer = if is_production {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .flatten_event(true)
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .pretty()
            .with_filter(filter)
            .boxed()
    };
    layers.push(console);
    layers.push(tracing_error::ErrorLayer::<Registry>::default().boxed());

    let mut guard = TracingGuard::default();
    let mut file_error = None;

    if is_production {
        match file_layer(&log_dir()) {
            Ok((layer, writer_guard)) => {
                layers.push(layer);
                guard.file = Some(writer_guard);
            }
            Err(err) => file_error = Some(err),
        }
    }

    TracingLayers {
        layers,
        guard,
        file_error,
    }
}

fn log_dir() -> PathBuf {
    PathBuf::from(env_or_default(LOG_DIR_VAR, DEFAULT_LOG_DIR))
}

fn file_layer(dir: &Path) -> Result<(BoxedLayer, WorkerGuard), ConfigError> {
    let invalid = |details: String| ConfigError::Invalid {
        key: LOG_DIR_VAR.to_string(),
        details,
    };

    std::fs::create_dir_all(dir)
        .map_err(|e| invalid(format!("cannot create {}: {}", dir.display(), e)))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .map_err(|e| invalid(format!("cannot open log file in {}: {}", dir.display(), e)))?;

    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(LevelFilter::INFO)
        .boxed();

    Ok((layer, guard))
}

/// Initialize tracing with environment-aware configuration and error span capture.
///
/// See [`tracing_layers`] for what gets installed. Calling this more than
/// once is harmless; later calls are ignored.
pub fn init_tracing(environment: &Environment) -> TracingGuard {
    init_tracing_with::<Identity>(environment, None)
}

/// Same as [`init_tracing`], with an additional layer (used to attach the
/// error-alert layer at startup).
pub fn init_tracing_with<L>(environment: &Environment, extra: Option<L>) -> TracingGuard
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    let has_extra = extra.is_some();
    let TracingLayers {
        layers,
        guard,
        file_error,
    } = tracing_layers(environment, extra);

    match tracing_subscriber::registry().with(layers).try_init() {
        Ok(_) => {
            info!(
                environment = ?environment,
                alerting = has_extra,
                file_log = guard.writes_file(),
                "Tracing initialized"
            );
            if let Some(err) = file_error {
                warn!(error = %err, "File log disabled");
            }
            guard
        }
        Err(_) => {
            debug!("Tracing already initialized, skipping re-initialization");
            TracingGuard::default()
        }
    }
}
