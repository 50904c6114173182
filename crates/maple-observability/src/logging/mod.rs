//! Structured logging
//!
//! Builds a `tracing` subscriber from [`LoggingConfig`]: a reloadable
//! `EnvFilter`, then stdout and/or file output in plain or JSON format.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    layer::{Layered, SubscriberExt},
    reload::{self, Handle},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::LoggingConfig;
use crate::error::{ObservabilityError, Result};

type ReloadHandle = Handle<EnvFilter, Registry>;
type Filtered = Layered<reload::Layer<EnvFilter, Registry>, Registry>;
type BoxedLayer = Box<dyn Layer<Filtered> + Send + Sync + 'static>;

/// Owns the installed subscriber's reload handle and file writer
#[derive(Debug)]
pub struct LogManager {
    config: LoggingConfig,
    reload_handle: ReloadHandle,
    /// Flushes the file writer when dropped
    _guard: Option<WorkerGuard>,
}

impl LogManager {
    /// Install the global subscriber
    ///
    /// Fails if a global subscriber is already set.
    pub fn new(config: &LoggingConfig) -> Result<Self> {
        let filter = build_filter(config)?;
        let (filter, reload_handle) = reload::Layer::new(filter);

        let mut layers: Vec<BoxedLayer> = Vec::new();
        if config.stdout {
            layers.push(stdout_layer(config));
        }

        let guard = match &config.file_path {
            Some(path) => {
                let (layer, guard) = file_layer(config, path)?;
                layers.push(layer);
                Some(guard)
            }
            None => None,
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(layers)
            .try_init()
            .map_err(|e| ObservabilityError::logging(format!("Failed to install subscriber: {}", e)))?;

        tracing::info!(
            target: "maple_observability",
            "Log manager initialized with level: {}",
            config.level
        );

        Ok(Self {
            config: config.clone(),
            reload_handle,
            _guard: guard,
        })
    }

    /// Replace the filter with a new level or filter expression
    pub fn update_level(&mut self, level: &str) -> Result<()> {
        let mut next = self.config.clone();
        next.level = level.to_string();
        let new_filter = build_filter(&next)?;

        self.reload_handle
            .modify(|filter| *filter = new_filter)
            .map_err(|e| ObservabilityError::logging(format!("Failed to update log level: {}", e)))?;
        self.config = next;

        tracing::info!(
            target: "maple_observability",
            "Log level updated to: {}",
            level
        );
        Ok(())
    }

    /// Current configuration
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }
}

/// Filter from the base level plus module overrides
pub(crate) fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| ObservabilityError::config(format!("Invalid log level: {}", e)))?;

    for (module, level) in &config.module_levels {
        filter = filter.add_directive(
            format!("{}={}", module, level)
                .parse()
                .map_err(|e| ObservabilityError::config(format!("Invalid directive: {}", e)))?,
        );
    }

    Ok(filter)
}

fn stdout_layer(config: &LoggingConfig) -> BoxedLayer {
    let layer = tracing_subscriber::fmt::layer()
        .with_target(config.include_target)
        .with_line_number(config.include_line_number)
        .with_ansi(config.ansi_colors);

    if config.json_format {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

fn file_layer(config: &LoggingConfig, path: &Path) -> Result<(BoxedLayer, WorkerGuard)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| ObservabilityError::config(format!("Invalid log file path: {:?}", path)))?;

    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(config.include_target)
        .with_line_number(config.include_line_number)
        .with_ansi(false);

    let layer = if config.json_format {
        layer.json().boxed()
    } else {
        layer.boxed()
    };
    Ok((layer, guard))
}

/// Span for work on one conversation
pub fn conversation_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("conversation", session_id = %session_id)
}

/// Span for work on one transport connection
pub fn connection_span(handle: impl std::fmt::Display) -> tracing::Span {
    tracing::info_span!("connection", handle = %handle)
}
