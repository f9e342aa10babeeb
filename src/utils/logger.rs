use crate::utils::error::{ImportError, Result};
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Keeps the non-blocking file writer alive; drop it last so buffered lines
/// are flushed.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Default directives for both binaries' targets.
fn default_directives(debug: bool) -> &'static str {
    if debug {
        "csvimport=debug,csvtransform=debug,info"
    } else {
        "csvimport=info,csvtransform=info"
    }
}

fn filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(debug)))
}

/// Plain-text layer that passes warnings and errors only.
pub fn warnings_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .with_writer(writer)
        .with_filter(LevelFilter::WARN)
}

/// Sets up the global subscriber for `csvimport`: the log file (when given)
/// always receives records, stdout only with `debug`.
pub fn init_cli_logger(debug: bool, log_file: Option<&Path>) -> Result<LoggingGuard> {
    let mut layers = Vec::new();

    if debug {
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_filter(filter(debug))
                .boxed(),
        );
    }

    let file_guard = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path.file_name().ok_or_else(|| {
                ImportError::configuration(format!("invalid log file path '{}'", path.display()))
            })?;
            std::fs::create_dir_all(dir).map_err(|e| {
                ImportError::configuration(format!(
                    "Failed to create log directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(writer)
                    .with_filter(filter(debug))
                    .boxed(),
            );
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry().with(layers).init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Subscriber for `csvtransform`: compact stdout output with `verbose`,
/// otherwise warnings and errors on stderr.
pub fn init_tool_logger(verbose: bool) {
    let layer = if verbose {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .compact()
            .with_filter(filter(true))
            .boxed()
    } else {
        warnings_layer(std::io::stderr).boxed()
    };
    tracing_subscriber::registry().with(layer).init();
}
