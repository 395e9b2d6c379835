//! Logging setup
//!
//! The toolkit logs through `tracing`; where the output goes and how
//! much of it there is comes from [`LoggingSettings`] in the tool
//! configuration. An optional log file and an optional stderr echo can
//! be active at the same time, and `RUST_LOG` overrides the configured
//! filter when set.

use std::path::Path;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

// Non-blocking writers stop flushing once their guard drops; the guards
// are parked here for the rest of the process
static GUARDS: OnceLock<Vec<WorkerGuard>> = OnceLock::new();

fn stderr_writer(guards: &mut Vec<WorkerGuard>) -> NonBlocking {
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    guards.push(guard);
    writer
}

fn file_writer(path: &Path, guards: &mut Vec<WorkerGuard>) -> Option<NonBlocking> {
    let dir = path.parent()?;
    let file_name = path.file_name()?.to_str()?;
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    guards.push(guard);
    Some(writer)
}

/// Install the global subscriber from the tool configuration.
///
/// With neither a log file nor the stderr echo configured this still
/// installs the subscriber (so `RUST_LOG` plus a later reconfiguration
/// behave predictably), it just has nowhere to write.
pub fn init_logging(settings: &LoggingSettings) {
    let mut guards = Vec::new();

    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(env) => EnvFilter::new(env),
        Err(_) => EnvFilter::new(&settings.level),
    };

    let file_layer = settings
        .log_path()
        .and_then(|path| file_writer(&path, &mut guards))
        .map(|writer| {
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
        });

    let console_layer = settings.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(stderr_writer(&mut guards))
            .with_ansi(false)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    let _ = GUARDS.set(guards);
}
