//! Structured logging: console always, rolling daily files when a log
//! directory is given.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise defaults to
/// `info` with debug for this crate. Returns the appender guard when
/// file logging is enabled; the caller keeps it alive for the life of
/// the process, since dropping it flushes and stops the writer.
///
/// Errors if a global subscriber is already installed.
pub fn init(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,senthoor_pos=debug"));

    let console_layer = fmt::layer().with_target(true);
    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::daily(dir, "pos");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true);
            registry.with(file_layer).try_init()?;
            Ok(Some(guard))
        }
        None => {
            registry.try_init()?;
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    // These touch the process-global subscriber, so they must not run in
    // parallel with each other.
    #[test]
    #[serial]
    fn init_installs_a_subscriber_once() {
        let first = init(None);
        assert!(first.is_ok());
        // Second init must fail rather than silently replace the
        // subscriber.
        assert!(init(None).is_err());
    }

    #[test]
    #[serial]
    fn later_file_logging_creates_the_log_directory() {
        let dir = std::env::temp_dir().join(format!("pos-logs-{}", uuid::Uuid::new_v4()));
        // A subscriber may already be installed by the other test; the
        // directory side effect happens first either way.
        let _ = init(Some(&dir));
        assert!(dir.is_dir());
        let _ = fs::remove_dir_all(&dir);
    }
}
