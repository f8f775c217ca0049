#![forbid(unsafe_code)]

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Diagnostics go to a daily-rolling file under the data directory; the
/// alternate screen owns stdout/stderr while the TUI runs. Keep the
/// returned guard alive for the life of the process.
pub fn init(log_dir: &Path) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!(
            "warn: could not create log directory '{}': {e} — diagnostics disabled",
            log_dir.display()
        );
        return None;
    }

    let appender = tracing_appender::rolling::daily(log_dir, "focuswork.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let initialized = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .compact()
        .try_init()
        .is_ok();

    // Already-initialized (second init in-process) keeps the first sink.
    initialized.then_some(guard)
}
