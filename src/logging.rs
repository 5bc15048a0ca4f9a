use std::error::Error;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;

pub const LOG_FILE: &str = "kombo.log";

/// Route `tracing` output to `<dir>/kombo.log`.
///
/// The terminal belongs to the game, so nothing is written to stdout or
/// stderr. Keep the returned guard alive until exit so buffered lines get
/// flushed. `RUST_LOG` overrides the default `info` filter.
pub fn init(dir: &Path) -> Result<WorkerGuard, Box<dyn Error + Send + Sync>> {
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn init_writes_to_log_file() {
        let dir = tempdir().unwrap();
        let guard = init(dir.path()).unwrap();
        tracing::info!("hello from the log test");
        drop(guard);

        let contents = std::fs::read_to_string(dir.path().join(LOG_FILE)).unwrap();
        assert!(contents.contains("hello from the log test"));
    }
}
