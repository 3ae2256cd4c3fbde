//! Logging setup.
//!
//! Events go to stderr, and also into the run's numbered log file when one is
//! open, so warnings and fatal errors end up next to the report they belong to.

use std::io;
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::tee::LogFile;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `debug` with `verbose`, else `info`.
pub fn init_logging(verbose: bool, log_file: Option<LogFile>) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    subscriber(filter, log_file).init();
}

fn subscriber(
    filter: EnvFilter,
    log_file: Option<LogFile>,
) -> impl Subscriber + Send + Sync + 'static {
    // Console layer
    let console_layer = fmt::layer().with_writer(io::stderr);

    // File layer, plain text so it reads like the rest of the log
    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tee::Tee;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;
    use tracing::{debug, error, info};

    #[test]
    fn test_events_reach_log_file_after_report_text() {
        let dir = tempdir().unwrap();
        let mut tee = Tee::new().with_log_file(dir.path(), "output").unwrap();
        let sub = subscriber(EnvFilter::new("info"), tee.log_file().cloned());

        tracing::subscriber::with_default(sub, || {
            writeln!(tee, "Model           | Matched Key").unwrap();
            info!("Wrote 3 score rows");
            error!("Failed to write results.csv: permission denied");
        });
        let path = tee.log_path().unwrap().to_path_buf();
        drop(tee);

        let logged = fs::read_to_string(&path).unwrap();
        let table = logged.find("Matched Key").unwrap();
        let info_line = logged.find("Wrote 3 score rows").unwrap();
        let error_line = logged.find("Failed to write results.csv: permission denied").unwrap();
        assert!(table < info_line && info_line < error_line);
        assert!(logged.contains("ERROR"));
    }

    #[test]
    fn test_filter_applies_to_log_file() {
        let dir = tempdir().unwrap();
        let log = LogFile::create(dir.path(), "output").unwrap();
        let sub = subscriber(EnvFilter::new("info"), Some(log.clone()));

        tracing::subscriber::with_default(sub, || {
            debug!("hidden detail");
            info!("visible summary");
        });

        let logged = fs::read_to_string(log.path()).unwrap();
        assert!(logged.contains("visible summary"));
        assert!(!logged.contains("hidden detail"));
    }
}
