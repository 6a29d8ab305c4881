use crate::error::{CliError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{
    EnvFilter,
    filter::LevelFilter,
    fmt::{
        self,
        format::{DefaultFields, Format},
    },
    prelude::*,
};

type FileLayer<S> = fmt::Layer<S, DefaultFields, Format, Mutex<File>>;

/// Installs the global subscriber.
///
/// The level comes from `-v`/`-q`; `RUST_LOG` directives refine it unless
/// `quiet` is set. Logs go to stderr, and additionally to `log_file` as plain
/// text with thread ids.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("off")
    } else {
        EnvFilter::builder()
            .with_default_directive(level_for(verbosity).into())
            .from_env_lossy()
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();
    let file_layer = match log_file {
        Some(path) => Some(file_layer(&path)?),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn file_layer<S>(path: &Path) -> Result<FileLayer<S>> {
    let file = File::create(path)?;
    Ok(fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_ids(true)
        .with_target(true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tracing::{debug, info, warn};

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0), LevelFilter::WARN);
        assert_eq!(level_for(1), LevelFilter::INFO);
        assert_eq!(level_for(2), LevelFilter::DEBUG);
        assert_eq!(level_for(9), LevelFilter::TRACE);
    }

    #[test]
    #[serial]
    fn file_layer_records_structured_fields_and_threads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen.log");

        let subscriber = tracing_subscriber::registry().with(file_layer(&path).unwrap());
        tracing::subscriber::with_default(subscriber, || {
            debug!(row = 4, smiles = "CCO", "Row scored");
            warn!(row = 5, "Invalid SMILES");
        });

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Row scored"));
        assert!(content.contains("row=4"));
        assert!(content.contains("smiles=\"CCO\""));
        assert!(content.contains("WARN"));
        assert!(content.contains("ThreadId"));
        assert!(!content.contains('\u{1b}'));
    }

    #[test]
    #[serial]
    fn global_logger_installs_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("global.log");

        setup_logging(1, false, Some(path.clone())).unwrap();
        info!(rows = 2, "Global logger ready");

        assert!(matches!(setup_logging(0, false, None), Err(CliError::Other(_))));
        assert!(std::fs::read_to_string(&path).unwrap().contains("Global logger ready"));
    }

    #[test]
    #[serial]
    fn unwritable_log_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = setup_logging(0, false, Some(dir.path().to_path_buf()));
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
