use shapescreen::core::io::table::TableError;
use shapescreen::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] EngineError),

    #[error("Could not process the table: {0}")]
    Table(#[from] TableError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Error in file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Process exit status for this failure. Usage mistakes follow clap's `2`.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Argument(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_errors_exit_with_usage_status() {
        assert_eq!(CliError::Argument("bad".into()).exit_code(), 2);
        assert_eq!(CliError::Config("bad".into()).exit_code(), 1);
        assert_eq!(
            CliError::Core(EngineError::BackendUnavailable("none".into())).exit_code(),
            1
        );
    }
}
