use shapescreen::core::io::table::TableOptions;
use shapescreen::engine::config::{DatabaseOptions, ScreeningConfig};
use shapescreen::workflows::screen::OutputColumns;
use std::path::PathBuf;

/// Fully resolved settings of one screening run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub dump_conformers: Option<PathBuf>,
    pub screening: ScreeningConfig,
    pub database: DatabaseOptions,
    pub table: TableOptions,
    pub columns: OutputColumns,
}
