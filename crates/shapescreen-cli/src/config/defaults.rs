use shapescreen::core::io::table::TableOptions;
use shapescreen::engine::config::ScreeningConfig;
use shapescreen::workflows::screen::OutputColumns;

/// Values used when neither a flag, `--set`, nor the config file gives one.
pub struct DefaultsConfig {
    pub enumerate_isomers: bool,
    pub max_isomers: usize,
    pub max_stereo_centers: usize,
    pub force_flip: bool,
    pub embed_attempts: usize,
    pub random_seed: u64,
    pub top_hits: usize,
    pub color: bool,
    pub optimize_overlay: bool,
    pub smiles_column: String,
    pub score_column: String,
    pub status_column: String,
    pub missing_marker: String,
    pub delimiter: u8,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        let screening = ScreeningConfig::default();
        let table = TableOptions::default();
        let columns = OutputColumns::default();
        Self {
            enumerate_isomers: screening.enumerate_isomers,
            max_isomers: screening.max_isomers.unwrap_or(0),
            max_stereo_centers: screening.generator.max_stereo_centers,
            force_flip: screening.generator.force_flip,
            embed_attempts: screening.generator.embed_attempts,
            random_seed: screening.generator.random_seed,
            top_hits: screening.top_hits,
            color: screening.scoring.color,
            optimize_overlay: screening.scoring.optimize_overlay,
            smiles_column: table.identifier_column,
            status_column: format!("{}_status", columns.score_column),
            score_column: columns.score_column,
            missing_marker: columns.missing_marker,
            delimiter: table.delimiter,
        }
    }
}
