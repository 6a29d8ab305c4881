use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConformersConfig {
    pub enumerate_isomers: Option<bool>,
    pub max_isomers: Option<usize>,
    pub max_stereo_centers: Option<usize>,
    pub force_flip: Option<bool>,
    pub embed_attempts: Option<usize>,
    pub random_seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileScoringConfig {
    pub top_hits: Option<usize>,
    pub color: Option<bool>,
    pub optimize_overlay: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileTableConfig {
    pub smiles_column: Option<String>,
    pub score_column: Option<String>,
    pub status_column: Option<String>,
    pub missing_marker: Option<String>,
    pub delimiter: Option<String>,
}

/// The TOML configuration file; every key is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub conformers: Option<FileConformersConfig>,
    pub scoring: Option<FileScoringConfig>,
    pub table: Option<FileTableConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_all_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("screen.toml");
        fs::write(
            &path,
            r#"
            [conformers]
            enumerate-isomers = false
            max-isomers = 0
            random-seed = 7

            [scoring]
            top-hits = 5
            color = false

            [table]
            smiles-column = "SMILES"
            missing-marker = "NA"
            delimiter = "tab"
            "#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        let conformers = config.conformers.unwrap();
        assert_eq!(conformers.enumerate_isomers, Some(false));
        assert_eq!(conformers.max_isomers, Some(0));
        assert_eq!(conformers.random_seed, Some(7));
        assert_eq!(conformers.force_flip, None);
        assert_eq!(config.scoring.unwrap().top_hits, Some(5));
        let table = config.table.unwrap();
        assert_eq!(table.smiles_column.as_deref(), Some("SMILES"));
        assert_eq!(table.delimiter.as_deref(), Some("tab"));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        fs::write(&path, "").unwrap();
        assert_eq!(FileConfig::from_file(&path).unwrap(), FileConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("typo.toml");
        fs::write(&path, "[scoring]\ntop-hit = 3\n").unwrap();
        assert!(matches!(
            FileConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            FileConfig::from_file(&dir.path().join("absent.toml")),
            Err(CliError::Io(_))
        ));
    }
}
