use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::AppConfig;
use crate::cli::ScreenArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use shapescreen::core::io::table::TableOptions;
use shapescreen::engine::config::{DatabaseOptions, ScreeningConfigBuilder};
use shapescreen::engine::error::EngineError;
use shapescreen::workflows::screen::OutputColumns;
use std::str::FromStr;

pub fn build_config(args: &ScreenArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let conformers_file = file_config.conformers.take().unwrap_or_default();
    let scoring_file = file_config.scoring.take().unwrap_or_default();
    let table_file = file_config.table.take().unwrap_or_default();

    let enumerate_isomers = match (
        args.isomers.enumerate_isomers,
        args.isomers.no_enumerate_isomers,
    ) {
        (true, false) => true,
        (false, true) => false,
        _ => conformers_file
            .enumerate_isomers
            .unwrap_or(defaults.enumerate_isomers),
    };
    let color = if args.no_color {
        false
    } else {
        scoring_file.color.unwrap_or(defaults.color)
    };

    let screening = ScreeningConfigBuilder::new()
        .enumerate_isomers(enumerate_isomers)
        .max_isomers(
            args.max_isomers
                .or(conformers_file.max_isomers)
                .unwrap_or(defaults.max_isomers),
        )
        .max_stereo_centers(
            conformers_file
                .max_stereo_centers
                .unwrap_or(defaults.max_stereo_centers),
        )
        .force_flip(conformers_file.force_flip.unwrap_or(defaults.force_flip))
        .embed_attempts(
            conformers_file
                .embed_attempts
                .unwrap_or(defaults.embed_attempts),
        )
        .random_seed(
            args.seed
                .or(conformers_file.random_seed)
                .unwrap_or(defaults.random_seed),
        )
        .top_hits(
            args.top_hits
                .or(scoring_file.top_hits)
                .unwrap_or(defaults.top_hits),
        )
        .color(color)
        .optimize_overlay(
            scoring_file
                .optimize_overlay
                .unwrap_or(defaults.optimize_overlay),
        )
        .build()
        .map_err(EngineError::from)?;

    let delimiter = match args.delimiter.as_deref().or(table_file.delimiter.as_deref()) {
        Some(value) => {
            parser::parse_delimiter(value).map_err(|e| CliError::Config(e.to_string()))?
        }
        None => defaults.delimiter,
    };
    let table = TableOptions {
        delimiter,
        identifier_column: args
            .smiles_column
            .clone()
            .or(table_file.smiles_column)
            .unwrap_or(defaults.smiles_column),
    };

    let status_column = if args.status_column || table_file.status_column.is_some() {
        Some(table_file.status_column.unwrap_or(defaults.status_column))
    } else {
        None
    };
    let columns = OutputColumns {
        score_column: args
            .score_column
            .clone()
            .or(table_file.score_column)
            .unwrap_or(defaults.score_column),
        status_column,
        missing_marker: table_file.missing_marker.unwrap_or(defaults.missing_marker),
    };
    validate_columns(&table, &columns)?;

    let database = DatabaseOptions {
        shape: screening.scoring.shape,
        generator: screening.generator.clone(),
    };

    Ok(AppConfig {
        database_path: args.database.clone(),
        input_path: args.input.clone(),
        output_path: args.output.clone(),
        dump_conformers: args.dump_conformers.clone(),
        screening,
        database,
        table,
        columns,
    })
}

fn validate_columns(table: &TableOptions, columns: &OutputColumns) -> Result<()> {
    let mut names = vec![
        ("smiles column", table.identifier_column.as_str()),
        ("score column", columns.score_column.as_str()),
    ];
    if let Some(status) = &columns.status_column {
        names.push(("status column", status.as_str()));
    }

    for (i, (label, name)) in names.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(CliError::Config(format!("The {} name cannot be empty.", label)));
        }
        if let Some((other, _)) = names[..i].iter().find(|(_, n)| n == name) {
            return Err(CliError::Config(format!(
                "The {} and the {} are both named '{}'.",
                other, label, name
            )));
        }
    }
    Ok(())
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value))
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let (key, value_str) =
            parser::parse_key_value(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

        match key {
            "conformers.enumerate-isomers" => {
                config
                    .conformers
                    .get_or_insert_with(Default::default)
                    .enumerate_isomers = Some(parse_value(key, value_str, "boolean")?);
            }
            "conformers.max-isomers" => {
                config
                    .conformers
                    .get_or_insert_with(Default::default)
                    .max_isomers = Some(parse_value(key, value_str, "integer")?);
            }
            "conformers.max-stereo-centers" => {
                config
                    .conformers
                    .get_or_insert_with(Default::default)
                    .max_stereo_centers = Some(parse_value(key, value_str, "integer")?);
            }
            "conformers.force-flip" => {
                config
                    .conformers
                    .get_or_insert_with(Default::default)
                    .force_flip = Some(parse_value(key, value_str, "boolean")?);
            }
            "conformers.embed-attempts" => {
                config
                    .conformers
                    .get_or_insert_with(Default::default)
                    .embed_attempts = Some(parse_value(key, value_str, "integer")?);
            }
            "conformers.random-seed" => {
                config
                    .conformers
                    .get_or_insert_with(Default::default)
                    .random_seed = Some(parse_value(key, value_str, "integer")?);
            }
            "scoring.top-hits" => {
                config
                    .scoring
                    .get_or_insert_with(Default::default)
                    .top_hits = Some(parse_value(key, value_str, "integer")?);
            }
            "scoring.color" => {
                config.scoring.get_or_insert_with(Default::default).color =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "scoring.optimize-overlay" => {
                config
                    .scoring
                    .get_or_insert_with(Default::default)
                    .optimize_overlay = Some(parse_value(key, value_str, "boolean")?);
            }
            "table.smiles-column" => {
                config
                    .table
                    .get_or_insert_with(Default::default)
                    .smiles_column = Some(value_str.to_string());
            }
            "table.score-column" => {
                config
                    .table
                    .get_or_insert_with(Default::default)
                    .score_column = Some(value_str.to_string());
            }
            "table.status-column" => {
                config
                    .table
                    .get_or_insert_with(Default::default)
                    .status_column = Some(value_str.to_string());
            }
            "table.missing-marker" => {
                config
                    .table
                    .get_or_insert_with(Default::default)
                    .missing_marker = Some(value_str.to_string());
            }
            "table.delimiter" => {
                config.table.get_or_insert_with(Default::default).delimiter =
                    Some(value_str.to_string());
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::IsomerExpansion;
    use shapescreen::engine::config::ConfigError;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn base_screen_args() -> ScreenArgs {
        ScreenArgs {
            database: PathBuf::from("refs.sdf"),
            input: PathBuf::from("in.csv"),
            output: PathBuf::from("out.csv"),
            config: None,
            smiles_column: None,
            score_column: None,
            delimiter: None,
            status_column: false,
            isomers: IsomerExpansion::default(),
            max_isomers: None,
            seed: None,
            top_hits: None,
            no_color: false,
            dump_conformers: None,
            set_values: vec![],
        }
    }

    #[test]
    fn build_config_without_file_uses_defaults() {
        let app = build_config(&base_screen_args()).expect("build ok");

        assert_eq!(app.database_path, PathBuf::from("refs.sdf"));
        assert!(app.screening.enumerate_isomers);
        assert_eq!(app.screening.max_isomers, Some(1));
        assert_eq!(app.screening.top_hits, 1);
        assert_eq!(app.screening.generator.max_stereo_centers, 12);
        assert_eq!(app.table.identifier_column, "smiles");
        assert_eq!(app.table.delimiter, b',');
        assert_eq!(app.columns.score_column, "fastroc");
        assert_eq!(app.columns.status_column, None);
        assert_eq!(app.columns.missing_marker, "");
        assert_eq!(app.database.generator, app.screening.generator);
        assert!(app.dump_conformers.is_none());
    }

    #[test]
    fn build_config_reads_file_and_merges() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("screen.toml");
        let toml = r#"
            [conformers]
            enumerate-isomers = false
            max-isomers = 0
            embed-attempts = 3

            [scoring]
            top-hits = 4
            optimize-overlay = false

            [table]
            smiles-column = "SMILES"
            status-column = "why"
            missing-marker = "NA"
            delimiter = ";"
            "#;
        fs::write(&cfg_path, toml).unwrap();

        let mut args = base_screen_args();
        args.config = Some(cfg_path);

        let app = build_config(&args).expect("build ok");

        assert!(!app.screening.enumerate_isomers);
        assert_eq!(app.screening.max_isomers, None);
        assert_eq!(app.screening.generator.embed_attempts, 3);
        assert_eq!(app.screening.top_hits, 4);
        assert!(!app.screening.scoring.optimize_overlay);
        assert_eq!(app.table.identifier_column, "SMILES");
        assert_eq!(app.table.delimiter, b';');
        assert_eq!(app.columns.status_column.as_deref(), Some("why"));
        assert_eq!(app.columns.missing_marker, "NA");
    }

    #[test]
    fn cli_overrides_set_values_which_override_file() {
        let dir = tempdir().unwrap();
        let cfg_path = dir.path().join("screen.toml");
        fs::write(
            &cfg_path,
            "[scoring]\ntop-hits = 2\ncolor = true\n[conformers]\nrandom-seed = 1\nenumerate-isomers = false\n",
        )
        .unwrap();

        let mut args = base_screen_args();
        args.config = Some(cfg_path);
        args.set_values = vec![
            "scoring.top-hits=3".to_string(),
            "conformers.random-seed=5".to_string(),
        ];
        args.top_hits = Some(9);
        args.no_color = true;
        args.isomers = IsomerExpansion {
            enumerate_isomers: true,
            no_enumerate_isomers: false,
        };

        let app = build_config(&args).expect("build ok");

        assert_eq!(app.screening.top_hits, 9);
        assert_eq!(app.screening.generator.random_seed, 5);
        assert!(!app.screening.scoring.color);
        assert!(app.screening.enumerate_isomers);
    }

    #[test]
    fn status_flag_enables_the_default_status_column() {
        let mut args = base_screen_args();
        args.status_column = true;
        let app = build_config(&args).unwrap();
        assert_eq!(app.columns.status_column.as_deref(), Some("fastroc_status"));
    }

    #[test]
    fn empty_missing_marker_can_be_set_explicitly() {
        let mut args = base_screen_args();
        args.set_values = vec!["table.missing-marker=".to_string(), "table.delimiter=tab".to_string()];
        let app = build_config(&args).unwrap();
        assert_eq!(app.columns.missing_marker, "");
        assert_eq!(app.table.delimiter, b'\t');
    }

    #[test]
    fn invalid_set_values_are_config_errors() {
        for bad in [
            "scoring.top-hits",
            "scoring.top-hits=many",
            "conformers.force-flip=maybe",
            "scoring.unknown=1",
        ] {
            let mut args = base_screen_args();
            args.set_values = vec![bad.to_string()];
            assert!(
                matches!(build_config(&args), Err(CliError::Config(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn core_validation_errors_keep_their_engine_type() {
        let mut args = base_screen_args();
        args.top_hits = Some(0);
        let err = build_config(&args).unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(EngineError::Config(ConfigError::InvalidParameter {
                name: "top_hits",
                ..
            }))
        ));
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().starts_with("Invalid configuration:"));
    }

    #[test]
    fn score_column_may_not_shadow_the_smiles_column() {
        let mut args = base_screen_args();
        args.score_column = Some("smiles".to_string());
        let err = build_config(&args).unwrap_err();
        assert!(err.to_string().contains("both named 'smiles'"));
    }

    #[test]
    fn invalid_delimiter_is_rejected() {
        let mut args = base_screen_args();
        args.delimiter = Some("::".to_string());
        assert!(matches!(build_config(&args), Err(CliError::Config(_))));
    }
}
