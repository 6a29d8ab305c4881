use clap::{Args, Parser};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "shapescreen - Screen the SMILES of a table against a shape database and append the best Tanimoto Combo score of every row.",
    help_template = HELP_TEMPLATE,
)]
pub struct Cli {
    #[command(flatten)]
    pub screen: ScreenArgs,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

/// Arguments of a screening run.
#[derive(Args, Debug)]
pub struct ScreenArgs {
    // --- Core Arguments ---
    /// Reference database (.sdf/.sd/.mol with coordinates, or .smi/.smiles/.ism).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub database: PathBuf,

    /// Input table with a SMILES column.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Output table; overwritten if it already exists.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Table Overrides ---
    /// Name of the column holding the query SMILES.
    #[arg(long, value_name = "NAME")]
    pub smiles_column: Option<String>,

    /// Name of the appended score column.
    #[arg(long, value_name = "NAME")]
    pub score_column: Option<String>,

    /// Field delimiter of the input and output tables (e.g. ',', ';', 'tab').
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<String>,

    /// Also append a column explaining why a row has no score.
    #[arg(long)]
    pub status_column: bool,

    // --- Conformer Overrides ---
    /// Override `conformers.enumerate-isomers` from the config file.
    #[command(flatten)]
    pub isomers: IsomerExpansion,

    /// Conformers kept per query (0 keeps every stereoisomer).
    #[arg(long, value_name = "INT")]
    pub max_isomers: Option<usize>,

    /// Seed for conformer embedding.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    // --- Scoring Overrides ---
    /// Number of best hits retrieved per query.
    #[arg(long, value_name = "INT")]
    pub top_hits: Option<usize>,

    /// Score shape overlap only, without colour features.
    #[arg(long)]
    pub no_color: bool,

    /// Write every generated query conformer to this SD file.
    #[arg(long, value_name = "PATH")]
    pub dump_conformers: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S conformers.max-isomers=4
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Mutually exclusive flags controlling stereoisomer expansion.
#[derive(Args, Debug, Clone, Copy, Default)]
#[group(required = false, multiple = false)]
pub struct IsomerExpansion {
    /// Expand unspecified stereocentres before embedding.
    #[arg(long)]
    pub enumerate_isomers: bool,
    /// Embed each SMILES exactly as written.
    #[arg(long)]
    pub no_enumerate_isomers: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_required_paths_and_repeated_overrides() {
        let cli = Cli::try_parse_from([
            "shapescreen",
            "-d",
            "refs.sdf",
            "-i",
            "in.csv",
            "-o",
            "out.csv",
            "-S",
            "scoring.top-hits=3",
            "-S",
            "table.missing-marker=NA",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.screen.database, PathBuf::from("refs.sdf"));
        assert_eq!(cli.screen.set_values.len(), 2);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn missing_database_is_a_usage_error() {
        assert!(Cli::try_parse_from(["shapescreen", "-i", "in.csv", "-o", "out.csv"]).is_err());
    }

    #[test]
    fn isomer_flags_conflict() {
        let result = Cli::try_parse_from([
            "shapescreen",
            "-d",
            "refs.sdf",
            "-i",
            "in.csv",
            "-o",
            "out.csv",
            "--enumerate-isomers",
            "--no-enumerate-isomers",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from([
            "shapescreen", "-d", "a.sdf", "-i", "b.csv", "-o", "c.csv", "-q", "-v",
        ]);
        assert!(result.is_err());
    }
}
