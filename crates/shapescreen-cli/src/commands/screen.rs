use crate::cli::ScreenArgs;
use crate::config::{AppConfig, build_config};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use shapescreen::core::io::sdf::SdfWriter;
use shapescreen::core::io::table::MoleculeTable;
use shapescreen::engine::config::ScreeningConfig;
use shapescreen::engine::database::ShapeDatabase;
use shapescreen::engine::error::EngineError;
use shapescreen::engine::generator::{ConformerGenerator, DistanceGeometryGenerator};
use shapescreen::engine::progress::ProgressReporter;
use shapescreen::engine::scorer::{BackendAvailability, ShapeScorer, SimilarityScorer};
use shapescreen::workflows::screen::{
    self, ConformerSink, RunControl, ScreeningBackend, ScreeningReport,
};
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal;
use tokio::task::{self, JoinError, JoinHandle};
use tracing::{debug, info, warn};

/// Exit status of a run that was stopped by the user.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

const PREVIEW_ROWS: usize = 5;
const PREVIEW_CELL_WIDTH: usize = 40;

/// How a screening command ended without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    /// No scoring backend could be used; nothing was read or written.
    BackendUnavailable,
    /// Stopped by Ctrl-C after the processed rows were written.
    Interrupted,
}

impl RunStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::Completed | RunStatus::BackendUnavailable => 0,
            RunStatus::Interrupted => INTERRUPTED_EXIT_CODE,
        }
    }
}

/// The generator and scorer a run uses.
#[derive(Clone)]
pub struct Backend {
    pub generator: Arc<dyn ConformerGenerator>,
    pub scorer: Arc<dyn SimilarityScorer>,
}

impl Backend {
    /// Distance-geometry conformers scored by the CPU Gaussian overlay.
    pub fn reference(config: &ScreeningConfig) -> Self {
        Self {
            generator: Arc::new(DistanceGeometryGenerator::new(config.generator.clone())),
            scorer: Arc::new(ShapeScorer::new(config.scoring.clone())),
        }
    }
}

pub async fn run(args: ScreenArgs, quiet: bool) -> Result<RunStatus> {
    info!("Merging configuration from file and CLI arguments...");
    let config = build_config(&args)?;
    debug!("Resolved configuration: {:?}", &config);

    let backend = Backend::reference(&config.screening);
    let progress = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    execute(config, backend, progress).await
}

/// Runs a screen with an explicit backend.
///
/// The output table is written only after the row loop ends, so a database or
/// input failure never leaves a file behind.
pub async fn execute(
    config: AppConfig,
    backend: Backend,
    progress: CliProgressHandler,
) -> Result<RunStatus> {
    match backend.scorer.availability() {
        BackendAvailability::Unavailable { reason } => {
            info!(%reason, "Scoring backend unavailable; nothing to do");
            println!("ℹ️  Scoring backend unavailable ({reason}). No rows were screened.");
            return Ok(RunStatus::BackendUnavailable);
        }
        BackendAvailability::Ready { device } => {
            info!(%device, "Scoring backend ready");
        }
    }

    info!("Opening shape database {:?}", &config.database_path);
    let database = {
        let path = config.database_path.clone();
        let options = config.database.clone();
        let callback = progress.get_callback();
        task::spawn_blocking(move || {
            let reporter = ProgressReporter::with_callback(callback);
            ShapeDatabase::open(&path, &options, &reporter)
        })
        .await
        .map_err(join_error)?
        .map_err(EngineError::from)?
    };
    println!(
        "Loaded {} reference shapes from {} in {:.2?}.",
        database.len(),
        config.database_path.display(),
        database.load_time()
    );

    info!("Reading input table {:?}", &config.input_path);
    let mut table = MoleculeTable::read_from_path(&config.input_path, &config.table)?;
    println!("Screening {} rows...", table.len());

    let dump = match &config.dump_conformers {
        Some(path) => Some(SdfWriter::new(BufWriter::new(File::create(path)?))),
        None => None,
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let handle = {
        let queries: Vec<String> = table.identifiers().map(str::to_string).collect();
        let screening = config.screening.clone();
        let cancel = cancel.clone();
        let callback = progress.get_callback();
        task::spawn_blocking(move || {
            let reporter = ProgressReporter::with_callback(callback);
            let queries: Vec<&str> = queries.iter().map(String::as_str).collect();
            let mut dump = dump;
            let control = RunControl {
                cancel: Some(cancel.as_ref()),
                sink: dump.as_mut().map(|writer| writer as &mut dyn ConformerSink),
            };
            let backend = ScreeningBackend {
                generator: backend.generator.as_ref(),
                scorer: backend.scorer.as_ref(),
            };
            let report = screen::run(&queries, backend, &database, &screening, &reporter, control);
            (report, dump)
        })
    };

    let (report, dump) = wait_for_screen(handle, &cancel).await?;
    let report = report?;

    if let (Some(mut writer), Some(path)) = (dump, &config.dump_conformers) {
        writer.flush().map_err(|e| CliError::FileParsing {
            path: path.clone(),
            source: e.into(),
        })?;
        println!(
            "Wrote {} query conformers to {}.",
            writer.records_written(),
            path.display()
        );
    }

    screen::apply_to_table(&mut table, &report, &config.columns)?;
    table.write_to_path(&config.output_path)?;
    info!(
        path = %config.output_path.display(),
        rows = table.len(),
        "Output table written"
    );

    println!("{}", summarize(&report, table.len()));
    println!("{}", render_preview(&table, PREVIEW_ROWS));

    if report.interrupted {
        warn!(rows = report.outcomes.len(), "Run interrupted; wrote processed rows only");
        println!(
            "⚠️  Interrupted: {} processed rows written to {}.",
            report.outcomes.len(),
            config.output_path.display()
        );
        Ok(RunStatus::Interrupted)
    } else {
        println!("✓ Results written to: {}", config.output_path.display());
        Ok(RunStatus::Completed)
    }
}

/// Waits for the screening task. The first Ctrl-C asks it to stop after the
/// current row; a second one exits the process at once.
async fn wait_for_screen<T>(mut handle: JoinHandle<T>, cancel: &AtomicBool) -> Result<T> {
    tokio::select! {
        joined = &mut handle => return joined.map_err(join_error),
        received = signal::ctrl_c() => match received {
            Ok(()) => {
                cancel.store(true, Ordering::SeqCst);
                warn!("Interrupt received; finishing the current row");
                eprintln!(
                    "\n⚠️  Interrupt received. Finishing the current row and writing partial results (Ctrl-C again to abort)..."
                );
            }
            Err(e) => {
                warn!("Unable to listen for Ctrl-C: {}", e);
                return handle.await.map_err(join_error);
            }
        },
    }

    tokio::select! {
        joined = &mut handle => joined.map_err(join_error),
        _ = signal::ctrl_c() => {
            eprintln!("\n❌ Aborted.");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    }
}

fn join_error(e: JoinError) -> CliError {
    CliError::Other(anyhow::anyhow!("Screening task failed: {}", e))
}

fn summarize(report: &ScreeningReport, rows: usize) -> String {
    let mut summary = format!(
        "Scored {} of {} rows in {:.2?}",
        report.scored_count(),
        rows,
        report.elapsed
    );
    let failures = report.failure_counts();
    if !failures.is_empty() {
        let kinds: Vec<String> = failures
            .iter()
            .map(|(kind, count)| format!("{kind}={count}"))
            .collect();
        summary.push_str(&format!(
            "; {} missing ({})",
            report.missing_count(),
            kinds.join(", ")
        ));
    }
    summary.push('.');
    summary
}

/// The header and first `rows` rows as an aligned text block.
fn render_preview(table: &MoleculeTable, rows: usize) -> String {
    let clip = |cell: &str| -> String {
        if cell.chars().count() > PREVIEW_CELL_WIDTH {
            let mut clipped: String = cell.chars().take(PREVIEW_CELL_WIDTH - 1).collect();
            clipped.push('…');
            clipped
        } else {
            cell.to_string()
        }
    };

    let mut lines: Vec<Vec<String>> = vec![table.headers().iter().map(|h| clip(h)).collect()];
    lines.extend(
        table
            .rows()
            .iter()
            .take(rows)
            .map(|row| row.iter().map(|cell| clip(cell)).collect()),
    );

    let columns = table.headers().len();
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            lines
                .iter()
                .filter_map(|line| line.get(c))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = Vec::with_capacity(lines.len() + 1);
    for line in &lines {
        let padded: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        out.push(padded.join("  ").trim_end().to_string());
    }
    if table.len() > rows {
        out.push(format!("... ({} more rows)", table.len() - rows));
    }
    out.join("\n")
}
