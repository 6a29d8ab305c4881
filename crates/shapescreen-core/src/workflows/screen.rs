use crate::core::io::sdf::SdfWriter;
use crate::core::io::table::{MoleculeTable, TableError};
use crate::core::models::conformer::Conformer;
use crate::engine::config::ScreeningConfig;
use crate::engine::database::ShapeDatabase;
use crate::engine::error::{ConformerError, EngineError, ScoringError};
use crate::engine::generator::ConformerGenerator;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::scorer::{BackendAvailability, ScoreRecord, SimilarityScorer};
use std::any::Any;
use std::collections::BTreeMap;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Receives every query conformer as it is generated.
pub trait ConformerSink {
    fn accept(&mut self, row: usize, conformer: &Conformer) -> Result<(), SinkError>;
}

impl<W: Write> ConformerSink for SdfWriter<W> {
    fn accept(&mut self, row: usize, conformer: &Conformer) -> Result<(), SinkError> {
        self.write(conformer, &format!("row{}:{}", row + 1, conformer.title))?;
        Ok(())
    }
}

/// Why a row ended up without a score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFailure {
    Parse(String),
    ConformerBuild(String),
    /// The generator succeeded but produced nothing.
    NoConformer,
    /// Scoring returned no records (empty database or degenerate query).
    NoScore,
    Scoring(String),
    /// A backend panicked while handling the row.
    Unexpected(String),
}

impl RowFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            RowFailure::Parse(_) => "parse",
            RowFailure::ConformerBuild(_) => "conformer_build",
            RowFailure::NoConformer => "no_conformer",
            RowFailure::NoScore => "no_score",
            RowFailure::Scoring(_) => "scoring",
            RowFailure::Unexpected(_) => "unexpected",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            RowFailure::Parse(d)
            | RowFailure::ConformerBuild(d)
            | RowFailure::Scoring(d)
            | RowFailure::Unexpected(d) => Some(d),
            RowFailure::NoConformer | RowFailure::NoScore => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowOutcome {
    pub row: usize,
    /// Conformers produced for the row before scoring.
    pub conformers: usize,
    pub result: Result<ScoreRecord, RowFailure>,
}

impl RowOutcome {
    pub fn score(&self) -> Option<f64> {
        self.result.as_ref().ok().map(|r| r.tanimoto_combo)
    }

    pub fn status(&self) -> &'static str {
        match &self.result {
            Ok(_) => "ok",
            Err(failure) => failure.kind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningReport {
    /// One outcome per processed row, in input order.
    pub outcomes: Vec<RowOutcome>,
    /// Set when cancellation stopped the run before the last row.
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl ScreeningReport {
    pub fn scored_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn missing_count(&self) -> usize {
        self.outcomes.len() - self.scored_count()
    }

    /// Missing rows grouped by failure kind.
    pub fn failure_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            if let Err(failure) = &outcome.result {
                *counts.entry(failure.kind()).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Names and placeholder used when results are written back to a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumns {
    pub score_column: String,
    pub status_column: Option<String>,
    pub missing_marker: String,
}

impl Default for OutputColumns {
    fn default() -> Self {
        Self {
            score_column: "fastroc".to_string(),
            status_column: None,
            missing_marker: String::new(),
        }
    }
}

/// The two backend seams a screen runs on.
#[derive(Clone, Copy)]
pub struct ScreeningBackend<'a> {
    pub generator: &'a dyn ConformerGenerator,
    pub scorer: &'a dyn SimilarityScorer,
}

/// Optional run-time hooks.
#[derive(Default)]
pub struct RunControl<'a> {
    /// Checked between rows; once set the run stops and returns what it has.
    pub cancel: Option<&'a AtomicBool>,
    pub sink: Option<&'a mut dyn ConformerSink>,
}

/// Screens each query against `database`, one row at a time and in order.
///
/// Per-row problems (bad SMILES, failed embedding, empty results, backend
/// panics) become a [`RowFailure`] for that row only.
///
/// # Errors
///
/// Returns [`EngineError::BackendUnavailable`] if the scorer cannot run and
/// [`EngineError::Scoring`] if the scorer rejects the database itself.
#[instrument(skip_all, name = "screening_workflow", fields(rows = queries.len()))]
pub fn run(
    queries: &[&str],
    backend: ScreeningBackend,
    database: &ShapeDatabase,
    config: &ScreeningConfig,
    reporter: &ProgressReporter,
    mut control: RunControl,
) -> Result<ScreeningReport, EngineError> {
    if let BackendAvailability::Unavailable { reason } = backend.scorer.availability() {
        return Err(EngineError::BackendUnavailable(reason));
    }

    let started = Instant::now();
    reporter.report(Progress::PhaseStart { name: "Screening" });
    reporter.report(Progress::TaskStart {
        total_steps: queries.len() as u64,
    });
    info!(database_entries = database.len(), "Starting screen");

    let mut outcomes = Vec::with_capacity(queries.len());
    let mut interrupted = false;

    for (row, smiles) in queries.iter().enumerate() {
        if control.cancel.is_some_and(|flag| flag.load(Ordering::SeqCst)) {
            info!(row, "Cancellation requested; stopping before row");
            interrupted = true;
            break;
        }

        let sink = control.sink.as_deref_mut();
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            process_row(row, smiles, backend, database, config, sink)
        }));
        let outcome = match attempt {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(fatal)) => {
                reporter.report(Progress::TaskFinish);
                reporter.report(Progress::PhaseFinish);
                return Err(fatal.into());
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(row, smiles, %message, "Backend panicked; row will be missing");
                RowOutcome {
                    row,
                    conformers: 0,
                    result: Err(RowFailure::Unexpected(message)),
                }
            }
        };

        reporter.report(Progress::RowFinished {
            row,
            scored: outcome.result.is_ok(),
        });
        reporter.report(Progress::TaskIncrement);
        outcomes.push(outcome);
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let report = ScreeningReport {
        outcomes,
        interrupted,
        elapsed: started.elapsed(),
    };
    info!(
        processed = report.outcomes.len(),
        scored = report.scored_count(),
        missing = report.missing_count(),
        interrupted,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Screen finished"
    );
    Ok(report)
}

fn process_row(
    row: usize,
    smiles: &str,
    backend: ScreeningBackend,
    database: &ShapeDatabase,
    config: &ScreeningConfig,
    sink: Option<&mut (dyn ConformerSink + '_)>,
) -> Result<RowOutcome, ScoringError> {
    let missing = |conformers: usize, failure: RowFailure| RowOutcome {
        row,
        conformers,
        result: Err(failure),
    };

    let conformers = match backend
        .generator
        .generate(smiles, config.enumerate_isomers, config.max_isomers)
    {
        Ok(conformers) => conformers,
        Err(ConformerError::Parse(e)) => {
            warn!(row, smiles, error = %e, "Invalid SMILES");
            return Ok(missing(0, RowFailure::Parse(e.to_string())));
        }
        Err(e @ ConformerError::Build { .. }) => {
            warn!(row, smiles, error = %e, "Conformer generation failed");
            return Ok(missing(0, RowFailure::ConformerBuild(e.to_string())));
        }
    };

    if let Some(sink) = sink {
        for conformer in &conformers {
            if let Err(e) = sink.accept(row, conformer) {
                warn!(row, error = %e, "Failed to write conformer");
            }
        }
    }

    let Some(query) = conformers.first() else {
        debug!(row, smiles, "Generator produced no conformers");
        return Ok(missing(0, RowFailure::NoConformer));
    };

    match backend.scorer.score(query, database, config.top_hits) {
        Ok(records) => match records.into_iter().next() {
            Some(best) => {
                debug!(row, smiles, score = best.tanimoto_combo, hit = %best.entry_title, "Row scored");
                Ok(RowOutcome {
                    row,
                    conformers: conformers.len(),
                    result: Ok(best),
                })
            }
            None => Ok(missing(conformers.len(), RowFailure::NoScore)),
        },
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            warn!(row, smiles, error = %e, "Scoring failed");
            Ok(missing(conformers.len(), RowFailure::Scoring(e.to_string())))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Writes the report into `table` as new (or replaced) columns.
///
/// An interrupted report covers only a prefix of the table; the table is cut
/// to that prefix first.
pub fn apply_to_table(
    table: &mut MoleculeTable,
    report: &ScreeningReport,
    columns: &OutputColumns,
) -> Result<(), TableError> {
    if report.outcomes.len() < table.len() {
        table.truncate(report.outcomes.len());
    }
    let scores = report
        .outcomes
        .iter()
        .map(|o| match o.score() {
            Some(score) => format_score(score),
            None => columns.missing_marker.clone(),
        })
        .collect();
    table.set_column(&columns.score_column, scores)?;

    if let Some(status_column) = &columns.status_column {
        let statuses = report
            .outcomes
            .iter()
            .map(|o| o.status().to_string())
            .collect();
        table.set_column(status_column, statuses)?;
    }
    Ok(())
}

/// Shortest round-trip form that always reads as a float: `2.0`, not `2`.
fn format_score(score: f64) -> String {
    let text = score.to_string();
    if score.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}
