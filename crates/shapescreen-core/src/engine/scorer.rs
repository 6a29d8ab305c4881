use super::config::ScoringConfig;
use super::database::ShapeDatabase;
use super::error::ScoringError;
use crate::core::models::conformer::Conformer;
use crate::core::shape::overlay::{OverlayOptions, ShapeModel, best_overlay};
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::{trace, warn};

/// Whether a scoring backend can run in this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendAvailability {
    Ready { device: String },
    Unavailable { reason: String },
}

impl BackendAvailability {
    pub fn is_ready(&self) -> bool {
        matches!(self, BackendAvailability::Ready { .. })
    }
}

/// Similarity of a query to one database entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub entry_index: usize,
    pub entry_title: String,
    pub tanimoto_combo: f64,
    pub shape_tanimoto: f64,
    pub color_tanimoto: f64,
}

/// Scores query conformers against an opened shape database.
pub trait SimilarityScorer: Send + Sync {
    fn availability(&self) -> BackendAvailability;

    /// Returns at most `limit` records, best `tanimoto_combo` first. Ties keep
    /// database order. A query without heavy atoms yields no records.
    ///
    /// # Errors
    ///
    /// [`ScoringError::IncompatibleDatabase`] when the database cannot be used
    /// by this scorer at all; [`ScoringError::Failed`] for query-specific
    /// problems.
    fn score(
        &self,
        query: &Conformer,
        database: &ShapeDatabase,
        limit: usize,
    ) -> Result<Vec<ScoreRecord>, ScoringError>;
}

/// Gaussian shape and colour overlay on the CPU, parallel over database entries.
#[derive(Debug, Clone, Default)]
pub struct ShapeScorer {
    config: ScoringConfig,
}

impl ShapeScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    fn overlay_options(&self) -> OverlayOptions {
        OverlayOptions {
            color: self.config.color,
            optimize: self.config.optimize_overlay,
            ..OverlayOptions::default()
        }
    }
}

impl SimilarityScorer for ShapeScorer {
    fn availability(&self) -> BackendAvailability {
        match rayon::current_num_threads() {
            0 => BackendAvailability::Unavailable {
                reason: "no worker threads in the rayon pool".to_string(),
            },
            threads => BackendAvailability::Ready {
                device: format!("CPU ({threads} threads)"),
            },
        }
    }

    fn score(
        &self,
        query: &Conformer,
        database: &ShapeDatabase,
        limit: usize,
    ) -> Result<Vec<ScoreRecord>, ScoringError> {
        if database.parameters() != &self.config.shape {
            return Err(ScoringError::IncompatibleDatabase {
                database: *database.parameters(),
                scorer: self.config.shape,
            });
        }
        let Some(query_model) = ShapeModel::from_conformer(query, &self.config.shape) else {
            trace!(title = %query.title, "Query has no heavy atoms");
            return Ok(Vec::new());
        };

        let options = self.overlay_options();
        let mut records: Vec<ScoreRecord> = database
            .entries()
            .par_iter()
            .filter_map(|entry| {
                let overlay = best_overlay(&query_model, &entry.model, &options);
                if !overlay.tanimoto_combo.is_finite() {
                    warn!(entry = %entry.title, "Discarding non-finite overlay score");
                    return None;
                }
                Some(ScoreRecord {
                    entry_index: entry.index,
                    entry_title: entry.title.clone(),
                    tanimoto_combo: overlay.tanimoto_combo,
                    shape_tanimoto: overlay.shape_tanimoto,
                    color_tanimoto: overlay.color_tanimoto,
                })
            })
            .collect();

        sort_records(&mut records);
        records.truncate(limit);
        Ok(records)
    }
}

/// Descending combo, then ascending entry index.
pub fn sort_records(records: &mut [ScoreRecord]) {
    records.sort_by(|a, b| match b.tanimoto_combo.total_cmp(&a.tanimoto_combo) {
        Ordering::Equal => a.entry_index.cmp(&b.entry_index),
        other => other,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::shape::gaussian::ShapeParameters;
    use crate::engine::generator::{ConformerGenerator, DistanceGeometryGenerator};
    use crate::engine::progress::ProgressReporter;

    fn conformer(smiles: &str) -> Conformer {
        DistanceGeometryGenerator::default()
            .generate(smiles, false, Some(1))
            .unwrap()
            .remove(0)
    }

    fn database(smiles: &[&str]) -> ShapeDatabase {
        let conformers = smiles.iter().map(|s| conformer(s)).collect();
        ShapeDatabase::from_conformers(conformers, ShapeParameters::default(), &ProgressReporter::new())
    }

    fn record(index: usize, combo: f64) -> ScoreRecord {
        ScoreRecord {
            entry_index: index,
            entry_title: String::new(),
            tanimoto_combo: combo,
            shape_tanimoto: combo,
            color_tanimoto: 0.0,
        }
    }

    #[test]
    fn reference_scorer_is_available() {
        assert!(ShapeScorer::default().availability().is_ready());
    }

    #[test]
    fn identical_molecule_ranks_first_with_near_maximal_score() {
        let db = database(&["c1ccccc1CCCCCC", "CCO ethanol", "CC(=O)O"]);
        let records = ShapeScorer::default().score(&conformer("CCO"), &db, 3).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].entry_title, "ethanol");
        assert!(records[0].tanimoto_combo > 1.5, "combo {}", records[0].tanimoto_combo);
        assert!(records.windows(2).all(|w| w[0].tanimoto_combo >= w[1].tanimoto_combo));
        for r in &records {
            assert!((0.0..=2.0).contains(&r.tanimoto_combo));
        }
    }

    #[test]
    fn limit_truncates_results() {
        let db = database(&["CCO", "CCN", "CCC"]);
        let records = ShapeScorer::default().score(&conformer("CCO"), &db, 1).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn empty_database_yields_no_records() {
        let db = database(&[]);
        let records = ShapeScorer::default().score(&conformer("CCO"), &db, 1).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn mismatched_parameters_make_the_database_incompatible() {
        let db = database(&["CCO"]);
        let scorer = ShapeScorer::new(ScoringConfig {
            shape: ShapeParameters {
                prefactor: 2.7,
                color_radius: 1.0,
            },
            ..ScoringConfig::default()
        });
        let err = scorer.score(&conformer("CCO"), &db, 1).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn ties_are_broken_by_entry_index() {
        let mut records = vec![record(2, 1.0), record(0, 0.5), record(1, 1.0)];
        sort_records(&mut records);
        let order: Vec<usize> = records.iter().map(|r| r.entry_index).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn scoring_is_deterministic() {
        let db = database(&["CCO", "c1ccccc1O", "CCCCN"]);
        let query = conformer("Oc1ccccc1C");
        let scorer = ShapeScorer::default();
        assert_eq!(scorer.score(&query, &db, 3).unwrap(), scorer.score(&query, &db, 3).unwrap());
    }
}
