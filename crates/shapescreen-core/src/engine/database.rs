use super::config::DatabaseOptions;
use super::error::DatabaseError;
use super::generator::{ConformerGenerator, DistanceGeometryGenerator};
use super::progress::{Progress, ProgressReporter};
use crate::core::io::sdf::{SdfError, SdfFile};
use crate::core::io::smi::{SmiError, SmiFile};
use crate::core::io::traits::MolecularFile;
use crate::core::models::conformer::Conformer;
use crate::core::shape::gaussian::ShapeParameters;
use crate::core::shape::overlay::ShapeModel;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Sdf,
    Smiles,
}

impl SourceFormat {
    fn from_path(path: &Path) -> Result<Self, DatabaseError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "sdf" | "sd" | "mol" => Ok(SourceFormat::Sdf),
            "smi" | "smiles" | "ism" => Ok(SourceFormat::Smiles),
            _ => Err(DatabaseError::UnsupportedFormat {
                path: path.display().to_string(),
                extension,
            }),
        }
    }
}

/// One indexed reference conformer.
#[derive(Debug, Clone)]
pub struct DatabaseEntry {
    /// Position among the indexed entries; doubles as the tie-breaker.
    pub index: usize,
    pub title: String,
    pub model: ShapeModel,
}

/// A read-only, pre-indexed collection of reference shapes.
#[derive(Debug, Clone)]
pub struct ShapeDatabase {
    source: PathBuf,
    parameters: ShapeParameters,
    entries: Vec<DatabaseEntry>,
    load_time: Duration,
}

impl ShapeDatabase {
    /// Loads and indexes the molecules in `path`.
    ///
    /// The format follows the extension: SD files are used with their own
    /// coordinates, SMILES lists are embedded first. SMILES lines that cannot
    /// be parsed or embedded are skipped with a warning, as are records
    /// without heavy atoms.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] if the file cannot be read, has an unknown
    /// extension or contains a malformed SD record.
    pub fn open(
        path: impl AsRef<Path>,
        options: &DatabaseOptions,
        reporter: &ProgressReporter,
    ) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let started = Instant::now();
        let format = SourceFormat::from_path(path)?;
        let shown = path.display().to_string();

        reporter.report(Progress::PhaseStart {
            name: "Loading Database",
        });
        let conformers = match format {
            SourceFormat::Sdf => SdfFile::read_from_path(path).map_err(|e| match e {
                SdfError::Io(source) => DatabaseError::Open {
                    path: shown.clone(),
                    source,
                },
                SdfError::Parse { record, line, kind } => DatabaseError::Parse {
                    path: shown.clone(),
                    record,
                    line,
                    kind,
                },
            })?,
            SourceFormat::Smiles => load_smiles(path, options, reporter)?,
        };
        reporter.report(Progress::PhaseFinish);

        let mut database = Self::index(conformers, options.shape, reporter);
        database.source = path.to_path_buf();
        database.load_time = started.elapsed();

        if database.is_empty() {
            warn!(path = %shown, "Database contains no usable entries; every query will score as missing");
        }
        info!(
            path = %shown,
            entries = database.len(),
            elapsed_ms = database.load_time.as_millis() as u64,
            "Database opened"
        );
        reporter.report(Progress::Message(format!(
            "Opened database '{}' with {} entries in {:.2?}",
            shown,
            database.len(),
            database.load_time
        )));
        Ok(database)
    }

    /// Indexes already-built conformers, keeping their order.
    pub fn from_conformers(
        conformers: Vec<Conformer>,
        parameters: ShapeParameters,
        reporter: &ProgressReporter,
    ) -> Self {
        let started = Instant::now();
        let mut database = Self::index(conformers, parameters, reporter);
        database.load_time = started.elapsed();
        database
    }

    fn index(conformers: Vec<Conformer>, parameters: ShapeParameters, reporter: &ProgressReporter) -> Self {
        reporter.report(Progress::PhaseStart {
            name: "Indexing Shapes",
        });
        reporter.report(Progress::TaskStart {
            total_steps: conformers.len() as u64,
        });
        let models: Vec<Option<ShapeModel>> = conformers
            .par_iter()
            .map(|conformer| {
                let model = ShapeModel::from_conformer(conformer, &parameters);
                reporter.report(Progress::TaskIncrement);
                model
            })
            .collect();
        reporter.report(Progress::TaskFinish);
        reporter.report(Progress::PhaseFinish);

        let mut entries = Vec::with_capacity(conformers.len());
        for (record, (conformer, model)) in conformers.into_iter().zip(models).enumerate() {
            let Some(model) = model else {
                warn!(record = record + 1, title = %conformer.title, "Skipping database entry without heavy atoms");
                continue;
            };
            let title = if conformer.title.is_empty() {
                fallback_title(record)
            } else {
                conformer.title
            };
            debug!(
                title = %title,
                atoms = model.atom_count(),
                features = model.feature_count(),
                volume = model.self_overlap(),
                "Indexed database entry"
            );
            entries.push(DatabaseEntry {
                index: entries.len(),
                title,
                model,
            });
        }

        Self {
            source: PathBuf::new(),
            parameters,
            entries,
            load_time: Duration::ZERO,
        }
    }

    pub fn entries(&self) -> &[DatabaseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn parameters(&self) -> &ShapeParameters {
        &self.parameters
    }

    /// The file the database was opened from; empty for in-memory databases.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn load_time(&self) -> Duration {
        self.load_time
    }
}

fn load_smiles(
    path: &Path,
    options: &DatabaseOptions,
    reporter: &ProgressReporter,
) -> Result<Vec<Conformer>, DatabaseError> {
    let records = SmiFile::read_from_path(path).map_err(|e| match e {
        SmiError::Io(source) => DatabaseError::Open {
            path: path.display().to_string(),
            source,
        },
    })?;

    let generator = DistanceGeometryGenerator::new(options.generator.clone());
    reporter.report(Progress::TaskStart {
        total_steps: records.len() as u64,
    });
    let built: Vec<Option<Conformer>> = records
        .par_iter()
        .enumerate()
        .map(|(position, record)| {
            let result = generator.generate(&record.smiles, false, Some(1));
            reporter.report(Progress::TaskIncrement);
            match result {
                Ok(conformers) => conformers.into_iter().next().map(|mut conformer| {
                    conformer.title = if record.title.is_empty() {
                        fallback_title(position)
                    } else {
                        record.title.clone()
                    };
                    conformer
                }),
                Err(e) => {
                    warn!(line = record.line, smiles = %record.smiles, error = %e, "Skipping database line");
                    None
                }
            }
        })
        .collect();
    reporter.report(Progress::TaskFinish);

    Ok(built.into_iter().flatten().collect())
}

/// Title for an untitled record, numbered by its 0-based position in the source file.
fn fallback_title(position: usize) -> String {
    format!("entry{}", position + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::tempdir;

    const WATER_SDF: &str = "\
water
  handmade         3D

  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
M  END
$$$$
";

    #[test]
    fn opens_smiles_database_and_skips_bad_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("refs.smi");
        fs::write(&path, "CCO ethanol\nnot_a_molecule broken\nc1ccccc1\n").unwrap();

        let db = ShapeDatabase::open(&path, &DatabaseOptions::default(), &ProgressReporter::new()).unwrap();

        assert_eq!(db.len(), 2);
        assert_eq!(db.entries()[0].title, "ethanol");
        assert_eq!(db.entries()[1].title, "entry3");
        assert_eq!(db.entries()[1].index, 1);
        assert_eq!(db.source(), path.as_path());
    }

    #[test]
    fn out_of_range_bracket_atoms_are_skipped_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("refs.smi");
        fs::write(&path, "[C-128] bad\n[CH300] worse\nCCO\n").unwrap();

        let db = ShapeDatabase::open(&path, &DatabaseOptions::default(), &ProgressReporter::new()).unwrap();

        assert_eq!(db.len(), 1);
        assert_eq!(db.entries()[0].title, "entry3");
    }

    #[test]
    fn opens_sdf_database_case_insensitively() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("refs.SDF");
        fs::write(&path, WATER_SDF).unwrap();

        let db = ShapeDatabase::open(&path, &DatabaseOptions::default(), &ProgressReporter::new()).unwrap();

        assert_eq!(db.len(), 1);
        assert_eq!(db.entries()[0].title, "water");
        assert_eq!(db.parameters(), &ShapeParameters::default());
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = tempdir().unwrap();
        let result = ShapeDatabase::open(
            dir.path().join("absent.sdf"),
            &DatabaseOptions::default(),
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(DatabaseError::Open { .. })));
    }

    #[test]
    fn unknown_extension_is_rejected_before_reading() {
        let result = ShapeDatabase::open("refs.oeb", &DatabaseOptions::default(), &ProgressReporter::new());
        match result {
            Err(DatabaseError::UnsupportedFormat { extension, .. }) => assert_eq!(extension, "oeb"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn malformed_sdf_record_reports_its_position() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.sdf");
        fs::write(&path, format!("{WATER_SDF}second\n\n\n  2  0  0\n")).unwrap();

        let result = ShapeDatabase::open(&path, &DatabaseOptions::default(), &ProgressReporter::new());
        assert!(matches!(result, Err(DatabaseError::Parse { record: 2, .. })));
    }

    #[test]
    fn empty_database_is_allowed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.smi");
        fs::write(&path, "").unwrap();

        let db = ShapeDatabase::open(&path, &DatabaseOptions::default(), &ProgressReporter::new()).unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn indexing_reports_one_increment_per_conformer() {
        let generator = DistanceGeometryGenerator::default();
        let conformers: Vec<Conformer> = ["CCO", "CCN", "CCC"]
            .iter()
            .flat_map(|s| generator.generate(s, false, Some(1)).unwrap())
            .collect();
        let increments = Mutex::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if matches!(event, Progress::TaskIncrement) {
                *increments.lock().unwrap() += 1;
            }
        }));

        let db = ShapeDatabase::from_conformers(conformers, ShapeParameters::default(), &reporter);
        drop(reporter);

        assert_eq!(db.len(), 3);
        assert_eq!(increments.into_inner().unwrap(), 3);
    }
}
