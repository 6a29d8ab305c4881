//! # shapescreen Core Library
//!
//! Shape and chemistry similarity screening of SMILES libraries against a
//! database of 3D reference molecules. Each query is expanded into
//! stereoisomers, embedded in 3D, overlaid on every database entry and scored
//! with a combined shape and colour Tanimoto.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`,
//!   `Conformer`), cheminformatics algorithms, distance-geometry embedding,
//!   Gaussian shape models and file I/O.
//!
//! - **[`engine`]: The Logic Core.** The pluggable backend seams
//!   (`ConformerGenerator`, `SimilarityScorer`), their pure-Rust reference
//!   implementations, the indexed `ShapeDatabase`, typed configuration,
//!   progress reporting and the error taxonomy.
//!
//! - **[`workflows`]: The Public API.** Ties the `engine` and `core` together
//!   into a complete screening run over a table of molecules, with per-row
//!   failure isolation and cooperative cancellation.

pub mod core;
pub mod engine;
pub mod workflows;
