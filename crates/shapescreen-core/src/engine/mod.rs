//! # Engine Module
//!
//! This module implements the screening engine: the two backend seams a
//! screen is built from, their pure-Rust reference implementations, and the
//! supporting configuration, progress and error types.
//!
//! ## Overview
//!
//! A screen needs a **conformer generator** that turns a SMILES string into 3D
//! structures and a **similarity scorer** that compares one structure with
//! every entry of an indexed **shape database**. Both are traits, so a driver
//! only depends on the contracts and any backend (the CPU reference backend
//! here, or an accelerated one) can be plugged in.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Typed settings and the `ScreeningConfigBuilder`
//! - **Conformer Generation** ([`generator`]) - The `ConformerGenerator` trait and the distance-geometry backend
//! - **Shape Database** ([`database`]) - Loading, embedding and parallel indexing of reference molecules
//! - **Similarity Scoring** ([`scorer`]) - The `SimilarityScorer` trait, backend probing and the Gaussian overlay backend
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events for front ends
//! - **Error Handling** ([`error`]) - Per-layer error types and the fatal `EngineError`
//!
//! ## Key Capabilities
//!
//! - **Stereoisomer expansion** with a configurable cap and retention limit
//! - **Deterministic embedding** for a fixed random seed
//! - **Parallel scoring** over database entries with rayon
//! - **Stable ranking** by composite score with insertion-order tie breaking

pub mod config;
pub mod database;
pub mod error;
pub mod generator;
pub mod progress;
pub mod scorer;
