//! # Workflows Module
//!
//! High-level entry points that run a complete screen.
//!
//! ## Overview
//!
//! A workflow takes already-opened resources (backend, shape database,
//! configuration) and drives them over a list of query molecules. It owns the
//! per-row error policy: nothing that goes wrong with one molecule can stop
//! the others, and only problems with the shared resources end a run early.
//!
//! ## Architecture
//!
//! - **Screening Workflow** ([`screen`]) - Generates, scores and records one
//!   outcome per query row, supports cooperative cancellation and optional
//!   conformer dumping, and writes results back into a table.

pub mod screen;
