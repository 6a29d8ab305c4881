//! # Core Module
//!
//! This module provides the fundamental data structures and algorithms that
//! the screening engine is built from. Everything here is stateless: it turns
//! molecules into other representations and never keeps state between calls.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Elements, molecular graphs with stereo annotations, and 3D conformers
//! - **Cheminformatics** ([`chem`]) - SMILES parsing, ring perception, stereo perception and stereoisomer enumeration
//! - **3D Embedding** ([`embed`]) - Distance-geometry construction of coordinates from a molecular graph
//! - **Shape Similarity** ([`shape`]) - Gaussian volume models, colour features and rigid-body overlay
//! - **File I/O** ([`io`]) - SD files, SMILES lists and delimited screening tables
//! - **Geometry** ([`utils`]) - Small vector-algebra helpers shared by the layers above
//!
//! ## Scientific Foundation
//!
//! - **Distance geometry** with triangle-smoothed bounds and metric-matrix embedding
//! - **Gaussian shape overlap** following the first-order approximation of hard-sphere volumes
//! - **Pharmacophoric colour** typing in the spirit of the Mills–Dean feature scheme

pub mod chem;
pub mod embed;
pub mod io;
pub mod models;
pub mod shape;
pub mod utils;
