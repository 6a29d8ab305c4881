//! Provides input/output for molecular and tabular file formats.
//!
//! Multi-record molecule files (SD files and plain SMILES lists) implement
//! the shared [`traits::MolecularFile`] interface. Screening tables are
//! handled separately by [`table::MoleculeTable`], which keeps every cell
//! as text so that unrelated columns survive a round trip unchanged.

pub mod sdf;
pub mod smi;
pub mod table;
pub mod traits;
