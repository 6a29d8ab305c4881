//! Molecular data models: the element table, the molecular graph with its
//! stereo annotations, and 3D conformers.

pub mod conformer;
pub mod element;
pub mod molecule;
