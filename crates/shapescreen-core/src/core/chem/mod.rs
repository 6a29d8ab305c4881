//! Cheminformatics on molecular graphs: SMILES parsing, ring perception and
//! stereo handling.

pub mod rings;
pub mod smiles;
pub mod stereo;
