//! Gaussian shape and colour similarity.
//!
//! Heavy atoms are modelled as spherical Gaussians sized by their van der
//! Waals radius, and pharmacophoric features as unit Gaussians that only
//! overlap features of the same [`features::FeatureKind`]. Two molecules are
//! compared by the Tanimoto of their overlap volumes after a rigid-body
//! [`overlay`] search.

pub mod features;
pub mod gaussian;
pub mod overlay;
