//! Distance-geometry embedding of molecular graphs into 3D.
//!
//! The pipeline follows the classic metric-matrix approach:
//!
//! 1. [`bounds::BoundsMatrix`] derives lower and upper distance bounds from
//!    the graph (bonds, angles, torsions, van der Waals contacts) and
//!    smooths them against the triangle inequality.
//! 2. Distances are sampled between the bounds with a seeded RNG and turned
//!    into coordinates through the top three eigenpairs of the metric matrix.
//! 3. [`minimize::DgObjective`] refines the coordinates against bound
//!    violations and tetrahedral chiral volumes.
//! 4. The result is checked against bond lengths and every specified stereo
//!    element; failing attempts are retried with fresh random draws.
//!
//! Only the atoms present in the graph are placed. Implicit hydrogens stay
//! implicit.

pub mod bounds;
pub mod minimize;

use crate::core::chem::rings::RingInfo;
use crate::core::models::molecule::{BondOrder, Chirality, Molecule, StereoRef, Winding};
use crate::core::utils::geometry::dihedral;
use bounds::BoundsMatrix;
use minimize::{ChiralConstraint, DgObjective};
use nalgebra::{DMatrix, Point3, SymmetricEigen};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, trace};

const BOND_CHECK_TOLERANCE: f64 = 0.25;
const INITIAL_JITTER: f64 = 0.15;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmbedError {
    #[error("Cannot embed a molecule without atoms")]
    EmptyMolecule,
    #[error("Embedding failed after {attempts} attempt(s): {reason}")]
    Failed { attempts: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedOptions {
    pub max_attempts: usize,
    pub random_seed: u64,
    pub max_iterations: usize,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            random_seed: 42,
            max_iterations: 1000,
        }
    }
}

/// Embeds `mol`, returning one coordinate per atom.
///
/// Deterministic for a given `random_seed`.
pub fn embed(mol: &Molecule, options: &EmbedOptions) -> Result<Vec<Point3<f64>>, EmbedError> {
    let n = mol.atom_count();
    if n == 0 {
        return Err(EmbedError::EmptyMolecule);
    }
    if n == 1 {
        return Ok(vec![Point3::origin()]);
    }

    let rings = RingInfo::perceive(mol);
    let bounds = BoundsMatrix::build(mol, &rings);
    let chirals = chiral_constraints(mol);
    let objective = DgObjective::new(&bounds, &chirals);
    let mut rng = StdRng::seed_from_u64(options.random_seed);

    let attempts = options.max_attempts.max(1);
    let mut last_reason = String::new();
    for attempt in 1..=attempts {
        let mut coords = initial_coordinates(&bounds, &mut rng);
        let energy = objective.minimize(&mut coords, options.max_iterations);
        match validate(mol, &bounds, &chirals, &coords) {
            Ok(()) => {
                trace!(attempt, energy, "Embedding accepted");
                return Ok(coords);
            }
            Err(reason) => {
                debug!(attempt, energy, %reason, "Embedding attempt rejected");
                last_reason = reason;
            }
        }
    }

    Err(EmbedError::Failed {
        attempts,
        reason: last_reason,
    })
}

fn chiral_constraints(mol: &Molecule) -> Vec<ChiralConstraint> {
    (0..mol.atom_count())
        .filter_map(|center| {
            let Chirality::Tetrahedral { neighbors, winding } = &mol.atom(center).chirality else {
                return None;
            };
            let slots = (*neighbors).map(|r| match r {
                StereoRef::Atom(idx) => Some(idx),
                StereoRef::ImplicitHydrogen => None,
            });
            let has_implicit = slots.iter().any(Option::is_none);
            Some(ChiralConstraint {
                center,
                neighbors: slots,
                sign: match winding {
                    Winding::Clockwise => 1.0,
                    Winding::CounterClockwise => -1.0,
                },
                min_volume: if has_implicit { 0.7 } else { 2.0 },
            })
        })
        .collect()
}

fn initial_coordinates(bounds: &BoundsMatrix, rng: &mut StdRng) -> Vec<Point3<f64>> {
    let n = bounds.len();
    let mut d2 = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let (lo, hi) = (bounds.lower(i, j), bounds.upper(i, j));
            let d = if hi > lo { rng.gen_range(lo..hi) } else { lo };
            d2[(i, j)] = d * d;
            d2[(j, i)] = d * d;
        }
    }

    // Squared distances of each point from the centroid.
    let total: f64 = (0..n)
        .flat_map(|j| ((j + 1)..n).map(move |k| (j, k)))
        .map(|(j, k)| d2[(j, k)])
        .sum();
    let nf = n as f64;
    let from_center: Vec<f64> = (0..n)
        .map(|i| d2.row(i).sum() / nf - total / (nf * nf))
        .collect();

    let metric = DMatrix::from_fn(n, n, |i, j| 0.5 * (from_center[i] + from_center[j] - d2[(i, j)]));
    let eigen = SymmetricEigen::new(metric);
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    (0..n)
        .map(|i| {
            let mut xyz = [0.0; 3];
            for (axis, &col) in order.iter().take(3).enumerate() {
                let scale = eigen.eigenvalues[col].max(0.0).sqrt();
                xyz[axis] = scale * eigen.eigenvectors[(i, col)];
            }
            for v in &mut xyz {
                *v += rng.gen_range(-INITIAL_JITTER..INITIAL_JITTER);
            }
            Point3::new(xyz[0], xyz[1], xyz[2])
        })
        .collect()
}

fn validate(
    mol: &Molecule,
    bounds: &BoundsMatrix,
    chirals: &[ChiralConstraint],
    coords: &[Point3<f64>],
) -> Result<(), String> {
    if coords.iter().any(|p| !p.coords.iter().all(|v| v.is_finite())) {
        return Err("non-finite coordinates".to_string());
    }

    for bond in mol.bonds() {
        let d = (coords[bond.begin] - coords[bond.end]).norm();
        let lo = bounds.lower(bond.begin, bond.end) - BOND_CHECK_TOLERANCE;
        let hi = bounds.upper(bond.begin, bond.end) + BOND_CHECK_TOLERANCE;
        if d < lo || d > hi {
            return Err(format!(
                "bond {}-{} has length {d:.2}",
                bond.begin, bond.end
            ));
        }
    }

    for chiral in chirals {
        if chiral.sign * chiral.volume(coords) <= 0.0 {
            return Err(format!("atom {} has inverted chirality", chiral.center));
        }
    }

    for bond in mol.bonds() {
        if bond.order != BondOrder::Double {
            continue;
        }
        let Some((begin_ref, end_ref)) = bond.stereo.references() else {
            continue;
        };
        let torsion = dihedral(
            &coords[begin_ref],
            &coords[bond.begin],
            &coords[bond.end],
            &coords[end_ref],
        );
        if (torsion.abs() < 90.0) != bond.stereo.is_cis() {
            return Err(format!(
                "double bond {}-{} has the wrong configuration",
                bond.begin, bond.end
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles::parse_smiles;
    use crate::core::utils::geometry::signed_volume;

    fn embed_smiles(smiles: &str) -> (Molecule, Vec<Point3<f64>>) {
        let mol = parse_smiles(smiles).unwrap();
        let coords = embed(&mol, &EmbedOptions::default()).unwrap();
        (mol, coords)
    }

    #[test]
    fn embeds_ethanol_with_reasonable_bond_lengths() {
        let (mol, coords) = embed_smiles("CCO");
        assert_eq!(coords.len(), 3);
        for bond in mol.bonds() {
            let d = (coords[bond.begin] - coords[bond.end]).norm();
            assert!((1.2..1.8).contains(&d), "bond length {d}");
        }
    }

    #[test]
    fn embedding_is_deterministic_for_a_seed() {
        let mol = parse_smiles("CC(=O)Nc1ccc(O)cc1").unwrap();
        let a = embed(&mol, &EmbedOptions::default()).unwrap();
        let b = embed(&mol, &EmbedOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn single_atom_sits_at_origin() {
        let (_, coords) = embed_smiles("[Na+]");
        assert_eq!(coords, vec![Point3::origin()]);
    }

    #[test]
    fn empty_molecule_is_rejected() {
        let mol = Molecule::new("", Vec::new(), Vec::new());
        assert_eq!(
            embed(&mol, &EmbedOptions::default()),
            Err(EmbedError::EmptyMolecule)
        );
    }

    #[test]
    fn enantiomers_embed_with_opposite_volumes() {
        let (_, left) = embed_smiles("F[C@](Cl)(Br)I");
        let (_, right) = embed_smiles("F[C@@](Cl)(Br)I");
        let v_left = signed_volume(&left[0], &left[2], &left[3], &left[4]);
        let v_right = signed_volume(&right[0], &right[2], &right[3], &right[4]);
        assert!(v_left < 0.0, "counter-clockwise volume {v_left}");
        assert!(v_right > 0.0, "clockwise volume {v_right}");
    }

    #[test]
    fn double_bond_configuration_is_honoured() {
        let (_, trans) = embed_smiles("C/C=C/C");
        let (_, cis) = embed_smiles("C/C=C\\C");
        assert!(dihedral(&trans[0], &trans[1], &trans[2], &trans[3]).abs() > 90.0);
        assert!(dihedral(&cis[0], &cis[1], &cis[2], &cis[3]).abs() < 90.0);
    }

    #[test]
    fn benzene_stays_planar() {
        let (_, coords) = embed_smiles("c1ccccc1");
        for i in 0..6 {
            let t = dihedral(
                &coords[i],
                &coords[(i + 1) % 6],
                &coords[(i + 2) % 6],
                &coords[(i + 3) % 6],
            );
            assert!(t.abs() < 20.0, "ring torsion {t}");
        }
    }
}
