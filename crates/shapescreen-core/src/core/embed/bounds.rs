use crate::core::chem::rings::RingInfo;
use crate::core::models::molecule::{BondOrder, Molecule};
use nalgebra::DMatrix;
use std::collections::VecDeque;

const BOND_TOLERANCE: f64 = 0.03;
const ANGLE_TOLERANCE: f64 = 0.06;
const TORSION_TOLERANCE: f64 = 0.08;
const VDW_SCALE: f64 = 0.7;
const UNBOUNDED: f64 = 100.0;
/// Slack between separate fragments so they sit near each other.
const FRAGMENT_GAP: f64 = 4.0;

/// Lower and upper interatomic distance bounds, in Ångström.
#[derive(Debug, Clone)]
pub struct BoundsMatrix {
    lower: DMatrix<f64>,
    upper: DMatrix<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Separation {
    Unset,
    Bond,
    Angle,
    Torsion,
}

impl BoundsMatrix {
    pub fn build(mol: &Molecule, rings: &RingInfo) -> Self {
        let n = mol.atom_count();
        let mut bounds = Self {
            lower: DMatrix::zeros(n, n),
            upper: DMatrix::from_element(n, n, UNBOUNDED),
        };
        for i in 0..n {
            bounds.upper[(i, i)] = 0.0;
        }
        let mut separation = vec![vec![Separation::Unset; n]; n];

        for (bond_idx, bond) in mol.bonds().iter().enumerate() {
            let length = bond_length(mol, bond_idx);
            bounds.set(bond.begin, bond.end, length - BOND_TOLERANCE, length + BOND_TOLERANCE);
            separation[bond.begin][bond.end] = Separation::Bond;
            separation[bond.end][bond.begin] = Separation::Bond;
        }

        for j in 0..n {
            let neighbors = mol.neighbors(j);
            for (a, &(i, _)) in neighbors.iter().enumerate() {
                for &(k, _) in &neighbors[a + 1..] {
                    if separation[i][k] != Separation::Unset {
                        continue;
                    }
                    let d = angle_distance(mol, rings, i, j, k);
                    bounds.set(i, k, d - ANGLE_TOLERANCE, d + ANGLE_TOLERANCE);
                    separation[i][k] = Separation::Angle;
                    separation[k][i] = Separation::Angle;
                }
            }
        }

        for (bond_idx, bond) in mol.bonds().iter().enumerate() {
            let (j, k) = (bond.begin, bond.end);
            for &(i, _) in mol.neighbors(j) {
                if i == k {
                    continue;
                }
                for &(l, _) in mol.neighbors(k) {
                    if l == j || l == i || separation[i][l] != Separation::Unset {
                        continue;
                    }
                    let (lo, hi) = torsion_bounds(mol, rings, bond_idx, i, j, k, l);
                    bounds.set(i, l, lo, hi);
                    separation[i][l] = Separation::Torsion;
                    separation[l][i] = Separation::Torsion;
                }
            }
        }

        for i in 0..n {
            for j in (i + 1)..n {
                if separation[i][j] == Separation::Unset {
                    let vdw = mol.atom(i).element.vdw_radius + mol.atom(j).element.vdw_radius;
                    bounds.lower[(i, j)] = vdw * VDW_SCALE;
                    bounds.lower[(j, i)] = vdw * VDW_SCALE;
                }
            }
        }

        bounds.smooth();
        bounds.tie_fragments(&components(mol));
        bounds
    }

    pub fn len(&self) -> usize {
        self.lower.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn lower(&self, i: usize, j: usize) -> f64 {
        self.lower[(i, j)]
    }

    pub fn upper(&self, i: usize, j: usize) -> f64 {
        self.upper[(i, j)]
    }

    fn set(&mut self, i: usize, j: usize, lower: f64, upper: f64) {
        let lower = lower.max(0.0);
        self.lower[(i, j)] = lower;
        self.lower[(j, i)] = lower;
        self.upper[(i, j)] = upper;
        self.upper[(j, i)] = upper;
    }

    /// Floyd-Warshall triangle smoothing. Crossed bounds collapse to their mean.
    fn smooth(&mut self) {
        let n = self.len();
        for k in 0..n {
            for i in 0..n {
                if i == k {
                    continue;
                }
                for j in (i + 1)..n {
                    if j == k {
                        continue;
                    }
                    let via = self.upper[(i, k)] + self.upper[(k, j)];
                    if via < self.upper[(i, j)] {
                        self.upper[(i, j)] = via;
                        self.upper[(j, i)] = via;
                    }
                    let gap = (self.lower[(i, k)] - self.upper[(k, j)])
                        .max(self.lower[(j, k)] - self.upper[(k, i)]);
                    if gap > self.lower[(i, j)] {
                        self.lower[(i, j)] = gap;
                        self.lower[(j, i)] = gap;
                    }
                }
            }
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if self.lower[(i, j)] > self.upper[(i, j)] {
                    let mean = 0.5 * (self.lower[(i, j)] + self.upper[(i, j)]);
                    self.set(i, j, mean, mean);
                }
            }
        }
    }

    fn tie_fragments(&mut self, component: &[usize]) {
        let n = self.len();
        for i in 0..n {
            for j in (i + 1)..n {
                if component[i] != component[j] {
                    let lower = self.lower[(i, j)];
                    self.set(i, j, lower, lower + FRAGMENT_GAP);
                }
            }
        }
    }
}

/// Ideal bond length from covalent radii, shortened for multiple bonds.
pub fn bond_length(mol: &Molecule, bond_idx: usize) -> f64 {
    let bond = mol.bond(bond_idx);
    let sum = mol.atom(bond.begin).element.covalent_radius
        + mol.atom(bond.end).element.covalent_radius;
    let scale = match bond.order {
        BondOrder::Single => 1.0,
        BondOrder::Aromatic => 0.92,
        BondOrder::Double => 0.87,
        BondOrder::Triple => 0.78,
    };
    sum * scale
}

fn ideal_length(mol: &Molecule, a: usize, b: usize) -> f64 {
    mol.bond_between(a, b)
        .map(|bond_idx| bond_length(mol, bond_idx))
        .unwrap_or(1.5)
}

/// Ideal angle i-j-k in radians.
fn ideal_angle(mol: &Molecule, rings: &RingInfo, i: usize, j: usize, k: usize) -> f64 {
    let ring_size = rings
        .rings()
        .iter()
        .filter(|ring| ring.contains(&i) && ring.contains(&j) && ring.contains(&k))
        .map(Vec::len)
        .min();
    let planar = mol.atom(j).aromatic || mol.is_unsaturated(j);
    if let Some(size) = ring_size {
        if size <= 5 || (planar && size <= 8) {
            return ((size as f64 - 2.0) * 180.0 / size as f64).to_radians();
        }
    }

    let orders: Vec<BondOrder> = mol
        .neighbors(j)
        .iter()
        .map(|&(_, b)| mol.bond(b).order)
        .collect();
    let doubles = orders.iter().filter(|&&o| o == BondOrder::Double).count();
    let linear = orders.contains(&BondOrder::Triple) || doubles >= 2;
    let degrees = if linear {
        180.0
    } else if planar {
        120.0
    } else {
        109.5
    };
    f64::to_radians(degrees)
}

fn angle_distance(mol: &Molecule, rings: &RingInfo, i: usize, j: usize, k: usize) -> f64 {
    let a = ideal_length(mol, i, j);
    let b = ideal_length(mol, j, k);
    let theta = ideal_angle(mol, rings, i, j, k);
    (a * a + b * b - 2.0 * a * b * theta.cos()).sqrt()
}

/// Distance between i and l for torsion `phi` (degrees) about the j-k bond.
fn torsion_distance(mol: &Molecule, rings: &RingInfo, i: usize, j: usize, k: usize, l: usize, phi: f64) -> f64 {
    let d_ij = ideal_length(mol, i, j);
    let d_jk = ideal_length(mol, j, k);
    let d_kl = ideal_length(mol, k, l);
    let t1 = ideal_angle(mol, rings, i, j, k);
    let t2 = ideal_angle(mol, rings, j, k, l);
    let phi = phi.to_radians();

    let pi = [d_ij * t1.cos(), d_ij * t1.sin(), 0.0];
    let pl = [
        d_jk - d_kl * t2.cos(),
        d_kl * t2.sin() * phi.cos(),
        d_kl * t2.sin() * phi.sin(),
    ];
    pi.iter()
        .zip(&pl)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt()
}

fn torsion_bounds(
    mol: &Molecule,
    rings: &RingInfo,
    bond_idx: usize,
    i: usize,
    j: usize,
    k: usize,
    l: usize,
) -> (f64, f64) {
    let bond = mol.bond(bond_idx);
    let cis = torsion_distance(mol, rings, i, j, k, l, 0.0);
    let trans = torsion_distance(mol, rings, i, j, k, l, 180.0);
    let tight = |d: f64| (d - TORSION_TOLERANCE, d + TORSION_TOLERANCE);

    let ring_with = |atoms: [usize; 3]| -> Vec<usize> {
        rings
            .rings()
            .iter()
            .enumerate()
            .filter(|(_, ring)| atoms.iter().all(|a| ring.contains(a)))
            .map(|(idx, _)| idx)
            .collect()
    };
    let rings_i = ring_with([i, j, k]);
    let rings_l = ring_with([j, k, l]);
    let same_ring = rings_i.iter().any(|r| rings_l.contains(r));

    let planar_bond = bond.order == BondOrder::Aromatic
        || (bond.order == BondOrder::Double && rings.is_ring_bond(bond_idx));
    if planar_bond {
        let is_cis = same_ring || (rings_i.is_empty() && rings_l.is_empty());
        return tight(if is_cis { cis } else { trans });
    }

    if bond.order == BondOrder::Double {
        if let Some((begin_ref, end_ref)) = bond.stereo.references() {
            let (ref_j, ref_k) = if j == bond.begin {
                (begin_ref, end_ref)
            } else {
                (end_ref, begin_ref)
            };
            let is_cis = bond.stereo.is_cis() ^ (i != ref_j) ^ (l != ref_k);
            return tight(if is_cis { cis } else { trans });
        }
        return (cis - TORSION_TOLERANCE, trans + TORSION_TOLERANCE);
    }

    if same_ring {
        let gauche = torsion_distance(mol, rings, i, j, k, l, 75.0);
        return (cis - TORSION_TOLERANCE, gauche);
    }
    (cis - TORSION_TOLERANCE, trans + TORSION_TOLERANCE)
}

fn components(mol: &Molecule) -> Vec<usize> {
    let mut component = vec![usize::MAX; mol.atom_count()];
    let mut next = 0;
    for start in 0..mol.atom_count() {
        if component[start] != usize::MAX {
            continue;
        }
        component[start] = next;
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &(n, _) in mol.neighbors(current) {
                if component[n] == usize::MAX {
                    component[n] = next;
                    queue.push_back(n);
                }
            }
        }
        next += 1;
    }
    component
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles::parse_smiles;

    fn bounds_for(smiles: &str) -> (Molecule, BoundsMatrix) {
        let mol = parse_smiles(smiles).unwrap();
        let rings = RingInfo::perceive(&mol);
        let bounds = BoundsMatrix::build(&mol, &rings);
        (mol, bounds)
    }

    #[test]
    fn bonded_pairs_are_tight_around_covalent_length() {
        let (_, bounds) = bounds_for("CC");
        assert!((bounds.lower(0, 1) - 1.49).abs() < 1e-9);
        assert!((bounds.upper(0, 1) - 1.55).abs() < 1e-9);
    }

    #[test]
    fn double_bonds_are_shorter_than_single_bonds() {
        let (mol, _) = bounds_for("C=CC");
        assert!(bond_length(&mol, 0) < bond_length(&mol, 1));
    }

    #[test]
    fn all_bounds_are_ordered_and_symmetric() {
        let (_, bounds) = bounds_for("CC(=O)Nc1ccc(O)cc1");
        for i in 0..bounds.len() {
            for j in 0..bounds.len() {
                assert!(bounds.lower(i, j) <= bounds.upper(i, j) + 1e-12);
                assert_eq!(bounds.lower(i, j), bounds.lower(j, i));
                assert_eq!(bounds.upper(i, j), bounds.upper(j, i));
            }
        }
    }

    #[test]
    fn aromatic_para_atoms_are_fixed_across_the_ring() {
        let (_, bounds) = bounds_for("c1ccccc1");
        let mid = 0.5 * (bounds.lower(0, 3) + bounds.upper(0, 3));
        assert!((2.5..3.0).contains(&mid), "para distance {mid}");
    }

    #[test]
    fn trans_double_bond_separates_substituents_further_than_cis() {
        let (_, trans) = bounds_for("C/C=C/C");
        let (_, cis) = bounds_for("C/C=C\\C");
        assert!(trans.lower(0, 3) > cis.upper(0, 3));
    }

    #[test]
    fn fragments_are_kept_within_a_fixed_gap() {
        let (_, bounds) = bounds_for("C.C");
        assert!((bounds.upper(0, 1) - bounds.lower(0, 1) - FRAGMENT_GAP).abs() < 1e-9);
    }
}
