//! Ring perception: smallest set of smallest rings plus per-bond ring data.

use crate::core::models::molecule::Molecule;
use std::collections::VecDeque;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RingInfo {
    /// Rings as atom cycles, smallest first.
    rings: Vec<Vec<usize>>,
    /// Size of the smallest cycle through each bond; `None` for chain bonds.
    smallest_bond_ring: Vec<Option<usize>>,
    atom_in_ring: Vec<bool>,
}

impl RingInfo {
    pub fn perceive(mol: &Molecule) -> Self {
        let mut smallest_bond_ring = vec![None; mol.bond_count()];
        let mut candidates: Vec<Vec<usize>> = Vec::new();

        for (bond_idx, bond) in mol.bonds().iter().enumerate() {
            let Some(mut cycle) = shortest_path_avoiding(mol, bond.begin, bond.end, bond_idx)
            else {
                continue;
            };
            smallest_bond_ring[bond_idx] = Some(cycle.len());
            normalize_ring(&mut cycle);
            if !candidates.contains(&cycle) {
                candidates.push(cycle);
            }
        }
        candidates.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        let expected = cyclomatic_number(mol);
        let mut basis: Vec<Vec<bool>> = Vec::new();
        let mut rings = Vec::new();
        for cycle in candidates {
            if rings.len() == expected {
                break;
            }
            let edges = edge_vector(mol, &cycle);
            if is_independent(&basis, &edges) {
                basis.push(edges);
                rings.push(cycle);
            }
        }

        let mut atom_in_ring = vec![false; mol.atom_count()];
        for (bond_idx, bond) in mol.bonds().iter().enumerate() {
            if smallest_bond_ring[bond_idx].is_some() {
                atom_in_ring[bond.begin] = true;
                atom_in_ring[bond.end] = true;
            }
        }

        Self {
            rings,
            smallest_bond_ring,
            atom_in_ring,
        }
    }

    pub fn rings(&self) -> &[Vec<usize>] {
        &self.rings
    }

    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    pub fn is_ring_atom(&self, atom: usize) -> bool {
        self.atom_in_ring[atom]
    }

    pub fn is_ring_bond(&self, bond: usize) -> bool {
        self.smallest_bond_ring[bond].is_some()
    }

    pub fn smallest_ring_with_bond(&self, bond: usize) -> Option<usize> {
        self.smallest_bond_ring[bond]
    }

    /// Whether atoms `a` and `b` are both members of one SSSR ring.
    pub fn share_ring(&self, a: usize, b: usize) -> bool {
        self.rings
            .iter()
            .any(|ring| ring.contains(&a) && ring.contains(&b))
    }

    /// Rings whose atoms are all aromatic.
    pub fn aromatic_rings<'a>(&'a self, mol: &'a Molecule) -> impl Iterator<Item = &'a [usize]> {
        self.rings
            .iter()
            .filter(|ring| ring.iter().all(|&a| mol.atom(a).aromatic))
            .map(Vec::as_slice)
    }
}

fn cyclomatic_number(mol: &Molecule) -> usize {
    let mut visited = vec![false; mol.atom_count()];
    let mut components = 0;
    for start in 0..mol.atom_count() {
        if visited[start] {
            continue;
        }
        components += 1;
        visited[start] = true;
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &(n, _) in mol.neighbors(current) {
                if !visited[n] {
                    visited[n] = true;
                    queue.push_back(n);
                }
            }
        }
    }
    (mol.bond_count() + components).saturating_sub(mol.atom_count())
}

/// BFS path from `start` to `end` that does not use `excluded_bond`.
fn shortest_path_avoiding(
    mol: &Molecule,
    start: usize,
    end: usize,
    excluded_bond: usize,
) -> Option<Vec<usize>> {
    let mut parent = vec![usize::MAX; mol.atom_count()];
    let mut visited = vec![false; mol.atom_count()];
    visited[start] = true;
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        if current == end {
            let mut path = vec![end];
            let mut node = end;
            while node != start {
                node = parent[node];
                path.push(node);
            }
            path.reverse();
            return Some(path);
        }
        for &(n, bond_idx) in mol.neighbors(current) {
            if bond_idx != excluded_bond && !visited[n] {
                visited[n] = true;
                parent[n] = current;
                queue.push_back(n);
            }
        }
    }
    None
}

/// Rotates the smallest index to the front and picks the smaller direction.
fn normalize_ring(ring: &mut [usize]) {
    let Some(min_pos) = ring
        .iter()
        .enumerate()
        .min_by_key(|&(_, &v)| v)
        .map(|(pos, _)| pos)
    else {
        return;
    };
    ring.rotate_left(min_pos);
    let n = ring.len();
    if n > 2 && ring[n - 1] < ring[1] {
        ring[1..].reverse();
    }
}

fn edge_vector(mol: &Molecule, cycle: &[usize]) -> Vec<bool> {
    let mut edges = vec![false; mol.bond_count()];
    for (i, &a) in cycle.iter().enumerate() {
        let b = cycle[(i + 1) % cycle.len()];
        if let Some(bond_idx) = mol.bond_between(a, b) {
            edges[bond_idx] = true;
        }
    }
    edges
}

/// Gaussian elimination over GF(2).
fn is_independent(basis: &[Vec<bool>], candidate: &[bool]) -> bool {
    let mut rows: Vec<Vec<bool>> = basis.to_vec();
    rows.push(candidate.to_vec());
    let columns = candidate.len();
    let mut rank = 0;
    for col in 0..columns {
        let Some(pivot) = (rank..rows.len()).find(|&r| rows[r][col]) else {
            continue;
        };
        rows.swap(rank, pivot);
        for r in 0..rows.len() {
            if r != rank && rows[r][col] {
                for c in col..columns {
                    let bit = rows[rank][c];
                    rows[r][c] ^= bit;
                }
            }
        }
        rank += 1;
    }
    rank == rows.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles::parse_smiles;

    #[test]
    fn benzene_has_one_six_membered_ring() {
        let mol = parse_smiles("c1ccccc1").unwrap();
        let info = RingInfo::perceive(&mol);
        assert_eq!(info.ring_count(), 1);
        assert_eq!(info.rings()[0], vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(info.aromatic_rings(&mol).count(), 1);
    }

    #[test]
    fn naphthalene_fusion_bond_reports_six() {
        let mol = parse_smiles("c1ccc2ccccc2c1").unwrap();
        let info = RingInfo::perceive(&mol);
        assert_eq!(info.ring_count(), 2);
        assert!(info.rings().iter().all(|r| r.len() == 6));
        let fusion = mol.bond_between(3, 8).unwrap();
        assert_eq!(info.smallest_ring_with_bond(fusion), Some(6));
    }

    #[test]
    fn linker_between_rings_is_not_a_ring_bond() {
        let mol = parse_smiles("C1CC1CCC1CC1").unwrap();
        let info = RingInfo::perceive(&mol);
        assert_eq!(info.ring_count(), 2);
        assert!(!info.is_ring_atom(3));
        assert!(!info.is_ring_bond(mol.bond_between(2, 3).unwrap()));
        assert!(info.is_ring_atom(2));
    }

    #[test]
    fn spiro_centre_belongs_to_both_rings() {
        let mol = parse_smiles("C1CCC12CCC2").unwrap();
        let info = RingInfo::perceive(&mol);
        assert_eq!(info.ring_count(), 2);
        assert!(info.rings().iter().all(|r| r.len() == 4 && r.contains(&3)));
        assert!(!info.share_ring(0, 5));
    }

    #[test]
    fn acyclic_molecule_has_no_rings() {
        let mol = parse_smiles("CCCC").unwrap();
        let info = RingInfo::perceive(&mol);
        assert_eq!(info.ring_count(), 0);
        assert!(!info.is_ring_atom(0));
        assert!(!info.share_ring(0, 1));
    }
}
