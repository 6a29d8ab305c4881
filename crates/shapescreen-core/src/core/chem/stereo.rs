//! Stereo perception and stereoisomer enumeration.
//!
//! Candidate tetrahedral centres and double bonds are found from graph
//! symmetry classes; [`StereoFlipper`] then enumerates their configurations
//! lazily, one molecule per variant.

use super::rings::RingInfo;
use crate::core::models::molecule::{
    BondOrder, BondStereo, Chirality, Molecule, StereoRef, Winding,
};
use std::collections::HashMap;
use std::hash::Hash;

/// Smallest ring that can hold a trans double bond without strain.
const MIN_STEREO_RING_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StereoElement {
    Center(usize),
    DoubleBond(usize),
}

impl StereoElement {
    fn anchor(&self, mol: &Molecule) -> usize {
        match *self {
            StereoElement::Center(atom) => atom,
            StereoElement::DoubleBond(bond) => mol.bond(bond).begin.min(mol.bond(bond).end),
        }
    }

    pub fn is_specified(&self, mol: &Molecule) -> bool {
        match *self {
            StereoElement::Center(atom) => mol.atom(atom).chirality.is_specified(),
            StereoElement::DoubleBond(bond) => mol.bond(bond).stereo.is_specified(),
        }
    }
}

/// Graph symmetry classes by iterative invariant refinement.
///
/// Atoms with equal classes are topologically equivalent as far as the
/// refinement can tell.
pub fn symmetry_classes(mol: &Molecule) -> Vec<usize> {
    let initial: Vec<(u8, usize, usize, i8, bool, u16)> = (0..mol.atom_count())
        .map(|idx| {
            let atom = mol.atom(idx);
            (
                atom.atomic_number(),
                mol.degree(idx),
                mol.total_hydrogens(idx),
                atom.formal_charge,
                atom.aromatic,
                atom.isotope.unwrap_or(0),
            )
        })
        .collect();
    let mut classes = dense_ranks(&initial);

    loop {
        let refined: Vec<(usize, Vec<(usize, u8)>)> = (0..mol.atom_count())
            .map(|idx| {
                let mut env: Vec<(usize, u8)> = mol
                    .neighbors(idx)
                    .iter()
                    .map(|&(n, b)| (classes[n], mol.bond(b).order.to_ctfile()))
                    .collect();
                env.sort_unstable();
                (classes[idx], env)
            })
            .collect();
        let next = dense_ranks(&refined);
        let count = |c: &[usize]| c.iter().max().map_or(0, |m| m + 1);
        if count(&next) == count(&classes) {
            return next;
        }
        classes = next;
    }
}

fn dense_ranks<T: Ord + Hash + Clone>(keys: &[T]) -> Vec<usize> {
    let mut sorted: Vec<T> = keys.to_vec();
    sorted.sort();
    sorted.dedup();
    let index: HashMap<&T, usize> = sorted.iter().enumerate().map(|(i, k)| (k, i)).collect();
    keys.iter().map(|k| index[k]).collect()
}

/// Finds atoms and bonds that can carry stereo, ordered by lowest atom index.
pub fn perceive(mol: &Molecule, rings: &RingInfo) -> Vec<StereoElement> {
    let classes = symmetry_classes(mol);
    let mut elements: Vec<StereoElement> = Vec::new();

    for atom in 0..mol.atom_count() {
        if is_tetrahedral_center(mol, atom, &classes) {
            elements.push(StereoElement::Center(atom));
        }
    }
    for (bond_idx, bond) in mol.bonds().iter().enumerate() {
        if bond.order != BondOrder::Double
            || mol.atom(bond.begin).aromatic
            || mol.atom(bond.end).aromatic
        {
            continue;
        }
        if rings
            .smallest_ring_with_bond(bond_idx)
            .is_some_and(|size| size < MIN_STEREO_RING_SIZE)
        {
            continue;
        }
        if has_distinct_substituents(mol, bond.begin, bond.end, &classes)
            && has_distinct_substituents(mol, bond.end, bond.begin, &classes)
        {
            elements.push(StereoElement::DoubleBond(bond_idx));
        }
    }

    elements.sort_by_key(|e| (e.anchor(mol), matches!(e, StereoElement::DoubleBond(_))));
    elements
}

fn is_tetrahedral_center(mol: &Molecule, atom: usize, classes: &[usize]) -> bool {
    let a = mol.atom(atom);
    let eligible = match a.atomic_number() {
        6 | 14 | 32 => a.formal_charge == 0,
        7 | 15 => a.formal_charge == 1,
        _ => false,
    };
    if !eligible || a.aromatic {
        return false;
    }
    let hydrogens = mol.total_hydrogens(atom);
    let heavy: Vec<usize> = mol.heavy_neighbors(atom).collect();
    if heavy.len() + hydrogens != 4 || hydrogens > 1 {
        return false;
    }
    if mol
        .neighbors(atom)
        .iter()
        .any(|&(_, b)| mol.bond(b).order != BondOrder::Single)
    {
        return false;
    }
    let mut seen: Vec<usize> = heavy.iter().map(|&n| classes[n]).collect();
    seen.sort_unstable();
    seen.windows(2).all(|w| w[0] != w[1])
}

fn has_distinct_substituents(mol: &Molecule, end: usize, across: usize, classes: &[usize]) -> bool {
    let others: Vec<usize> = mol.heavy_neighbors(end).filter(|&n| n != across).collect();
    let hydrogens = mol.total_hydrogens(end);
    match (others.len(), hydrogens) {
        (1, 0) | (1, 1) => true,
        (2, 0) => classes[others[0]] != classes[others[1]],
        _ => false,
    }
}

/// Lazily enumerates stereoisomers over a fixed set of stereo elements.
///
/// Variant `n` sets element `i` according to bit `i` of `n`. Bit zero keeps
/// a configuration that was already specified, so variant 0 reproduces the
/// input wherever the input was explicit.
#[derive(Debug, Clone)]
pub struct StereoFlipper {
    base: Molecule,
    elements: Vec<StereoElement>,
    next: u64,
    total: u64,
}

impl StereoFlipper {
    /// * `max_centers` - at most this many elements are enumerated; further
    ///   elements keep their input configuration.
    /// * `force_flip` - also enumerate elements the input already specified.
    pub fn new(mol: &Molecule, max_centers: usize, force_flip: bool) -> Self {
        let rings = RingInfo::perceive(mol);
        let elements: Vec<StereoElement> = perceive(mol, &rings)
            .into_iter()
            .filter(|e| force_flip || !e.is_specified(mol))
            .take(max_centers.min(63))
            .collect();
        let total = 1u64 << elements.len();
        Self {
            base: mol.clone(),
            elements,
            next: 0,
            total,
        }
    }

    pub fn elements(&self) -> &[StereoElement] {
        &self.elements
    }

    pub fn variant_count(&self) -> u64 {
        self.total
    }

    fn build(&self, variant: u64) -> Molecule {
        let mut mol = self.base.clone();
        for (bit, element) in self.elements.iter().enumerate() {
            let flip = variant & (1 << bit) != 0;
            match *element {
                StereoElement::Center(atom) => {
                    let chirality = match &self.base.atom(atom).chirality {
                        Chirality::Tetrahedral { neighbors, winding } => Chirality::Tetrahedral {
                            neighbors: *neighbors,
                            winding: if flip { winding.flipped() } else { *winding },
                        },
                        Chirality::Unspecified => Chirality::Tetrahedral {
                            neighbors: default_neighbors(&self.base, atom),
                            winding: if flip {
                                Winding::Clockwise
                            } else {
                                Winding::CounterClockwise
                            },
                        },
                    };
                    mol.atom_mut(atom).chirality = chirality;
                }
                StereoElement::DoubleBond(bond_idx) => {
                    let current = self.base.bond(bond_idx).stereo;
                    let stereo = if current.is_specified() {
                        if flip { current.flipped() } else { current }
                    } else {
                        let bond = self.base.bond(bond_idx);
                        let begin_ref = first_substituent(&self.base, bond.begin, bond.end);
                        let end_ref = first_substituent(&self.base, bond.end, bond.begin);
                        match (begin_ref, end_ref, flip) {
                            (Some(begin_ref), Some(end_ref), false) => {
                                BondStereo::Trans { begin_ref, end_ref }
                            }
                            (Some(begin_ref), Some(end_ref), true) => {
                                BondStereo::Cis { begin_ref, end_ref }
                            }
                            _ => BondStereo::None,
                        }
                    };
                    mol.bond_mut(bond_idx).stereo = stereo;
                }
            }
        }
        mol
    }
}

impl Iterator for StereoFlipper {
    type Item = Molecule;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let mol = self.build(self.next);
        self.next += 1;
        Some(mol)
    }
}

/// Neighbour order for a centre the input left unspecified.
fn default_neighbors(mol: &Molecule, atom: usize) -> [StereoRef; 4] {
    let mut refs = [StereoRef::ImplicitHydrogen; 4];
    for (slot, &(n, _)) in refs.iter_mut().zip(mol.neighbors(atom)) {
        *slot = StereoRef::Atom(n);
    }
    refs
}

fn first_substituent(mol: &Molecule, end: usize, across: usize) -> Option<usize> {
    mol.heavy_neighbors(end).find(|&n| n != across)
}
