use super::element::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Effective bond order used for bond-length estimates.
    pub fn multiplicity(self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }

    /// Integer valence contribution; aromatic bonds count as one.
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }

    pub fn from_ctfile(code: u8) -> Option<Self> {
        match code {
            1 => Some(BondOrder::Single),
            2 => Some(BondOrder::Double),
            3 => Some(BondOrder::Triple),
            4 => Some(BondOrder::Aromatic),
            _ => None,
        }
    }

    pub fn to_ctfile(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Aromatic => 4,
        }
    }
}

/// A neighbour slot around a tetrahedral centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StereoRef {
    Atom(usize),
    ImplicitHydrogen,
}

/// Rotation sense of `neighbors[1..4]` when viewed from `neighbors[0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

impl Winding {
    pub fn flipped(self) -> Self {
        match self {
            Winding::Clockwise => Winding::CounterClockwise,
            Winding::CounterClockwise => Winding::Clockwise,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Chirality {
    #[default]
    Unspecified,
    Tetrahedral {
        neighbors: [StereoRef; 4],
        winding: Winding,
    },
}

impl Chirality {
    pub fn is_specified(&self) -> bool {
        !matches!(self, Chirality::Unspecified)
    }
}

/// Double-bond configuration relative to one reference substituent on each end.
///
/// `begin_ref` is bonded to the bond's `begin` atom, `end_ref` to its `end` atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondStereo {
    #[default]
    None,
    Cis { begin_ref: usize, end_ref: usize },
    Trans { begin_ref: usize, end_ref: usize },
}

impl BondStereo {
    pub fn is_specified(&self) -> bool {
        !matches!(self, BondStereo::None)
    }

    pub fn references(&self) -> Option<(usize, usize)> {
        match *self {
            BondStereo::None => None,
            BondStereo::Cis { begin_ref, end_ref } | BondStereo::Trans { begin_ref, end_ref } => {
                Some((begin_ref, end_ref))
            }
        }
    }

    pub fn is_cis(&self) -> bool {
        matches!(self, BondStereo::Cis { .. })
    }

    pub fn flipped(self) -> Self {
        match self {
            BondStereo::None => BondStereo::None,
            BondStereo::Cis { begin_ref, end_ref } => BondStereo::Trans { begin_ref, end_ref },
            BondStereo::Trans { begin_ref, end_ref } => BondStereo::Cis { begin_ref, end_ref },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: &'static Element,
    pub formal_charge: i8,
    pub isotope: Option<u16>,
    pub aromatic: bool,
    pub implicit_hydrogens: u8,
    pub chirality: Chirality,
}

impl Atom {
    pub fn new(element: &'static Element) -> Self {
        Self {
            element,
            formal_charge: 0,
            isotope: None,
            aromatic: false,
            implicit_hydrogens: 0,
            chirality: Chirality::Unspecified,
        }
    }

    pub fn atomic_number(&self) -> u8 {
        self.element.atomic_number
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
    pub stereo: BondStereo,
}

impl Bond {
    pub fn new(begin: usize, end: usize, order: BondOrder) -> Self {
        Self {
            begin,
            end,
            order,
            stereo: BondStereo::None,
        }
    }

    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom {
            self.end
        } else {
            self.begin
        }
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.begin == atom || self.end == atom
    }
}

/// A molecular graph. Adjacency lists preserve bond insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub title: String,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl Molecule {
    pub fn new(title: impl Into<String>, atoms: Vec<Atom>, bonds: Vec<Bond>) -> Self {
        let mut adjacency = vec![Vec::new(); atoms.len()];
        for (bond_idx, bond) in bonds.iter().enumerate() {
            adjacency[bond.begin].push((bond.end, bond_idx));
            adjacency[bond.end].push((bond.begin, bond_idx));
        }
        Self {
            title: title.into(),
            atoms,
            bonds,
            adjacency,
        }
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn atom(&self, idx: usize) -> &Atom {
        &self.atoms[idx]
    }

    pub fn bond(&self, idx: usize) -> &Bond {
        &self.bonds[idx]
    }

    pub fn atom_mut(&mut self, idx: usize) -> &mut Atom {
        &mut self.atoms[idx]
    }

    pub fn bond_mut(&mut self, idx: usize) -> &mut Bond {
        &mut self.bonds[idx]
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// `(neighbor, bond_idx)` pairs in bond insertion order.
    pub fn neighbors(&self, atom: usize) -> &[(usize, usize)] {
        &self.adjacency[atom]
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<usize> {
        self.adjacency[a]
            .iter()
            .find(|&&(n, _)| n == b)
            .map(|&(_, bond_idx)| bond_idx)
    }

    pub fn heavy_atom_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, atom)| !atom.element.is_hydrogen())
            .map(|(idx, _)| idx)
    }

    pub fn heavy_atom_count(&self) -> usize {
        self.heavy_atom_indices().count()
    }

    /// Implicit hydrogens plus explicit hydrogen neighbours.
    pub fn total_hydrogens(&self, atom: usize) -> usize {
        let explicit = self.adjacency[atom]
            .iter()
            .filter(|&&(n, _)| self.atoms[n].element.is_hydrogen())
            .count();
        explicit + self.atoms[atom].implicit_hydrogens as usize
    }

    pub fn heavy_neighbors(&self, atom: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[atom]
            .iter()
            .map(|&(n, _)| n)
            .filter(|&n| !self.atoms[n].element.is_hydrogen())
    }

    /// Whether the atom carries a double, triple or aromatic bond.
    pub fn is_unsaturated(&self, atom: usize) -> bool {
        self.atoms[atom].aromatic
            || self.adjacency[atom]
                .iter()
                .any(|&(_, b)| self.bonds[b].order != BondOrder::Single)
    }

    /// Flags the hydrogens [`Self::without_explicit_hydrogens`] would remove.
    pub fn foldable_hydrogens(&self) -> Vec<bool> {
        self.atoms
            .iter()
            .enumerate()
            .map(|(idx, atom)| {
                atom.element.is_hydrogen()
                    && atom.isotope.is_none()
                    && atom.formal_charge == 0
                    && self.adjacency[idx].len() == 1
                    && !self.atoms[self.adjacency[idx][0].0].element.is_hydrogen()
            })
            .collect()
    }

    /// Removes hydrogens that can be expressed as implicit counts.
    ///
    /// A hydrogen is removed when it is not isotope-labelled, carries no charge
    /// and has exactly one heavy neighbour. Stereo references to removed atoms
    /// are rewritten to implicit references (tetrahedral) or moved to the
    /// remaining substituent (double bonds).
    pub fn without_explicit_hydrogens(&self) -> Molecule {
        let removable = self.foldable_hydrogens();
        if !removable.iter().any(|&r| r) {
            return self.clone();
        }

        let mut remap = vec![usize::MAX; self.atoms.len()];
        let mut atoms = Vec::with_capacity(self.atoms.len());
        for (idx, atom) in self.atoms.iter().enumerate() {
            if !removable[idx] {
                remap[idx] = atoms.len();
                atoms.push(atom.clone());
            }
        }

        for idx in (0..self.atoms.len()).filter(|&idx| removable[idx]) {
            let parent = self.adjacency[idx][0].0;
            atoms[remap[parent]].implicit_hydrogens += 1;
        }

        for (old_idx, atom) in self.atoms.iter().enumerate() {
            if removable[old_idx] {
                continue;
            }
            if let Chirality::Tetrahedral { neighbors, winding } = &atom.chirality {
                let mut rewritten = *neighbors;
                for slot in rewritten.iter_mut() {
                    if let StereoRef::Atom(n) = *slot {
                        *slot = if removable[n] {
                            StereoRef::ImplicitHydrogen
                        } else {
                            StereoRef::Atom(remap[n])
                        };
                    }
                }
                let implicit_slots = rewritten
                    .iter()
                    .filter(|r| **r == StereoRef::ImplicitHydrogen)
                    .count();
                atoms[remap[old_idx]].chirality = if implicit_slots <= 1 {
                    Chirality::Tetrahedral {
                        neighbors: rewritten,
                        winding: *winding,
                    }
                } else {
                    Chirality::Unspecified
                };
            }
        }

        let mut bonds = Vec::with_capacity(self.bonds.len());
        for bond in &self.bonds {
            if removable[bond.begin] || removable[bond.end] {
                continue;
            }
            let stereo = self.rewrite_bond_stereo(bond, &removable, &remap);
            bonds.push(Bond {
                begin: remap[bond.begin],
                end: remap[bond.end],
                order: bond.order,
                stereo,
            });
        }

        Molecule::new(self.title.clone(), atoms, bonds)
    }

    fn rewrite_bond_stereo(&self, bond: &Bond, removable: &[bool], remap: &[usize]) -> BondStereo {
        let Some((begin_ref, end_ref)) = bond.stereo.references() else {
            return BondStereo::None;
        };
        let mut stereo = bond.stereo;
        let mut replace = |atom: usize, reference: usize, across: usize| -> Option<usize> {
            if !removable[reference] {
                return Some(remap[reference]);
            }
            let alternative = self.adjacency[atom]
                .iter()
                .map(|&(n, _)| n)
                .find(|&n| n != reference && n != across && !removable[n])?;
            stereo = stereo.flipped();
            Some(remap[alternative])
        };
        let (Some(new_begin), Some(new_end)) = (
            replace(bond.begin, begin_ref, bond.end),
            replace(bond.end, end_ref, bond.begin),
        ) else {
            return BondStereo::None;
        };
        match stereo {
            BondStereo::Cis { .. } => BondStereo::Cis {
                begin_ref: new_begin,
                end_ref: new_end,
            },
            BondStereo::Trans { .. } => BondStereo::Trans {
                begin_ref: new_begin,
                end_ref: new_end,
            },
            BondStereo::None => BondStereo::None,
        }
    }
}
