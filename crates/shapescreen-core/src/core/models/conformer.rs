use super::molecule::Molecule;
use nalgebra::Point3;
use std::sync::Arc;

/// One 3D embedding of a molecule.
///
/// `coords` is indexed like the molecule's atoms. Hydrogen positions may be
/// absent from the source, in which case the molecule carries them implicitly.
#[derive(Debug, Clone)]
pub struct Conformer {
    pub title: String,
    molecule: Arc<Molecule>,
    coords: Vec<Point3<f64>>,
}

impl Conformer {
    /// Pairs a molecule with coordinates, one per atom.
    ///
    /// Returns `None` when the coordinate count does not match the atom count.
    pub fn new(molecule: Arc<Molecule>, coords: Vec<Point3<f64>>) -> Option<Self> {
        if coords.len() != molecule.atom_count() {
            return None;
        }
        Some(Self {
            title: molecule.title.clone(),
            molecule,
            coords,
        })
    }

    pub fn molecule(&self) -> &Molecule {
        &self.molecule
    }

    pub fn coords(&self) -> &[Point3<f64>] {
        &self.coords
    }

    pub fn position(&self, atom: usize) -> Point3<f64> {
        self.coords[atom]
    }

    pub fn heavy_atom_positions(&self) -> Vec<Point3<f64>> {
        self.molecule
            .heavy_atom_indices()
            .map(|idx| self.coords[idx])
            .collect()
    }

    /// A conformer with no heavy atoms cannot be used as a shape query.
    pub fn is_degenerate(&self) -> bool {
        self.molecule.heavy_atom_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::element::by_symbol;
    use crate::core::models::molecule::{Atom, Bond, BondOrder};

    fn water() -> Arc<Molecule> {
        let o = Atom::new(by_symbol("O").unwrap());
        let h = Atom::new(by_symbol("H").unwrap());
        Arc::new(Molecule::new(
            "water",
            vec![o, h.clone(), h],
            vec![
                Bond::new(0, 1, BondOrder::Single),
                Bond::new(0, 2, BondOrder::Single),
            ],
        ))
    }

    #[test]
    fn new_rejects_mismatched_coordinate_count() {
        assert!(Conformer::new(water(), vec![Point3::origin()]).is_none());
    }

    #[test]
    fn heavy_atom_positions_skip_hydrogens() {
        let conf = Conformer::new(
            water(),
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.96, 0.0, 0.0),
                Point3::new(-0.24, 0.93, 0.0),
            ],
        )
        .unwrap();

        assert_eq!(conf.title, "water");
        assert_eq!(conf.heavy_atom_positions(), vec![Point3::origin()]);
        assert!(!conf.is_degenerate());
    }

    #[test]
    fn conformer_of_bare_hydrogens_is_degenerate() {
        let h = Atom::new(by_symbol("H").unwrap());
        let mol = Arc::new(Molecule::new(
            "H2",
            vec![h.clone(), h],
            vec![Bond::new(0, 1, BondOrder::Single)],
        ));
        let conf = Conformer::new(mol, vec![Point3::origin(), Point3::new(0.74, 0.0, 0.0)]).unwrap();
        assert!(conf.is_degenerate());
    }
}
