use crate::core::chem::rings::RingInfo;
use crate::core::models::conformer::Conformer;
use crate::core::models::molecule::{BondOrder, Molecule};
use crate::core::utils::geometry::centroid;
use nalgebra::Point3;

/// Pharmacophoric feature types. Only features of the same kind overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKind {
    Donor,
    Acceptor,
    Cation,
    Anion,
    Ring,
    Hydrophobe,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorFeature {
    pub kind: FeatureKind,
    pub position: Point3<f64>,
}

/// Types the colour features of a conformer.
pub fn perceive_features(conformer: &Conformer) -> Vec<ColorFeature> {
    let mol = conformer.molecule();
    let rings = RingInfo::perceive(mol);
    let mut features = Vec::new();

    for atom in mol.heavy_atom_indices() {
        let position = conformer.position(atom);
        for kind in atom_feature_kinds(mol, &rings, atom) {
            features.push(ColorFeature { kind, position });
        }
    }

    for ring in rings.aromatic_rings(mol) {
        let points: Vec<Point3<f64>> = ring.iter().map(|&a| conformer.position(a)).collect();
        if let Some(position) = centroid(&points) {
            features.push(ColorFeature {
                kind: FeatureKind::Ring,
                position,
            });
        }
    }

    features
}

fn atom_feature_kinds(mol: &Molecule, rings: &RingInfo, idx: usize) -> Vec<FeatureKind> {
    let atom = mol.atom(idx);
    let hydrogens = mol.total_hydrogens(idx);
    let mut kinds = Vec::new();

    match atom.atomic_number() {
        7 => {
            if hydrogens > 0 {
                kinds.push(FeatureKind::Donor);
            }
            let cationic = atom.formal_charge > 0 && !has_charged_neighbor(mol, idx, |c| c < 0);
            if cationic || is_basic_amine(mol, idx) {
                kinds.push(FeatureKind::Cation);
            } else if atom.formal_charge == 0 && is_nitrogen_acceptor(mol, idx) {
                kinds.push(FeatureKind::Acceptor);
            }
        }
        8 => {
            if hydrogens > 0 && !is_acid_oxygen(mol, idx) {
                kinds.push(FeatureKind::Donor);
            }
            if atom.formal_charge <= 0 {
                kinds.push(FeatureKind::Acceptor);
            }
            if atom.formal_charge < 0 && !has_charged_neighbor(mol, idx, |c| c > 0) {
                kinds.push(FeatureKind::Anion);
            }
        }
        6 if is_carboxylic_acid_carbon(mol, idx) => kinds.push(FeatureKind::Anion),
        6 if is_hydrophobic_carbon(mol, idx, rings) => kinds.push(FeatureKind::Hydrophobe),
        16 if atom.formal_charge == 0
            && hydrogens == 0
            && !mol.is_unsaturated(idx)
            && mol.degree(idx) == 2 =>
        {
            kinds.push(FeatureKind::Hydrophobe)
        }
        17 | 35 | 53 => kinds.push(FeatureKind::Hydrophobe),
        _ => {
            if atom.formal_charge > 0 {
                kinds.push(FeatureKind::Cation);
            } else if atom.formal_charge < 0 {
                kinds.push(FeatureKind::Anion);
            }
        }
    }
    kinds
}

fn has_charged_neighbor(mol: &Molecule, idx: usize, test: impl Fn(i8) -> bool) -> bool {
    mol.neighbors(idx)
        .iter()
        .any(|&(n, _)| test(mol.atom(n).formal_charge))
}

/// Neutral sp3 amine not bonded to anything unsaturated; protonated at pH 7.
fn is_basic_amine(mol: &Molecule, idx: usize) -> bool {
    let atom = mol.atom(idx);
    atom.formal_charge == 0
        && !atom.aromatic
        && !mol.is_unsaturated(idx)
        && mol
            .heavy_neighbors(idx)
            .all(|n| mol.atom(n).atomic_number() == 6 && !mol.is_unsaturated(n))
}

fn is_nitrogen_acceptor(mol: &Molecule, idx: usize) -> bool {
    let atom = mol.atom(idx);
    if mol.total_hydrogens(idx) > 0 {
        return false;
    }
    let has_triple = mol
        .neighbors(idx)
        .iter()
        .any(|&(_, b)| mol.bond(b).order == BondOrder::Triple);
    let aromatic_pyridine = atom.aromatic && mol.degree(idx) == 2;
    let imine = !atom.aromatic
        && mol
            .neighbors(idx)
            .iter()
            .any(|&(_, b)| mol.bond(b).order == BondOrder::Double);
    has_triple || aromatic_pyridine || imine
}

fn is_carbonyl_carbon(mol: &Molecule, idx: usize) -> bool {
    mol.neighbors(idx).iter().any(|&(n, b)| {
        mol.atom(n).atomic_number() == 8 && mol.bond(b).order == BondOrder::Double
    })
}

fn is_carboxylic_acid_carbon(mol: &Molecule, idx: usize) -> bool {
    is_carbonyl_carbon(mol, idx)
        && mol.neighbors(idx).iter().any(|&(n, b)| {
            let o = mol.atom(n);
            o.atomic_number() == 8
                && mol.bond(b).order == BondOrder::Single
                && (mol.total_hydrogens(n) == 1 || o.formal_charge == -1)
        })
}

fn is_acid_oxygen(mol: &Molecule, idx: usize) -> bool {
    mol.heavy_neighbors(idx)
        .any(|n| mol.atom(n).atomic_number() == 6 && is_carboxylic_acid_carbon(mol, n))
}

fn is_hydrophobic_carbon(mol: &Molecule, idx: usize, rings: &RingInfo) -> bool {
    let atom = mol.atom(idx);
    !atom.aromatic
        && atom.formal_charge == 0
        && !mol.is_unsaturated(idx)
        && !rings.is_ring_atom(idx)
        && mol.heavy_neighbors(idx).count() <= 2
        && mol
            .heavy_neighbors(idx)
            .all(|n| matches!(mol.atom(n).atomic_number(), 6 | 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles::parse_smiles;
    use std::sync::Arc;

    fn kinds_of(smiles: &str) -> Vec<FeatureKind> {
        let mol = Arc::new(parse_smiles(smiles).unwrap());
        let coords = vec![Point3::origin(); mol.atom_count()];
        let conformer = Conformer::new(mol, coords).unwrap();
        let mut kinds: Vec<FeatureKind> = perceive_features(&conformer)
            .into_iter()
            .map(|f| f.kind)
            .collect();
        kinds.sort();
        kinds
    }

    #[test]
    fn ethanol_has_donor_acceptor_and_hydrophobe() {
        assert_eq!(
            kinds_of("CCO"),
            vec![
                FeatureKind::Donor,
                FeatureKind::Acceptor,
                FeatureKind::Hydrophobe
            ]
        );
    }

    #[test]
    fn carboxylic_acid_is_an_anion() {
        let kinds = kinds_of("CC(=O)O");
        assert!(kinds.contains(&FeatureKind::Anion));
        assert!(!kinds.contains(&FeatureKind::Donor));
    }

    #[test]
    fn aliphatic_amine_is_a_cation_but_aniline_is_not() {
        assert!(kinds_of("CCN").contains(&FeatureKind::Cation));
        assert!(!kinds_of("Nc1ccccc1").contains(&FeatureKind::Cation));
    }

    #[test]
    fn aromatic_rings_contribute_one_ring_feature_each() {
        let kinds = kinds_of("c1ccccc1-c1ccncc1");
        assert_eq!(kinds.iter().filter(|&&k| k == FeatureKind::Ring).count(), 2);
        assert_eq!(kinds.iter().filter(|&&k| k == FeatureKind::Acceptor).count(), 1);
    }

    #[test]
    fn halogens_are_hydrophobes() {
        assert_eq!(kinds_of("Cl"), vec![FeatureKind::Hydrophobe]);
    }
}
