use super::features::{FeatureKind, perceive_features};
use super::gaussian::{Gaussian, ShapeParameters, overlap_volume, tanimoto};
use crate::core::models::conformer::Conformer;
use crate::core::utils::geometry::{principal_frame, rotation_from_axis_angle};
use nalgebra::{Matrix3, Point3, Rotation3, Vector3};

const INITIAL_ANGLE_STEP: f64 = 10.0;
const MIN_ANGLE_STEP: f64 = 0.5;
const INITIAL_SHIFT_STEP: f64 = 0.5;
const MIN_IMPROVEMENT: f64 = 1e-9;

/// A conformer reduced to Gaussians in its own principal frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeModel {
    atoms: Vec<Gaussian>,
    features: Vec<(FeatureKind, Gaussian)>,
    self_shape: f64,
    self_color: f64,
}

impl ShapeModel {
    /// Returns `None` for conformers without heavy atoms.
    pub fn from_conformer(conformer: &Conformer, params: &ShapeParameters) -> Option<Self> {
        if conformer.is_degenerate() {
            return None;
        }
        let mol = conformer.molecule();
        let heavy: Vec<usize> = mol.heavy_atom_indices().collect();
        let positions = conformer.heavy_atom_positions();
        let (center, rotation) = principal_frame(&positions, &vec![1.0; positions.len()])?;
        let to_frame = |p: Point3<f64>| Point3::from(rotation * (p - center));

        let atoms: Vec<Gaussian> = heavy
            .iter()
            .zip(&positions)
            .map(|(&a, &p)| {
                Gaussian::sphere(to_frame(p), mol.atom(a).element.vdw_radius, params.prefactor)
            })
            .collect();

        let mut features: Vec<(FeatureKind, Gaussian)> = perceive_features(conformer)
            .into_iter()
            .map(|f| {
                (
                    f.kind,
                    Gaussian::sphere(to_frame(f.position), params.color_radius, params.prefactor),
                )
            })
            .collect();
        features.sort_by_key(|(kind, _)| *kind);

        let self_shape = overlap_volume(&atoms, &atoms);
        let self_color = color_overlap(&features, &features);
        Some(Self {
            atoms,
            features,
            self_shape,
            self_color,
        })
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn self_overlap(&self) -> f64 {
        self.self_shape
    }

    fn transformed(&self, rotation: &Rotation3<f64>, translation: &Vector3<f64>) -> Self {
        Self {
            atoms: self
                .atoms
                .iter()
                .map(|g| g.transformed(rotation, translation))
                .collect(),
            features: self
                .features
                .iter()
                .map(|(kind, g)| (*kind, g.transformed(rotation, translation)))
                .collect(),
            self_shape: self.self_shape,
            self_color: self.self_color,
        }
    }
}

fn color_overlap(a: &[(FeatureKind, Gaussian)], b: &[(FeatureKind, Gaussian)]) -> f64 {
    a.iter()
        .map(|(ka, ga)| {
            b.iter()
                .filter(|(kb, _)| kb == ka)
                .map(|(_, gb)| ga.overlap(gb))
                .sum::<f64>()
        })
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayOptions {
    pub color: bool,
    pub optimize: bool,
    pub max_iterations: usize,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            color: true,
            optimize: true,
            max_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayScore {
    pub shape_tanimoto: f64,
    pub color_tanimoto: f64,
    /// Shape plus colour Tanimoto, or shape alone when colour is disabled.
    pub tanimoto_combo: f64,
}

fn score(query: &ShapeModel, reference: &ShapeModel, color: bool) -> OverlayScore {
    let shape_tanimoto = tanimoto(
        overlap_volume(&query.atoms, &reference.atoms),
        query.self_shape,
        reference.self_shape,
    );
    let color_tanimoto = if color {
        tanimoto(
            color_overlap(&query.features, &reference.features),
            query.self_color,
            reference.self_color,
        )
    } else {
        0.0
    };
    OverlayScore {
        shape_tanimoto,
        color_tanimoto,
        tanimoto_combo: shape_tanimoto + color_tanimoto,
    }
}

/// The four proper rotations that map principal axes onto themselves.
fn axis_flips() -> [Rotation3<f64>; 4] {
    [
        Vector3::new(1.0, 1.0, 1.0),
        Vector3::new(1.0, -1.0, -1.0),
        Vector3::new(-1.0, 1.0, -1.0),
        Vector3::new(-1.0, -1.0, 1.0),
    ]
    .map(|d| Rotation3::from_matrix_unchecked(Matrix3::from_diagonal(&d)))
}

/// Finds the rigid placement of `query` that maximises the combo score
/// against `reference`. Both models live in their principal frames, so the
/// search starts from each axis flip and hill-climbs from there.
pub fn best_overlay(query: &ShapeModel, reference: &ShapeModel, options: &OverlayOptions) -> OverlayScore {
    let mut best: Option<OverlayScore> = None;
    for flip in axis_flips() {
        let result = if options.optimize {
            climb(query, reference, flip, options)
        } else {
            score(&query.transformed(&flip, &Vector3::zeros()), reference, options.color)
        };
        if best.is_none_or(|b| result.tanimoto_combo > b.tanimoto_combo + MIN_IMPROVEMENT) {
            best = Some(result);
        }
    }
    best.unwrap_or(OverlayScore {
        shape_tanimoto: 0.0,
        color_tanimoto: 0.0,
        tanimoto_combo: 0.0,
    })
}

fn climb(
    query: &ShapeModel,
    reference: &ShapeModel,
    start: Rotation3<f64>,
    options: &OverlayOptions,
) -> OverlayScore {
    let mut rotation = start;
    let mut translation = Vector3::zeros();
    let mut best = score(&query.transformed(&rotation, &translation), reference, options.color);
    let mut angle = INITIAL_ANGLE_STEP;
    let mut shift = INITIAL_SHIFT_STEP;
    let axes = [Vector3::x(), Vector3::y(), Vector3::z()];

    for _ in 0..options.max_iterations {
        let mut improved = false;
        for axis in &axes {
            for sign in [1.0, -1.0] {
                let turned = rotation_from_axis_angle(axis, sign * angle) * rotation;
                let candidate = score(&query.transformed(&turned, &translation), reference, options.color);
                if candidate.tanimoto_combo > best.tanimoto_combo + MIN_IMPROVEMENT {
                    best = candidate;
                    rotation = turned;
                    improved = true;
                }

                let moved = translation + axis * (sign * shift);
                let candidate = score(&query.transformed(&rotation, &moved), reference, options.color);
                if candidate.tanimoto_combo > best.tanimoto_combo + MIN_IMPROVEMENT {
                    best = candidate;
                    translation = moved;
                    improved = true;
                }
            }
        }
        if !improved {
            angle *= 0.5;
            shift *= 0.5;
            if angle < MIN_ANGLE_STEP {
                break;
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::smiles::parse_smiles;
    use crate::core::embed::{EmbedOptions, embed};
    use std::sync::Arc;

    fn model(smiles: &str) -> ShapeModel {
        let mol = Arc::new(parse_smiles(smiles).unwrap());
        let coords = embed(&mol, &EmbedOptions::default()).unwrap();
        let conformer = Conformer::new(mol, coords).unwrap();
        ShapeModel::from_conformer(&conformer, &ShapeParameters::default()).unwrap()
    }

    #[test]
    fn model_counts_heavy_atoms_and_features() {
        let ethanol = model("CCO");
        assert_eq!(ethanol.atom_count(), 3);
        assert!(ethanol.feature_count() >= 1);
        assert!(ethanol.self_overlap() > 0.0);
        assert!(model("CCCCCCO").self_overlap() > ethanol.self_overlap());
    }

    #[test]
    fn hydrogen_only_conformer_has_no_model() {
        let mol = Arc::new(parse_smiles("[H][H]").unwrap());
        let coords = vec![Point3::origin(); mol.atom_count()];
        let conformer = Conformer::new(mol, coords).unwrap();
        assert!(conformer.is_degenerate());
        assert!(ShapeModel::from_conformer(&conformer, &ShapeParameters::default()).is_none());
    }

    #[test]
    fn self_overlay_scores_near_two() {
        let m = model("CC(=O)Nc1ccc(O)cc1");
        let result = best_overlay(&m, &m, &OverlayOptions::default());
        assert!(result.tanimoto_combo > 1.95, "combo {}", result.tanimoto_combo);
        assert!(result.shape_tanimoto <= 1.0);
    }

    #[test]
    fn dissimilar_molecules_score_lower_than_self() {
        let query = model("CCO");
        let small = model("CCO");
        let large = model("c1ccc2ccccc2c1CCCCCC");
        let options = OverlayOptions::default();
        let same = best_overlay(&query, &small, &options);
        let different = best_overlay(&query, &large, &options);
        assert!(same.tanimoto_combo > different.tanimoto_combo);
        assert!(same.tanimoto_combo > 1.5);
    }

    #[test]
    fn disabling_color_limits_combo_to_shape() {
        let m = model("CCO");
        let options = OverlayOptions {
            color: false,
            ..OverlayOptions::default()
        };
        let result = best_overlay(&m, &m, &options);
        assert_eq!(result.color_tanimoto, 0.0);
        assert_eq!(result.tanimoto_combo, result.shape_tanimoto);
        assert!(result.tanimoto_combo <= 1.0);
    }

    #[test]
    fn optimization_never_lowers_the_start_score() {
        let a = model("CCCCO");
        let b = model("CCCCN");
        let fixed = best_overlay(
            &a,
            &b,
            &OverlayOptions {
                optimize: false,
                ..OverlayOptions::default()
            },
        );
        let climbed = best_overlay(&a, &b, &OverlayOptions::default());
        assert!(climbed.tanimoto_combo >= fixed.tanimoto_combo);
    }

    #[test]
    fn molecule_without_heavy_atoms_has_no_model() {
        let mol = Arc::new(parse_smiles("[H][H]").unwrap());
        let conformer = Conformer::new(mol.clone(), vec![Point3::origin(); mol.atom_count()]).unwrap();
        assert!(ShapeModel::from_conformer(&conformer, &ShapeParameters::default()).is_none());
    }
}
