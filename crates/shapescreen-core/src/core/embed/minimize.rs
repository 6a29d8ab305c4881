use super::bounds::BoundsMatrix;
use nalgebra::{Point3, Vector3};

const CHIRAL_WEIGHT: f64 = 1.0;
const CONVERGED_ENERGY: f64 = 1e-8;
const MIN_STEP: f64 = 1e-7;

/// Target sign of the signed volume spanned by four neighbour positions.
///
/// A slot of `None` stands for an implicit hydrogen and uses the centre's
/// own position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiralConstraint {
    pub center: usize,
    pub neighbors: [Option<usize>; 4],
    /// `+1.0` for clockwise, `-1.0` for counter-clockwise.
    pub sign: f64,
    pub min_volume: f64,
}

impl ChiralConstraint {
    fn slot(&self, idx: usize) -> usize {
        self.neighbors[idx].unwrap_or(self.center)
    }

    pub fn volume(&self, coords: &[Point3<f64>]) -> f64 {
        let p0 = coords[self.slot(0)];
        let a = coords[self.slot(1)] - p0;
        let b = coords[self.slot(2)] - p0;
        let c = coords[self.slot(3)] - p0;
        a.dot(&b.cross(&c))
    }
}

/// Distance-geometry error function: squared bound violations plus
/// chiral-volume penalties.
pub struct DgObjective<'a> {
    bounds: &'a BoundsMatrix,
    chirals: &'a [ChiralConstraint],
}

impl<'a> DgObjective<'a> {
    pub fn new(bounds: &'a BoundsMatrix, chirals: &'a [ChiralConstraint]) -> Self {
        Self { bounds, chirals }
    }

    pub fn energy(&self, coords: &[Point3<f64>]) -> f64 {
        self.evaluate(coords, None)
    }

    fn evaluate(&self, coords: &[Point3<f64>], mut gradient: Option<&mut [Vector3<f64>]>) -> f64 {
        if let Some(g) = gradient.as_deref_mut() {
            g.iter_mut().for_each(|v| *v = Vector3::zeros());
        }
        let n = coords.len();
        let mut energy = 0.0;

        for i in 0..n {
            for j in (i + 1)..n {
                let diff = coords[i] - coords[j];
                let d2 = diff.norm_squared();
                let upper2 = self.bounds.upper(i, j).powi(2);
                let lower2 = self.bounds.lower(i, j).powi(2);

                let d_energy_d_d2 = if d2 > upper2 && upper2 > 0.0 {
                    let v = d2 / upper2 - 1.0;
                    energy += v * v;
                    2.0 * v / upper2
                } else if d2 < lower2 {
                    let denom = lower2 + d2;
                    let v = 2.0 * lower2 / denom - 1.0;
                    energy += v * v;
                    2.0 * v * (-2.0 * lower2 / (denom * denom))
                } else {
                    continue;
                };

                if let Some(g) = gradient.as_deref_mut() {
                    let step = diff * (2.0 * d_energy_d_d2);
                    g[i] += step;
                    g[j] -= step;
                }
            }
        }

        for chiral in self.chirals {
            let volume = chiral.volume(coords);
            let deficit = chiral.min_volume - chiral.sign * volume;
            if deficit <= 0.0 {
                continue;
            }
            energy += CHIRAL_WEIGHT * deficit * deficit;

            if let Some(g) = gradient.as_deref_mut() {
                let d_energy_d_volume = -2.0 * CHIRAL_WEIGHT * deficit * chiral.sign;
                let p0 = coords[chiral.slot(0)];
                let a = coords[chiral.slot(1)] - p0;
                let b = coords[chiral.slot(2)] - p0;
                let c = coords[chiral.slot(3)] - p0;
                let ga = b.cross(&c);
                let gb = c.cross(&a);
                let gc = a.cross(&b);
                g[chiral.slot(1)] += ga * d_energy_d_volume;
                g[chiral.slot(2)] += gb * d_energy_d_volume;
                g[chiral.slot(3)] += gc * d_energy_d_volume;
                g[chiral.slot(0)] -= (ga + gb + gc) * d_energy_d_volume;
            }
        }

        energy
    }

    /// Steepest descent with an adaptive step. Returns the final energy.
    pub fn minimize(&self, coords: &mut [Point3<f64>], max_iterations: usize) -> f64 {
        let mut gradient = vec![Vector3::zeros(); coords.len()];
        let mut energy = self.evaluate(coords, Some(&mut gradient));
        let mut step = 0.05;
        let mut trial = coords.to_vec();

        for _ in 0..max_iterations {
            if energy < CONVERGED_ENERGY || step < MIN_STEP {
                break;
            }
            let norm = gradient.iter().map(|g| g.norm_squared()).sum::<f64>().sqrt();
            if norm < 1e-12 {
                break;
            }
            for ((t, c), g) in trial.iter_mut().zip(coords.iter()).zip(&gradient) {
                *t = c - g * (step / norm);
            }
            let trial_energy = self.energy(&trial);
            if trial_energy < energy {
                coords.copy_from_slice(&trial);
                energy = self.evaluate(coords, Some(&mut gradient));
                step *= 1.2;
            } else {
                step *= 0.5;
            }
        }
        energy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::rings::RingInfo;
    use crate::core::chem::smiles::parse_smiles;

    #[test]
    fn energy_is_zero_inside_bounds() {
        let mol = parse_smiles("CC").unwrap();
        let bounds = BoundsMatrix::build(&mol, &RingInfo::perceive(&mol));
        let objective = DgObjective::new(&bounds, &[]);
        let coords = [Point3::origin(), Point3::new(1.52, 0.0, 0.0)];
        assert_eq!(objective.energy(&coords), 0.0);
    }

    #[test]
    fn minimize_pulls_stretched_bond_into_bounds() {
        let mol = parse_smiles("CC").unwrap();
        let bounds = BoundsMatrix::build(&mol, &RingInfo::perceive(&mol));
        let objective = DgObjective::new(&bounds, &[]);
        let mut coords = [Point3::origin(), Point3::new(3.0, 0.0, 0.0)];

        let before = objective.energy(&coords);
        let after = objective.minimize(&mut coords, 500);

        assert!(after < before);
        let d = (coords[0] - coords[1]).norm();
        assert!((d - 1.52).abs() < 0.05, "distance {d}");
    }

    #[test]
    fn chiral_penalty_vanishes_for_correct_sign() {
        let coords = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let clockwise = ChiralConstraint {
            center: 0,
            neighbors: [None, Some(1), Some(2), Some(3)],
            sign: 1.0,
            min_volume: 0.5,
        };
        assert!((clockwise.volume(&coords) - 1.0).abs() < 1e-12);

        let mol = parse_smiles("C.C.C.C").unwrap();
        let bounds = BoundsMatrix::build(&mol, &RingInfo::perceive(&mol));
        let wrong = ChiralConstraint {
            sign: -1.0,
            ..clockwise
        };
        let correct = [clockwise];
        let inverted = [wrong];
        let ok = DgObjective::new(&bounds, &correct);
        let bad = DgObjective::new(&bounds, &inverted);
        assert!(bad.energy(&coords) > ok.energy(&coords));
    }
}
