use nalgebra::{Point3, Rotation3, Vector3};
use std::f64::consts::PI;

/// Exponent argument beyond which a pair contributes nothing measurable.
const NEGLIGIBLE_EXPONENT: f64 = 30.0;

/// Parameters that fix how atoms and features become Gaussians.
///
/// Two shape models are only comparable when built with equal parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParameters {
    /// Gaussian height; `2√2` reproduces hard-sphere volumes well.
    pub prefactor: f64,
    /// Radius used for every colour-feature Gaussian.
    pub color_radius: f64,
}

impl Default for ShapeParameters {
    fn default() -> Self {
        Self {
            prefactor: 2.0 * std::f64::consts::SQRT_2,
            color_radius: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    pub center: Point3<f64>,
    pub alpha: f64,
    pub weight: f64,
}

impl Gaussian {
    /// A Gaussian whose integral matches a sphere of `radius` at height `prefactor`.
    pub fn sphere(center: Point3<f64>, radius: f64, prefactor: f64) -> Self {
        let alpha = PI * (3.0 * prefactor / (4.0 * PI * radius.powi(3))).powf(2.0 / 3.0);
        Self {
            center,
            alpha,
            weight: prefactor,
        }
    }

    pub fn transformed(&self, rotation: &Rotation3<f64>, translation: &Vector3<f64>) -> Self {
        Self {
            center: rotation * self.center + translation,
            ..*self
        }
    }

    /// Analytic integral of the product of two Gaussians.
    pub fn overlap(&self, other: &Gaussian) -> f64 {
        let sum = self.alpha + other.alpha;
        let d2 = (self.center - other.center).norm_squared();
        let exponent = self.alpha * other.alpha * d2 / sum;
        if exponent > NEGLIGIBLE_EXPONENT {
            return 0.0;
        }
        self.weight * other.weight * (PI / sum).powf(1.5) * (-exponent).exp()
    }
}

/// First-order overlap volume of two Gaussian sets.
pub fn overlap_volume(a: &[Gaussian], b: &[Gaussian]) -> f64 {
    a.iter()
        .map(|ga| b.iter().map(|gb| ga.overlap(gb)).sum::<f64>())
        .sum()
}

/// `O_ab / (O_aa + O_bb - O_ab)`, or zero when both sets are empty.
pub fn tanimoto(overlap: f64, self_a: f64, self_b: f64) -> f64 {
    let denominator = self_a + self_b - overlap;
    if denominator <= f64::EPSILON {
        return 0.0;
    }
    (overlap / denominator).clamp(0.0, 1.0)
}
