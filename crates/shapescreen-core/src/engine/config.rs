use crate::core::shape::gaussian::ShapeParameters;
use thiserror::Error;

/// Stereo elements beyond this count cannot be addressed by a 64-bit variant index.
const STEREO_CENTER_LIMIT: usize = 63;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Settings of the distance-geometry conformer generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub max_stereo_centers: usize,
    pub force_flip: bool,
    pub embed_attempts: usize,
    pub random_seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_stereo_centers: 12,
            force_flip: true,
            embed_attempts: 10,
            random_seed: 42,
        }
    }
}

/// Settings of the Gaussian overlay scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringConfig {
    pub color: bool,
    pub optimize_overlay: bool,
    pub shape: ShapeParameters,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            color: true,
            optimize_overlay: true,
            shape: ShapeParameters::default(),
        }
    }
}

/// Per-row behaviour of a screening run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningConfig {
    pub generator: GeneratorConfig,
    pub scoring: ScoringConfig,
    pub enumerate_isomers: bool,
    /// Conformers kept per query; `None` keeps every stereoisomer.
    pub max_isomers: Option<usize>,
    pub top_hits: usize,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            scoring: ScoringConfig::default(),
            enumerate_isomers: true,
            max_isomers: Some(1),
            top_hits: 1,
        }
    }
}

/// Options used while loading and indexing a shape database.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatabaseOptions {
    pub shape: ShapeParameters,
    /// Used to embed SMILES-format databases at load time.
    pub generator: GeneratorConfig,
}

#[derive(Default)]
pub struct ScreeningConfigBuilder {
    enumerate_isomers: Option<bool>,
    max_isomers: Option<usize>,
    max_stereo_centers: Option<usize>,
    force_flip: Option<bool>,
    embed_attempts: Option<usize>,
    random_seed: Option<u64>,
    top_hits: Option<usize>,
    color: Option<bool>,
    optimize_overlay: Option<bool>,
    shape: Option<ShapeParameters>,
}

impl ScreeningConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enumerate_isomers(mut self, enabled: bool) -> Self {
        self.enumerate_isomers = Some(enabled);
        self
    }
    /// `0` keeps every generated stereoisomer.
    pub fn max_isomers(mut self, n: usize) -> Self {
        self.max_isomers = Some(n);
        self
    }
    pub fn max_stereo_centers(mut self, n: usize) -> Self {
        self.max_stereo_centers = Some(n);
        self
    }
    pub fn force_flip(mut self, enabled: bool) -> Self {
        self.force_flip = Some(enabled);
        self
    }
    pub fn embed_attempts(mut self, n: usize) -> Self {
        self.embed_attempts = Some(n);
        self
    }
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
    pub fn top_hits(mut self, n: usize) -> Self {
        self.top_hits = Some(n);
        self
    }
    pub fn color(mut self, enabled: bool) -> Self {
        self.color = Some(enabled);
        self
    }
    pub fn optimize_overlay(mut self, enabled: bool) -> Self {
        self.optimize_overlay = Some(enabled);
        self
    }
    pub fn shape_parameters(mut self, params: ShapeParameters) -> Self {
        self.shape = Some(params);
        self
    }

    pub fn build(self) -> Result<ScreeningConfig, ConfigError> {
        let defaults = ScreeningConfig::default();

        let max_stereo_centers = self
            .max_stereo_centers
            .unwrap_or(defaults.generator.max_stereo_centers);
        if max_stereo_centers > STEREO_CENTER_LIMIT {
            return Err(ConfigError::InvalidParameter {
                name: "max_stereo_centers",
                reason: format!("must be at most {STEREO_CENTER_LIMIT}, got {max_stereo_centers}"),
            });
        }
        let embed_attempts = self
            .embed_attempts
            .unwrap_or(defaults.generator.embed_attempts);
        if embed_attempts == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "embed_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        let top_hits = self.top_hits.unwrap_or(defaults.top_hits);
        if top_hits == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "top_hits",
                reason: "must be at least 1".to_string(),
            });
        }
        let shape = self.shape.unwrap_or(defaults.scoring.shape);
        if !(shape.prefactor > 0.0 && shape.color_radius > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "shape_parameters",
                reason: format!("prefactor and colour radius must be positive, got {shape:?}"),
            });
        }

        let max_isomers = match self.max_isomers {
            Some(0) => None,
            Some(n) => Some(n),
            None => defaults.max_isomers,
        };

        Ok(ScreeningConfig {
            generator: GeneratorConfig {
                max_stereo_centers,
                force_flip: self.force_flip.unwrap_or(defaults.generator.force_flip),
                embed_attempts,
                random_seed: self.random_seed.unwrap_or(defaults.generator.random_seed),
            },
            scoring: ScoringConfig {
                color: self.color.unwrap_or(defaults.scoring.color),
                optimize_overlay: self
                    .optimize_overlay
                    .unwrap_or(defaults.scoring.optimize_overlay),
                shape,
            },
            enumerate_isomers: self.enumerate_isomers.unwrap_or(defaults.enumerate_isomers),
            max_isomers,
            top_hits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_yields_defaults() {
        assert_eq!(
            ScreeningConfigBuilder::new().build().unwrap(),
            ScreeningConfig::default()
        );
    }

    #[test]
    fn zero_max_isomers_means_unlimited() {
        let config = ScreeningConfigBuilder::new().max_isomers(0).build().unwrap();
        assert_eq!(config.max_isomers, None);
        let config = ScreeningConfigBuilder::new().max_isomers(4).build().unwrap();
        assert_eq!(config.max_isomers, Some(4));
    }

    #[test]
    fn rejects_zero_top_hits() {
        let err = ScreeningConfigBuilder::new().top_hits(0).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidParameter { name: "top_hits", .. }));
    }

    #[test]
    fn rejects_stereo_cap_beyond_variant_width() {
        let err = ScreeningConfigBuilder::new()
            .max_stereo_centers(64)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter {
                name: "max_stereo_centers",
                ..
            }
        ));
    }

    #[test]
    fn rejects_non_positive_shape_parameters() {
        let err = ScreeningConfigBuilder::new()
            .shape_parameters(ShapeParameters {
                prefactor: 0.0,
                color_radius: 1.0,
            })
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidParameter {
                name: "shape_parameters",
                ..
            }
        ));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = ScreeningConfigBuilder::new()
            .enumerate_isomers(false)
            .force_flip(false)
            .random_seed(7)
            .color(false)
            .top_hits(3)
            .build()
            .unwrap();
        assert!(!config.enumerate_isomers);
        assert!(!config.generator.force_flip);
        assert_eq!(config.generator.random_seed, 7);
        assert!(!config.scoring.color);
        assert_eq!(config.top_hits, 3);
    }
}
