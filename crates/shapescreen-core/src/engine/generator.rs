use super::config::GeneratorConfig;
use super::error::ConformerError;
use crate::core::chem::smiles::parse_smiles;
use crate::core::chem::stereo::StereoFlipper;
use crate::core::embed::{EmbedError, EmbedOptions, embed};
use crate::core::models::conformer::Conformer;
use crate::core::models::molecule::Molecule;
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns a SMILES string into 3D conformers.
///
/// Implementations must be deterministic for a fixed configuration and must
/// not write to disk.
pub trait ConformerGenerator: Send + Sync {
    /// Produces conformers for `smiles` in enumeration order.
    ///
    /// * `enumerate_isomers` - expand stereoisomers before embedding; otherwise
    ///   embed the structure exactly as written.
    /// * `max_isomers` - stop after this many conformers; `None` keeps all.
    ///
    /// # Errors
    ///
    /// [`ConformerError::Parse`] for malformed SMILES and
    /// [`ConformerError::Build`] when no structure could be embedded.
    fn generate(
        &self,
        smiles: &str,
        enumerate_isomers: bool,
        max_isomers: Option<usize>,
    ) -> Result<Vec<Conformer>, ConformerError>;
}

/// Stereoisomer enumeration followed by distance-geometry embedding.
#[derive(Debug, Clone, Default)]
pub struct DistanceGeometryGenerator {
    config: GeneratorConfig,
}

impl DistanceGeometryGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn embed_options(&self) -> EmbedOptions {
        EmbedOptions {
            max_attempts: self.config.embed_attempts,
            random_seed: self.config.random_seed,
            ..EmbedOptions::default()
        }
    }
}

impl ConformerGenerator for DistanceGeometryGenerator {
    fn generate(
        &self,
        smiles: &str,
        enumerate_isomers: bool,
        max_isomers: Option<usize>,
    ) -> Result<Vec<Conformer>, ConformerError> {
        let molecule = parse_smiles(smiles)?;
        let candidates: Box<dyn Iterator<Item = Molecule>> = if enumerate_isomers {
            let flipper = StereoFlipper::new(
                &molecule,
                self.config.max_stereo_centers,
                self.config.force_flip,
            );
            debug!(
                smiles,
                elements = flipper.elements().len(),
                variants = flipper.variant_count(),
                "Enumerating stereoisomers"
            );
            Box::new(flipper)
        } else {
            Box::new(std::iter::once(molecule))
        };

        let options = self.embed_options();
        let mut conformers = Vec::new();
        let mut attempted = 0;
        let mut last_error: Option<EmbedError> = None;

        for (isomer, variant) in candidates.enumerate() {
            if max_isomers.is_some_and(|cap| conformers.len() >= cap) {
                break;
            }
            attempted += 1;
            match embed(&variant, &options) {
                Ok(coords) => {
                    if let Some(conformer) = Conformer::new(Arc::new(variant), coords) {
                        conformers.push(conformer);
                    }
                }
                Err(e) => {
                    warn!(smiles, isomer, error = %e, "Failed to build conformer");
                    last_error = Some(e);
                }
            }
        }

        match (conformers.is_empty(), last_error) {
            (true, Some(source)) => Err(ConformerError::Build { attempted, source }),
            _ => Ok(conformers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::molecule::Chirality;

    fn generator() -> DistanceGeometryGenerator {
        DistanceGeometryGenerator::default()
    }

    #[test]
    fn invalid_smiles_is_a_parse_error() {
        let result = generator().generate("not_a_molecule", true, Some(1));
        assert!(matches!(result, Err(ConformerError::Parse(_))));
    }

    #[test]
    fn without_expansion_embeds_the_input_once() {
        let conformers = generator().generate("CC(O)CC", false, None).unwrap();
        assert_eq!(conformers.len(), 1);
        assert!(!conformers[0].molecule().atom(1).chirality.is_specified());
    }

    #[test]
    fn expansion_yields_every_stereoisomer_when_unlimited() {
        let conformers = generator().generate("CC(O)C(N)C", true, None).unwrap();
        assert_eq!(conformers.len(), 4);
        for conformer in &conformers {
            assert!(matches!(
                conformer.molecule().atom(1).chirality,
                Chirality::Tetrahedral { .. }
            ));
        }
    }

    #[test]
    fn retention_cap_limits_the_conformer_count() {
        let conformers = generator().generate("CC(O)C(N)C", true, Some(1)).unwrap();
        assert_eq!(conformers.len(), 1);
    }

    #[test]
    fn titles_come_from_the_smiles_record() {
        let conformers = generator().generate("CCO ethanol", true, Some(1)).unwrap();
        assert_eq!(conformers[0].title, "ethanol");
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generator().generate("CC(=O)Nc1ccc(O)cc1", true, Some(1)).unwrap();
        let b = generator().generate("CC(=O)Nc1ccc(O)cc1", true, Some(1)).unwrap();
        assert_eq!(a[0].coords(), b[0].coords());
    }
}
