//! End-to-end plant generation: expand, decode, build seams, assemble.

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PlantConfig;
use crate::error::Result;
use crate::geometry::{build_sections, JointSections};
use crate::grammar::expand_config;
use crate::mesh::{assemble, SkinnedMesh};
use crate::random::{resolve_seed, XorShift128};
use crate::skeleton::{decode, Skeleton};

/// Everything one generation run produces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPlant {
    /// Seed the run actually used (never 0).
    pub seed: i32,
    /// Final symbol sequence.
    pub dna: String,
    pub skeleton: Skeleton,
    pub sections: Vec<JointSections>,
    pub mesh: SkinnedMesh,
}

/// Generate a plant from an explicit seed.
///
/// The seed is used as-is, including 0; use [`generate_with_fallback`] for
/// the "0 means fresh seed" convention. Returns `Ok(None)` when the grammar
/// produces nothing to render.
pub fn generate(config: &PlantConfig, seed: i32) -> Result<Option<GeneratedPlant>> {
    let mut rng = XorShift128::from_seed(seed);

    let Some(dna) = expand_config(config, &mut rng) else {
        warn!(seed, "grammar produced an empty sequence; nothing to render");
        return Ok(None);
    };
    debug!(seed, length = dna.len(), "expanded dna");

    let skeleton = decode(&dna, config, &mut rng);
    let sections = build_sections(&skeleton, config.thickness);
    let mesh = assemble(&skeleton, &sections, config, &mut rng)?;

    Ok(Some(GeneratedPlant {
        seed,
        dna,
        skeleton,
        sections,
        mesh,
    }))
}

/// Generate a plant, drawing a fresh seed from `fallback` when `seed` is 0.
pub fn generate_with_fallback<R: Rng + ?Sized>(
    config: &PlantConfig,
    seed: i32,
    fallback: &mut R,
) -> Result<Option<GeneratedPlant>> {
    generate(config, resolve_seed(seed, fallback))
}

/// Generate many plants in parallel, each from its own seed and random source.
pub fn generate_batch(config: &PlantConfig, seeds: &[i32]) -> Vec<Result<Option<GeneratedPlant>>> {
    seeds
        .par_iter()
        .map(|&seed| generate(config, seed))
        .collect()
}

/// Holds the current plant for a host and regenerates it on demand.
///
/// Regeneration drops the previous skeleton and mesh before the new run
/// starts, and a degenerate run leaves nothing behind.
#[derive(Debug)]
pub struct PlantGenerator {
    pub config: PlantConfig,
    /// User-facing seed; 0 picks a fresh one on every regeneration.
    pub seed: i32,
    current: Option<GeneratedPlant>,
}

impl PlantGenerator {
    pub fn new(config: PlantConfig, seed: i32) -> Self {
        Self {
            config,
            seed,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&GeneratedPlant> {
        self.current.as_ref()
    }

    /// Drop the current outputs.
    pub fn release(&mut self) {
        self.current = None;
    }

    pub fn regenerate<R: Rng + ?Sized>(&mut self, fallback: &mut R) -> Result<Option<&GeneratedPlant>> {
        self.release();
        self.current = generate_with_fallback(&self.config, self.seed, fallback)?;
        Ok(self.current.as_ref())
    }
}
