//! L-System plant generation library
//!
//! Expands a stochastic grammar into a symbol sequence, decodes it into a
//! joint tree, and assembles a skinned mesh from the tree. Re-exports modules
//! for use by the binary and by hosts that bind the buffers to a renderer.

pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod grammar;
pub mod math;
pub mod mesh;
pub mod plant;
pub mod presets;
pub mod random;
pub mod rules;
pub mod skeleton;

pub use config::{PlantConfig, Sprite};
pub use error::{PlantError, Result};
pub use plant::{generate, generate_batch, generate_with_fallback, GeneratedPlant, PlantGenerator};
pub use random::XorShift128;
