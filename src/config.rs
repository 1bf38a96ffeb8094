//! Plant generation settings.
//!
//! A [`PlantConfig`] is immutable for the duration of a run. It is usually
//! loaded from JSON; every field has a default so partial files are accepted.

use std::fmt;
use std::fs;
use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rules::RuleSet;

/// An opaque renderable image, reduced to the data the mesh assembler reads:
/// four corner positions and four matching UVs, ordered
/// left-top, right-top, left-bottom, right-bottom.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub vertices: [Vec2; 4],
    pub uv: [Vec2; 4],
}

impl Sprite {
    /// Axis-aligned sprite with its pivot at the bottom centre, mapping the full texture.
    pub fn quad(width: f32, height: f32) -> Self {
        let half = width * 0.5;
        Self {
            vertices: [
                Vec2::new(-half, height),
                Vec2::new(half, height),
                Vec2::new(-half, 0.0),
                Vec2::new(half, 0.0),
            ],
            uv: [
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
            ],
        }
    }

    /// Same geometry with the UV rect restricted to `[u0, u1] x [v0, v1]`.
    pub fn with_uv_rect(mut self, u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        self.uv = [
            Vec2::new(u0, v1),
            Vec2::new(u1, v1),
            Vec2::new(u0, v0),
            Vec2::new(u1, v0),
        ];
        self
    }
}

/// L-System generation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    /// Symbol sequence the first generation rewrites.
    pub initiator: String,

    /// Replacement rules for `F` (grow forward).
    pub rules_f: RuleSet,

    /// Replacement rules for `G` (generate).
    pub rules_g: RuleSet,

    /// Per-axis turn angle range in degrees, sampled for `+` and `-`.
    pub angle_min: Vec3,
    pub angle_max: Vec3,

    /// Segment length range for each growth symbol.
    pub dist_min: f32,
    pub dist_max: f32,

    /// Number of rewriting passes.
    pub generations: u32,

    /// Half-width of the trunk at the origin.
    pub thickness: f32,

    /// Thickness fraction at the deepest tip (0.0-1.0).
    pub tip_scale: f32,

    /// Scale applied to leaf sprite corners.
    pub leaf_scale: f32,

    /// Z coordinate given to leaf quads.
    pub leaf_z_offset: f32,

    /// Pool of sprites whose UV rect skins branch segments.
    pub node_sprites: Vec<Sprite>,

    /// Pool of sprites drawn as leaves.
    pub leaf_sprites: Vec<Sprite>,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            initiator: "F".to_string(),
            rules_f: RuleSet::single("F[+F]F[-F]F"),
            rules_g: RuleSet::default(),
            angle_min: Vec3::new(0.0, 0.0, 20.0),
            angle_max: Vec3::new(0.0, 0.0, 20.0),
            dist_min: 0.5,
            dist_max: 0.5,
            generations: 1,
            thickness: 0.05,
            tip_scale: 0.5,
            leaf_scale: 5.0,
            leaf_z_offset: 0.0,
            node_sprites: vec![Sprite::quad(0.1, 0.1)],
            leaf_sprites: vec![Sprite::quad(0.04, 0.08)],
        }
    }
}

/// Non-fatal problems in a configuration. Generation still runs; the
/// resulting geometry may be degenerate.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigWarning {
    DistanceRangeInverted { min: f32, max: f32 },
    NegativeThickness(f32),
    TipScaleOutOfRange(f32),
    NegativeRuleWeight { symbol: char, index: usize },
    UnbalancedBrackets { symbol: char, index: usize },
    EmptyNodeSprites,
    EmptyLeafSprites,
    EmptyInitiator,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DistanceRangeInverted { min, max } => {
                write!(f, "dist_max ({}) is smaller than dist_min ({})", max, min)
            }
            Self::NegativeThickness(t) => write!(f, "thickness is negative ({})", t),
            Self::TipScaleOutOfRange(s) => write!(f, "tip_scale {} is outside 0..=1", s),
            Self::NegativeRuleWeight { symbol, index } => {
                write!(f, "rule {} for '{}' has a negative weight", index, symbol)
            }
            Self::UnbalancedBrackets { symbol, index } => {
                write!(f, "rule {} for '{}' has unbalanced brackets", index, symbol)
            }
            Self::EmptyNodeSprites => write!(f, "node sprite pool is empty"),
            Self::EmptyLeafSprites => write!(f, "leaf sprite pool is empty"),
            Self::EmptyInitiator => write!(f, "initiator is empty"),
        }
    }
}

impl PlantConfig {
    /// Load a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }

    /// Report out-of-range values. The core never rejects a configuration.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.dist_max < self.dist_min {
            warnings.push(ConfigWarning::DistanceRangeInverted {
                min: self.dist_min,
                max: self.dist_max,
            });
        }
        if self.thickness < 0.0 {
            warnings.push(ConfigWarning::NegativeThickness(self.thickness));
        }
        if !(0.0..=1.0).contains(&self.tip_scale) {
            warnings.push(ConfigWarning::TipScaleOutOfRange(self.tip_scale));
        }
        for (symbol, rules) in [('F', &self.rules_f), ('G', &self.rules_g)] {
            for (index, rule) in rules.rules.iter().enumerate() {
                if rule.weight < 0.0 {
                    warnings.push(ConfigWarning::NegativeRuleWeight { symbol, index });
                }
                if !brackets_balanced(&rule.replacement) {
                    warnings.push(ConfigWarning::UnbalancedBrackets { symbol, index });
                }
            }
        }
        if self.node_sprites.is_empty() {
            warnings.push(ConfigWarning::EmptyNodeSprites);
        }
        if self.leaf_sprites.is_empty() {
            warnings.push(ConfigWarning::EmptyLeafSprites);
        }
        if self.initiator.is_empty() {
            warnings.push(ConfigWarning::EmptyInitiator);
        }

        warnings
    }
}

fn brackets_balanced(text: &str) -> bool {
    let mut open = 0i32;
    for c in text.chars() {
        match c {
            '[' => open += 1,
            ']' => {
                open -= 1;
                if open < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    open == 0
}
