//! Ready-made plant configurations.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;

use crate::config::{PlantConfig, Sprite};
use crate::rules::{Rule, RuleSet};

/// Plant style preset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlantPreset {
    /// Upright frond with alternating side shoots
    Fern,
    /// Dense, wide crown from two competing rules
    #[default]
    Bush,
    /// Short, sparse stalks
    Weed,
    /// Young tree that splits with the generate symbol
    Sapling,
}

impl PlantPreset {
    pub fn all() -> &'static [Self] {
        &[Self::Fern, Self::Bush, Self::Weed, Self::Sapling]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Fern => "Upright frond with alternating shoots",
            Self::Bush => "Dense stochastic crown",
            Self::Weed => "Short sparse stalks",
            Self::Sapling => "Young tree with forked crown",
        }
    }

    pub fn config(&self) -> PlantConfig {
        let base = PlantConfig::default();
        match self {
            Self::Fern => PlantConfig {
                initiator: "F".to_string(),
                rules_f: RuleSet::single("F[+F]F[-F]F"),
                angle_min: Vec3::new(0.0, 0.0, 22.0),
                angle_max: Vec3::new(0.0, 0.0, 28.0),
                dist_min: 0.25,
                dist_max: 0.3,
                generations: 3,
                thickness: 0.03,
                tip_scale: 0.3,
                leaf_scale: 3.0,
                ..base
            },
            Self::Bush => PlantConfig {
                initiator: "F".to_string(),
                rules_f: RuleSet::new(vec![
                    Rule::new(0.5, "F[+F]F[-F]F"),
                    Rule::new(0.3, "F[+F]F"),
                    Rule::new(0.2, "F[-F]F"),
                ]),
                angle_min: Vec3::new(-10.0, 0.0, 15.0),
                angle_max: Vec3::new(10.0, 40.0, 35.0),
                dist_min: 0.3,
                dist_max: 0.5,
                generations: 3,
                thickness: 0.05,
                tip_scale: 0.4,
                ..base
            },
            Self::Weed => PlantConfig {
                initiator: "F[+F][-F]".to_string(),
                rules_f: RuleSet::new(vec![Rule::new(2.0, "FF"), Rule::new(1.0, "F[+F]")]),
                angle_min: Vec3::new(0.0, 0.0, 10.0),
                angle_max: Vec3::new(0.0, 0.0, 30.0),
                dist_min: 0.2,
                dist_max: 0.4,
                generations: 2,
                thickness: 0.02,
                tip_scale: 0.6,
                leaf_scale: 2.0,
                ..base
            },
            Self::Sapling => PlantConfig {
                initiator: "FG".to_string(),
                rules_f: RuleSet::single("FF"),
                rules_g: RuleSet::new(vec![
                    Rule::new(0.6, "F[+G][-G]"),
                    Rule::new(0.4, "F[+G]FG"),
                ]),
                angle_min: Vec3::new(0.0, 0.0, 20.0),
                angle_max: Vec3::new(0.0, 90.0, 35.0),
                dist_min: 0.4,
                dist_max: 0.6,
                generations: 4,
                thickness: 0.08,
                tip_scale: 0.25,
                leaf_sprites: vec![
                    Sprite::quad(0.04, 0.08).with_uv_rect(0.0, 0.0, 0.5, 1.0),
                    Sprite::quad(0.05, 0.06).with_uv_rect(0.5, 0.0, 1.0, 1.0),
                ],
                ..base
            },
        }
    }
}

impl fmt::Display for PlantPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fern => write!(f, "fern"),
            Self::Bush => write!(f, "bush"),
            Self::Weed => write!(f, "weed"),
            Self::Sapling => write!(f, "sapling"),
        }
    }
}

impl FromStr for PlantPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown preset '{}'", s))
    }
}
