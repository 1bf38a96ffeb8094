//! Parallel rewriting of the symbol sequence ("DNA").

use tracing::debug;

use crate::config::PlantConfig;
use crate::random::XorShift128;
use crate::rules::RuleSet;

/// Grow forward; rewritten by the `F` rules and decoded as a segment.
pub const GROW_FORWARD: char = 'F';
/// Generate; rewritten by the `G` rules and decoded as a segment.
pub const GENERATE: char = 'G';
pub const TURN_LEFT: char = '+';
pub const TURN_RIGHT: char = '-';
pub const PUSH: char = '[';
pub const POP: char = ']';

/// Rule sets normalized once for a run.
#[derive(Clone, Debug)]
pub struct RuleTable {
    pub forward: RuleSet,
    pub generate: RuleSet,
}

impl RuleTable {
    pub fn from_config(config: &PlantConfig) -> Self {
        Self {
            forward: config.rules_f.normalized(),
            generate: config.rules_g.normalized(),
        }
    }

    fn rules_for(&self, symbol: char) -> Option<&RuleSet> {
        match symbol {
            GROW_FORWARD => Some(&self.forward),
            GENERATE => Some(&self.generate),
            _ => None,
        }
    }
}

/// Rewrite `initiator` `generations` times.
///
/// Each `F`/`G` consumes one uniform draw and is replaced by the selected rule;
/// every other symbol is copied. Returns `None` when the result is empty,
/// which callers treat as "no plant".
pub fn expand(
    initiator: &str,
    table: &RuleTable,
    generations: u32,
    rng: &mut XorShift128,
) -> Option<String> {
    let mut dna: Vec<char> = initiator.chars().collect();

    for generation in 0..generations {
        let mut next = Vec::with_capacity(dna.len() * 2);
        for &symbol in &dna {
            match table.rules_for(symbol) {
                Some(rules) => next.extend_from_slice(rules.select(rng.unit())),
                None => next.push(symbol),
            }
        }
        debug!(generation, length = next.len(), "rewrote dna");
        dna = next;
    }

    if dna.is_empty() {
        None
    } else {
        Some(dna.into_iter().collect())
    }
}

/// Expand the configuration's initiator with its own rules and generation count.
pub fn expand_config(config: &PlantConfig, rng: &mut XorShift128) -> Option<String> {
    let table = RuleTable::from_config(config);
    expand(&config.initiator, &table, config.generations, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    fn config(initiator: &str, rule_f: &str, generations: u32) -> PlantConfig {
        PlantConfig {
            initiator: initiator.to_string(),
            rules_f: RuleSet::single(rule_f),
            generations,
            ..PlantConfig::default()
        }
    }

    #[test]
    fn test_one_generation() {
        let mut rng = XorShift128::from_seed(1);
        let dna = expand_config(&config("F", "F[+F]F", 1), &mut rng);
        assert_eq!(dna.as_deref(), Some("F[+F]F"));
    }

    #[test]
    fn test_two_generations_rewrite_every_symbol() {
        let mut rng = XorShift128::from_seed(1);
        let dna = expand_config(&config("F", "F[+F]F", 2), &mut rng);
        assert_eq!(dna.as_deref(), Some("F[+F]F[+F[+F]F]F[+F]F"));
    }

    #[test]
    fn test_zero_generations_returns_initiator() {
        let mut rng = XorShift128::from_seed(1);
        let dna = expand_config(&config("F", "FF", 0), &mut rng);
        assert_eq!(dna.as_deref(), Some("F"));
    }

    #[test]
    fn test_empty_initiator_is_none() {
        let mut rng = XorShift128::from_seed(1);
        assert_eq!(expand_config(&config("", "FF", 0), &mut rng), None);
        assert_eq!(expand_config(&config("", "FF", 3), &mut rng), None);
    }

    #[test]
    fn test_literals_pass_through() {
        let mut rng = XorShift128::from_seed(1);
        let dna = expand_config(&config("X+F-[Y]", "FG", 1), &mut rng);
        assert_eq!(dna.as_deref(), Some("X+FG-[Y]"));
    }

    #[test]
    fn test_g_uses_generate_rules_and_lowercase_is_normalized() {
        let cfg = PlantConfig {
            initiator: "G".to_string(),
            rules_f: RuleSet::single("F"),
            rules_g: RuleSet::single("f[g]"),
            generations: 2,
            ..PlantConfig::default()
        };
        let mut rng = XorShift128::from_seed(9);
        assert_eq!(expand_config(&cfg, &mut rng).as_deref(), Some("F[F[G]]"));
    }

    #[test]
    fn test_missing_rules_erase_symbol() {
        let cfg = PlantConfig {
            initiator: "FG".to_string(),
            rules_f: RuleSet::single("F"),
            rules_g: RuleSet::default(),
            generations: 1,
            ..PlantConfig::default()
        };
        let mut rng = XorShift128::from_seed(9);
        assert_eq!(expand_config(&cfg, &mut rng).as_deref(), Some("F"));
    }

    #[test]
    fn test_weighted_choice_is_deterministic() {
        let cfg = PlantConfig {
            initiator: "FFFFFFFF".to_string(),
            rules_f: RuleSet::new(vec![Rule::new(1.0, "A"), Rule::new(1.0, "B")]),
            generations: 1,
            ..PlantConfig::default()
        };
        let a = expand_config(&cfg, &mut XorShift128::from_seed(77));
        let b = expand_config(&cfg, &mut XorShift128::from_seed(77));
        assert_eq!(a, b);
        let dna = a.unwrap();
        assert_eq!(dna.len(), 8);
        assert!(dna.chars().all(|c| c == 'A' || c == 'B'));
    }
}
