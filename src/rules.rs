//! Weighted replacement rules for the grow-forward (`F`) and generate (`G`) symbols.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// One weighted replacement for a symbol.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Rule {
    /// Relative weight (>= 0). Normalized per run by [`RuleSet::normalize`].
    pub weight: f32,
    /// Replacement text; matched case-insensitively.
    pub replacement: String,
    #[serde(skip)]
    symbols: OnceLock<Vec<char>>,
}

impl Rule {
    pub fn new(weight: f32, replacement: impl Into<String>) -> Self {
        Self {
            weight,
            replacement: replacement.into(),
            symbols: OnceLock::new(),
        }
    }

    /// Upper-cased replacement symbols, computed on first use.
    pub fn symbols(&self) -> &[char] {
        self.symbols
            .get_or_init(|| self.replacement.to_uppercase().chars().collect())
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.replacement == other.replacement
    }
}

/// Ordered list of rules for a single source symbol.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Shorthand for a set with a single rule of weight 1.
    pub fn single(replacement: impl Into<String>) -> Self {
        Self::new(vec![Rule::new(1.0, replacement)])
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Sum of the current weights.
    pub fn total_weight(&self) -> f32 {
        self.rules.iter().map(|r| r.weight).sum()
    }

    /// Scale weights so they cover `[0, 1]` exactly.
    ///
    /// Every rule after the first becomes `weight / total`; the first rule
    /// takes whatever remains, so rounding never leaves a gap. A non-positive
    /// total is treated as 1. Rule order is never changed.
    pub fn normalize(&mut self) {
        if self.rules.is_empty() {
            return;
        }
        let mut total = self.total_weight();
        if total <= 0.0 {
            total = 1.0;
        }
        let mut remainder = 1.0f32;
        for rule in self.rules.iter_mut().skip(1).rev() {
            rule.weight /= total;
            remainder -= rule.weight;
        }
        self.rules[0].weight = remainder;
    }

    /// Normalized copy, leaving `self` untouched.
    pub fn normalized(&self) -> Self {
        let mut copy = self.clone();
        copy.normalize();
        copy
    }

    /// Pick the replacement for a uniform draw `t` in `[0, 1)`.
    ///
    /// Falls back to the last rule when floating error leaves `t` uncovered,
    /// and to an empty replacement when the set has no rules.
    pub fn select(&self, t: f32) -> &[char] {
        let mut remaining = t;
        for rule in &self.rules {
            if rule.weight >= remaining {
                return rule.symbols();
            }
            remaining -= rule.weight;
        }
        self.rules.last().map(Rule::symbols).unwrap_or(&[])
    }
}
