use serde::{Deserialize, Serialize};
use tessera_core::{GenerationError, RandomSource};
use thiserror::Error;

use crate::turtle::{interpret, Segment, TurtleParams};

/// Deepest expansion accepted; string length grows geometrically per pass.
pub const MAX_EXPANSION_DEPTH: u32 = 8;
pub const DEFAULT_MAX_SYMBOLS: usize = 4_000_000;

pub const TURNING_ANGLE_RANGE: (f32, f32) = (15.0, 60.0);
pub const DEPTH_RANGE: (u32, u32) = (1, 8);
pub const THICKNESS_RANGE: (f32, f32) = (0.3, 3.0);

/// Symbols the turtle draws or turns on. Anything else is carried through
/// expansion and ignored during interpretation.
pub const ALPHABET: [char; 10] = ['F', '[', ']', '+', '-', '&', '^', '/', '\\', '|'];

/// Tolerance when checking that a rule's probabilities sum to one
const PROBABILITY_EPSILON: f32 = 1e-4;

/// One weighted replacement for a predecessor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Successor {
    pub replacement: String,
    pub probability: f32,
}

/// Stochastic production: predecessor → weighted successors, in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRule {
    pub predecessor: char,
    pub successors: Vec<Successor>,
}

impl ProductionRule {
    /// Single successor with probability one
    pub fn deterministic(predecessor: char, replacement: &str) -> Self {
        Self::stochastic(predecessor, &[(replacement, 1.0)])
    }

    pub fn stochastic(predecessor: char, successors: &[(&str, f32)]) -> Self {
        Self {
            predecessor,
            successors: successors
                .iter()
                .map(|&(replacement, probability)| Successor {
                    replacement: replacement.to_string(),
                    probability,
                })
                .collect(),
        }
    }

    pub fn total_probability(&self) -> f32 {
        self.successors.iter().map(|s| s.probability).sum()
    }

    /// First successor whose cumulative probability reaches `draw`.
    /// `None` when the draw lands past the total.
    pub fn select(&self, draw: f32) -> Option<&str> {
        let mut cumulative = 0.0;
        for successor in &self.successors {
            cumulative += successor.probability;
            if cumulative >= draw {
                return Some(&successor.replacement);
            }
        }
        None
    }
}

/// What to do when a draw falls in the gap left by probabilities summing
/// to less than one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GapPolicy {
    /// Remove the symbol from the output and record it
    #[default]
    Drop,
    /// Leave the symbol in place
    Keep,
    /// Abort the expansion
    Fail,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrammarError {
    #[error("expansion depth {depth} exceeds the limit of {max}")]
    DepthTooLarge { depth: u32, max: u32 },

    #[error("no successor selected for `{symbol}` on pass {pass}: rule probabilities leave a gap")]
    ProbabilityGap { symbol: char, pass: u32 },

    #[error("expansion passed {limit} symbols on pass {pass}")]
    TooManySymbols { limit: usize, pass: u32 },
}

impl From<GrammarError> for GenerationError {
    fn from(err: GrammarError) -> Self {
        GenerationError::Grammar(err.to_string())
    }
}

/// A symbol removed by [`GapPolicy::Drop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroppedSymbol {
    /// Zero-based rewrite pass
    pub pass: u32,
    /// Offset in that pass's input
    pub index: usize,
    pub symbol: char,
}

/// Result of an expansion
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub symbols: String,
    pub dropped: Vec<DroppedSymbol>,
}

/// Rule whose probabilities do not sum to one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleWarning {
    pub predecessor: char,
    pub total: f32,
}

/// Ordered rule set with its expansion policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Grammar {
    pub rules: Vec<ProductionRule>,
    pub gap_policy: GapPolicy,
    pub max_symbols: usize,
}

impl Default for Grammar {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            gap_policy: GapPolicy::default(),
            max_symbols: DEFAULT_MAX_SYMBOLS,
        }
    }
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: ProductionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_gap_policy(mut self, policy: GapPolicy) -> Self {
        self.gap_policy = policy;
        self
    }

    /// First declared rule for `symbol`
    pub fn rule_for(&self, symbol: char) -> Option<&ProductionRule> {
        self.rules.iter().find(|r| r.predecessor == symbol)
    }

    /// Rules whose successor probabilities don't add up to one
    pub fn validate(&self) -> Vec<RuleWarning> {
        self.rules
            .iter()
            .map(|rule| RuleWarning {
                predecessor: rule.predecessor,
                total: rule.total_probability(),
            })
            .filter(|w| (w.total - 1.0).abs() > PROBABILITY_EPSILON)
            .collect()
    }

    /// Symbols in `axiom` or any successor that the turtle ignores and no
    /// rule rewrites, in order of first appearance.
    pub fn unknown_symbols(&self, axiom: &str) -> Vec<char> {
        let mut unknown = Vec::new();
        let replacements = self
            .rules
            .iter()
            .flat_map(|rule| rule.successors.iter().map(|s| s.replacement.as_str()));

        for symbol in std::iter::once(axiom).chain(replacements).flat_map(str::chars) {
            if !ALPHABET.contains(&symbol) && self.rule_for(symbol).is_none() && !unknown.contains(&symbol) {
                unknown.push(symbol);
            }
        }
        unknown
    }

    /// Rewrite `axiom` `depth` times. Each pass replaces every symbol that
    /// has a rule, drawing once per rewritten symbol.
    pub fn expand(
        &self,
        axiom: &str,
        depth: u32,
        rng: &mut dyn RandomSource,
    ) -> Result<Expansion, GrammarError> {
        if depth > MAX_EXPANSION_DEPTH {
            return Err(GrammarError::DepthTooLarge {
                depth,
                max: MAX_EXPANSION_DEPTH,
            });
        }

        for warning in self.validate() {
            log::warn!(
                "rule for `{}` sums to {:.4}, draws past it follow {:?}",
                warning.predecessor,
                warning.total,
                self.gap_policy
            );
        }

        let mut current = axiom.to_string();
        let mut dropped = Vec::new();

        for pass in 0..depth {
            current = self.rewrite(&current, pass, rng, &mut dropped)?;
            log::debug!("pass {pass}: {} symbols", current.chars().count());
        }

        Ok(Expansion {
            symbols: current,
            dropped,
        })
    }

    fn rewrite(
        &self,
        input: &str,
        pass: u32,
        rng: &mut dyn RandomSource,
        dropped: &mut Vec<DroppedSymbol>,
    ) -> Result<String, GrammarError> {
        let mut next = String::with_capacity(input.len() * 2);
        let mut count = 0;

        for (index, symbol) in input.chars().enumerate() {
            let Some(rule) = self.rule_for(symbol) else {
                next.push(symbol);
                count += 1;
                continue;
            };

            match rule.select(rng.value()) {
                Some(replacement) => {
                    next.push_str(replacement);
                    count += replacement.chars().count();
                }
                None => match self.gap_policy {
                    GapPolicy::Drop => dropped.push(DroppedSymbol {
                        pass,
                        index,
                        symbol,
                    }),
                    GapPolicy::Keep => {
                        next.push(symbol);
                        count += 1;
                    }
                    GapPolicy::Fail => return Err(GrammarError::ProbabilityGap { symbol, pass }),
                },
            }

            if count > self.max_symbols {
                return Err(GrammarError::TooManySymbols {
                    limit: self.max_symbols,
                    pass,
                });
            }
        }

        Ok(next)
    }
}

/// Complete plant description: grammar plus turtle parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantRecipe {
    pub axiom: String,
    pub grammar: Grammar,
    pub depth: u32,
    pub angle_degrees: f32,
    /// Whole step length; the fractional part is dropped when clamped
    pub length: f32,
    pub thickness: f32,
}

impl Default for PlantRecipe {
    fn default() -> Self {
        PlantRecipe::stochastic_tree()
    }
}

impl PlantRecipe {
    /// Dense deterministic bush
    pub fn bush() -> Self {
        PlantRecipe {
            axiom: "F".to_string(),
            grammar: Grammar::new()
                .with_rule(ProductionRule::deterministic('F', "FF-[-F+F+F]+[+F-F-F]")),
            depth: 3,
            angle_degrees: 22.5,
            length: 1.0,
            thickness: 1.0,
        }
    }

    /// Fractal fern; `X` only drives growth and draws nothing
    pub fn fern() -> Self {
        PlantRecipe {
            axiom: "X".to_string(),
            grammar: Grammar::new()
                .with_rule(ProductionRule::deterministic('X', "F+[[X]-X]-F[-FX]+X"))
                .with_rule(ProductionRule::deterministic('F', "FF")),
            depth: 4,
            angle_degrees: 25.0,
            length: 1.0,
            thickness: 0.5,
        }
    }

    /// Branching varies per seed
    pub fn stochastic_tree() -> Self {
        PlantRecipe {
            axiom: "F".to_string(),
            grammar: Grammar::new().with_rule(ProductionRule::stochastic(
                'F',
                &[("F[+F]F[-F]F", 0.33), ("F[+F]F", 0.33), ("F[-F]F", 0.34)],
            )),
            depth: 4,
            angle_degrees: 25.0,
            length: 1.0,
            thickness: 1.0,
        }
    }

    /// Uses pitch and roll, so branches leave the plane
    pub fn sapling() -> Self {
        PlantRecipe {
            axiom: "F".to_string(),
            grammar: Grammar::new().with_rule(ProductionRule::stochastic(
                'F',
                &[("F[&F][/^F]F", 0.5), ("F[^F][\\&F]F", 0.5)],
            )),
            depth: 3,
            angle_degrees: 30.0,
            length: 1.0,
            thickness: 0.8,
        }
    }

    pub fn clamped(&self) -> Self {
        Self {
            axiom: self.axiom.clone(),
            grammar: self.grammar.clone(),
            depth: self.depth.clamp(DEPTH_RANGE.0, DEPTH_RANGE.1),
            angle_degrees: self
                .angle_degrees
                .clamp(TURNING_ANGLE_RANGE.0, TURNING_ANGLE_RANGE.1),
            length: self.length.trunc(),
            thickness: self.thickness.clamp(THICKNESS_RANGE.0, THICKNESS_RANGE.1),
        }
    }

    pub fn turtle_params(&self) -> TurtleParams {
        TurtleParams {
            length: self.length,
            angle_degrees: self.angle_degrees,
            thickness: self.thickness,
        }
    }

    /// Expand and interpret in one go. The recipe is clamped first.
    pub fn generate(&self, rng: &mut dyn RandomSource) -> Result<GeneratedPlant, GenerationError> {
        let recipe = self.clamped();
        let unknown = recipe.grammar.unknown_symbols(&recipe.axiom);
        if !unknown.is_empty() {
            log::warn!("symbols {unknown:?} are never rewritten and draw nothing");
        }
        let expansion = recipe.grammar.expand(&recipe.axiom, recipe.depth, rng)?;
        let segments = interpret(&expansion.symbols, &recipe.turtle_params())?;

        log::info!(
            "Plant generated: {} symbols, {} segments, {} dropped",
            expansion.symbols.chars().count(),
            segments.len(),
            expansion.dropped.len()
        );

        Ok(GeneratedPlant {
            expansion,
            segments,
        })
    }
}

/// Expanded string together with the segments drawn from it
#[derive(Debug, Clone)]
pub struct GeneratedPlant {
    pub expansion: Expansion,
    pub segments: Vec<Segment>,
}
