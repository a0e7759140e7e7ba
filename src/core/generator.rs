//! Round Generator: builds one challenge from a level descriptor
//!
//! - Arithmetic: operator from the level set, operands in [1, max_number];
//!   multiplication operands always in [1, 5]
//! - Pattern: `pattern_length` symbols, uniform, with replacement
//! - Matching: full fixed label set, items not yet solved in the level

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use crate::types::{Challenge, Difficulty, Expression, LevelDescriptor, Operator, Round};
use crate::{GameError, Result, ARITHMETIC_OPERAND_MAX, MULTIPLICATION_OPERAND_MAX};

/// Seeded or entropy-backed round source
#[derive(Debug)]
pub struct RoundGenerator {
    rng: StdRng,
}

impl RoundGenerator {
    /// Deterministic when `seed` is set
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Generate round `number` of `level`, skipping already solved items
    pub fn generate(&mut self, level: &LevelDescriptor, number: u32, solved: &[String]) -> Result<Round> {
        generate_round(level, number, solved, &mut self.rng)
    }
}

/// Reject descriptors that could only yield degenerate rounds
pub fn validate_level(level: &LevelDescriptor) -> Result<()> {
    let invalid = |reason: &str| {
        Err(GameError::InvalidLevelDescriptor(format!("{}: {}", level.name, reason)))
    };

    if level.rounds == 0 {
        return invalid("round target must be at least 1");
    }
    if level.time_limit_secs == Some(0) {
        return invalid("time limit must be positive");
    }

    match &level.difficulty {
        Difficulty::Arithmetic { operators, max_number } => {
            if operators.is_empty() {
                return invalid("operator set is empty");
            }
            if *max_number < 1 {
                return invalid("max_number must be at least 1");
            }
            if *max_number > ARITHMETIC_OPERAND_MAX {
                return invalid("max_number too large to evaluate");
            }
        }
        Difficulty::Pattern { symbols, pattern_length, .. } => {
            if symbols.is_empty() {
                return invalid("symbol set is empty");
            }
            if *pattern_length < 1 {
                return invalid("pattern_length must be at least 1");
            }
        }
        Difficulty::Matching { categories } => {
            if categories.is_empty() {
                return invalid("category set is empty");
            }
            if level.rounds as usize > categories.len() {
                return invalid("more rounds than categories to match");
            }
        }
    }
    Ok(())
}

/// Generate with a caller-supplied RNG
pub fn generate_round<R: Rng + ?Sized>(
    level: &LevelDescriptor,
    number: u32,
    solved: &[String],
    rng: &mut R,
) -> Result<Round> {
    validate_level(level)?;

    let challenge = match &level.difficulty {
        Difficulty::Arithmetic { operators, max_number } => {
            let op = *operators
                .choose(rng)
                .ok_or_else(|| GameError::InvalidLevelDescriptor("operator set is empty".into()))?;
            let max = match op {
                Operator::Multiply => MULTIPLICATION_OPERAND_MAX,
                _ => *max_number,
            };
            let lhs = rng.gen_range(1..=max);
            let rhs = rng.gen_range(1..=max);
            Challenge::Arithmetic(Expression::new(lhs, op, rhs))
        }
        Difficulty::Pattern { symbols, pattern_length, reveal_ms } => {
            let sequence = (0..*pattern_length)
                .map(|_| symbols[rng.gen_range(0..symbols.len())].clone())
                .collect();
            Challenge::Pattern {
                sequence,
                choices: symbols.clone(),
                reveal_ms: *reveal_ms,
            }
        }
        Difficulty::Matching { categories } => {
            let targets: Vec<_> = categories
                .iter()
                .filter(|c| !solved.contains(&c.glyph))
                .cloned()
                .collect();
            if targets.is_empty() {
                return Err(GameError::InvalidLevelDescriptor(format!(
                    "{}: no unmatched items left",
                    level.name
                )));
            }
            Challenge::Matching {
                targets,
                labels: categories.iter().map(|c| c.label.clone()).collect(),
            }
        }
    };

    Ok(Round { number, challenge })
}

// =============================================================================
// TESTS
// =============================================================================
