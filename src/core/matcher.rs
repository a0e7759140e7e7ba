//! Input Matcher: pure comparison of accumulated input against a round

use crate::types::{Challenge, InputToken, MatchRule, Outcome, Round};

/// Equality rule bound to one game
#[derive(Debug, Clone, Copy)]
pub struct InputMatcher {
    rule: MatchRule,
}

impl InputMatcher {
    pub fn new(rule: MatchRule) -> Self {
        Self { rule }
    }

    /// Classify `input` against `round`. Anything that does not clearly
    /// match is incorrect.
    pub fn evaluate(&self, round: &Round, input: &[InputToken]) -> Outcome {
        let correct = match (self.rule, &round.challenge) {
            (MatchRule::NumericEquality, Challenge::Arithmetic(expr)) => match (input, expr.evaluate()) {
                ([InputToken::Number { value }], Some(expected)) => *value == expected,
                _ => false,
            },
            (MatchRule::OrderedSequence, Challenge::Pattern { sequence, .. }) => {
                input.len() == sequence.len()
                    && input.iter().zip(sequence).all(|(token, expected)| {
                        matches!(token, InputToken::Symbol { value } if value == expected)
                    })
            }
            (MatchRule::UnorderedLabels, Challenge::Matching { targets, .. }) => match input {
                [InputToken::Pair { item, label }] => targets
                    .iter()
                    .find(|c| &c.glyph == item)
                    .map(|c| &c.label == label)
                    .unwrap_or(false),
                _ => false,
            },
            _ => false,
        };

        if correct {
            Outcome::correct()
        } else {
            Outcome::incorrect()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
