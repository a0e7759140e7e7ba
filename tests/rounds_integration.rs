//! Integration tests - Round generation and input matching

use playroom::core::{InputMatcher, RoundGenerator};
use playroom::types::{
    default_emotions, Challenge, GameKind, GameProfile, InputToken, LevelDescriptor, MatchRule,
    Operator,
};

#[test]
fn test_builtin_levels_generate_valid_rounds() {
    let mut generator = RoundGenerator::seeded(2024);
    for kind in GameKind::ALL {
        let profile = GameProfile::builtin(kind);
        for level in &profile.levels {
            for n in 1..=50 {
                let round = generator.generate(level, n, &[]).unwrap();
                assert!(round.expected_len() >= 1);
                assert_eq!(round.number, n);
            }
        }
    }
}

#[test]
fn test_arithmetic_answers_always_match_their_expression() {
    let level = LevelDescriptor::arithmetic("L", &[Operator::Add, Operator::Subtract, Operator::Multiply], 20, 10, 120);
    let matcher = InputMatcher::new(MatchRule::NumericEquality);
    let mut generator = RoundGenerator::seeded(5);

    for n in 0..300 {
        let round = generator.generate(&level, n, &[]).unwrap();
        let Challenge::Arithmetic(expr) = &round.challenge else {
            panic!("expected arithmetic round");
        };
        if expr.op == Operator::Multiply {
            assert!(expr.lhs <= 5 && expr.rhs <= 5);
        }
        let answer = expr.evaluate().unwrap();
        assert!(matcher.evaluate(&round, &[InputToken::number(answer)]).correct);
        assert!(!matcher.evaluate(&round, &[InputToken::number(answer + 1)]).correct);
    }
}

#[test]
fn test_pattern_echo_is_correct_and_any_change_is_not() {
    let profile = GameProfile::patterns();
    let matcher = InputMatcher::new(profile.match_rule);
    let mut generator = RoundGenerator::seeded(8);

    for level in &profile.levels {
        let round = generator.generate(level, 1, &[]).unwrap();
        let Challenge::Pattern { sequence, choices, .. } = &round.challenge else {
            panic!("expected pattern round");
        };
        let echo: Vec<_> = sequence.iter().map(InputToken::symbol).collect();
        assert!(matcher.evaluate(&round, &echo).correct);

        let mut changed = echo.clone();
        let other = choices.iter().find(|c| *c != &sequence[0]).unwrap();
        changed[0] = InputToken::symbol(other);
        assert!(!matcher.evaluate(&round, &changed).correct);
    }
}

#[test]
fn test_matching_accepts_any_order() {
    let profile = GameProfile::emotion();
    let matcher = InputMatcher::new(profile.match_rule);
    let level = &profile.levels[0];
    let mut generator = RoundGenerator::seeded(1);

    let mut solved: Vec<String> = Vec::new();
    for category in default_emotions().into_iter().rev() {
        let round = generator.generate(level, solved.len() as u32 + 1, &solved).unwrap();
        let input = [InputToken::pair(category.glyph.clone(), category.label.clone())];
        assert!(matcher.evaluate(&round, &input).correct);
        solved.push(category.glyph);
    }
    assert_eq!(solved.len(), 4);
}
