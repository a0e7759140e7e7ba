//! Input parser: turns a typed line into engine input
//!
//! - arithmetic: one integer, e.g. `-3`
//! - patterns: instrument names or 1-based choice indices, e.g. `piano 2 drum`
//! - emotions: `<item> <label>`, either side by glyph/name or 1-based index
//!
//! Control words (`submit`, `pause`, `resume`, `reset`, `quit`) work in
//! every game.

use lazy_static::lazy_static;
use regex::Regex;
use crate::types::{InputToken, MatchRule, RoundView};

lazy_static! {
    static ref RE_COMMAND: Regex = Regex::new(
        r"(?i)^\s*(submit|done|pause|resume|reset|restart|quit|exit|q)\s*$"
    ).unwrap();

    static ref RE_INTEGER: Regex = Regex::new(r"^\s*([+-]?\d{1,18})\s*$").unwrap();

    // Separators between sequence entries
    static ref RE_SEPARATOR: Regex = Regex::new(r"[\s,;]+").unwrap();

    // `item label`, `item=label`, `item -> label`, `item: label`
    static ref RE_PAIR: Regex = Regex::new(
        r"^\s*(\S+?)\s*(?:->|=|:|\s)\s*(\S+)\s*$"
    ).unwrap();
}

/// One parsed line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Answer(Vec<InputToken>),
    Submit,
    Pause,
    Resume,
    Reset,
    Quit,
    /// Nothing usable in the line
    Unrecognized(String),
}

/// Line parser bound to one game's input shape
#[derive(Debug, Clone, Copy)]
pub struct InputParser {
    rule: MatchRule,
}

impl InputParser {
    pub fn new(rule: MatchRule) -> Self {
        Self { rule }
    }

    /// Parse `line` against the round currently shown
    pub fn parse(&self, line: &str, round: Option<&RoundView>) -> Command {
        let line = line.trim();
        if line.is_empty() {
            return Command::Unrecognized(String::new());
        }

        if let Some(caps) = RE_COMMAND.captures(line) {
            return match caps[1].to_lowercase().as_str() {
                "submit" | "done" => Command::Submit,
                "pause" => Command::Pause,
                "resume" => Command::Resume,
                "reset" | "restart" => Command::Reset,
                _ => Command::Quit,
            };
        }

        let tokens = match self.rule {
            MatchRule::NumericEquality => parse_number(line),
            MatchRule::OrderedSequence => parse_sequence(line, round),
            MatchRule::UnorderedLabels => parse_pair(line, round),
        };

        match tokens {
            Some(tokens) if !tokens.is_empty() => Command::Answer(tokens),
            _ => Command::Unrecognized(line.to_string()),
        }
    }

    /// Tokens only; control words and garbage yield `None`
    pub fn tokens(&self, line: &str, round: Option<&RoundView>) -> Option<Vec<InputToken>> {
        match self.parse(line, round) {
            Command::Answer(tokens) => Some(tokens),
            _ => None,
        }
    }
}

fn parse_number(line: &str) -> Option<Vec<InputToken>> {
    let caps = RE_INTEGER.captures(line)?;
    let value = caps[1].parse::<i64>().ok()?;
    Some(vec![InputToken::number(value)])
}

fn parse_sequence(line: &str, round: Option<&RoundView>) -> Option<Vec<InputToken>> {
    let choices = round.map(|r| r.choices.as_slice()).unwrap_or(&[]);
    RE_SEPARATOR
        .split(line)
        .filter(|part| !part.is_empty())
        .map(|part| resolve(part, choices).map(InputToken::symbol))
        .collect()
}

fn parse_pair(line: &str, round: Option<&RoundView>) -> Option<Vec<InputToken>> {
    let caps = RE_PAIR.captures(line)?;
    let (items, labels) = match round {
        Some(view) => (view.items.as_slice(), view.choices.as_slice()),
        None => (&[][..], &[][..]),
    };
    let item = resolve(&caps[1], items)?;
    let label = resolve(&caps[2], labels)?;
    Some(vec![InputToken::pair(item, label)])
}

/// Match `part` to an offered value by 1-based index or case-insensitive
/// name. With nothing offered the text is taken as-is.
fn resolve(part: &str, offered: &[String]) -> Option<String> {
    if offered.is_empty() {
        return Some(part.to_string());
    }
    if let Ok(index) = part.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| offered.get(i)).cloned();
    }
    offered.iter().find(|o| o.eq_ignore_ascii_case(part) || o.as_str() == part).cloned()
}

// =============================================================================
// TESTS
// =============================================================================
