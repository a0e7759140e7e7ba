//! Level descriptors and the typed operator table

use serde::{Deserialize, Serialize};

/// Arithmetic operators a level may draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "*")]
    Multiply,
}

impl Operator {
    /// Apply the operator. Checked: overflow yields `None`.
    pub fn apply(&self, lhs: i64, rhs: i64) -> Option<i64> {
        match self {
            Operator::Add => lhs.checked_add(rhs),
            Operator::Subtract => lhs.checked_sub(rhs),
            Operator::Multiply => lhs.checked_mul(rhs),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A generated binary expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    pub lhs: i64,
    pub op: Operator,
    pub rhs: i64,
}

impl Expression {
    pub fn new(lhs: i64, op: Operator, rhs: i64) -> Self {
        Self { lhs, op, rhs }
    }

    /// Evaluate with the same operator table used to generate it
    pub fn evaluate(&self) -> Option<i64> {
        self.op.apply(self.lhs, self.rhs)
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} = ?", self.lhs, self.op, self.rhs)
    }
}

/// One matchable category: the label to pick and the glyph shown for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub label: String,
    pub glyph: String,
}

impl Category {
    pub fn new(label: impl Into<String>, glyph: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            glyph: glyph.into(),
        }
    }
}

/// Generation parameters, one variant per game family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Difficulty {
    Arithmetic {
        operators: Vec<Operator>,
        max_number: i64,
    },
    Pattern {
        symbols: Vec<String>,
        pattern_length: usize,
        /// How long each symbol is shown during the reveal
        #[serde(default = "default_reveal_ms")]
        reveal_ms: u64,
    },
    Matching {
        categories: Vec<Category>,
    },
}

impl Difficulty {
    /// Serialized `kind` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Difficulty::Arithmetic { .. } => "arithmetic",
            Difficulty::Pattern { .. } => "pattern",
            Difficulty::Matching { .. } => "matching",
        }
    }
}

fn default_reveal_ms() -> u64 {
    1000
}

/// A named difficulty tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub name: String,
    pub difficulty: Difficulty,
    /// Correct rounds needed to clear the level
    pub rounds: u32,
    /// Countdown budget; `None` means untimed
    #[serde(default)]
    pub time_limit_secs: Option<u32>,
}

impl LevelDescriptor {
    pub fn arithmetic(
        name: &str,
        operators: &[Operator],
        max_number: i64,
        rounds: u32,
        time_limit_secs: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            difficulty: Difficulty::Arithmetic {
                operators: operators.to_vec(),
                max_number,
            },
            rounds,
            time_limit_secs: Some(time_limit_secs),
        }
    }

    pub fn pattern(
        name: &str,
        symbols: &[&str],
        pattern_length: usize,
        reveal_ms: u64,
        rounds: u32,
        time_limit_secs: u32,
    ) -> Self {
        Self {
            name: name.to_string(),
            difficulty: Difficulty::Pattern {
                symbols: symbols.iter().map(|s| s.to_string()).collect(),
                pattern_length,
                reveal_ms,
            },
            rounds,
            time_limit_secs: Some(time_limit_secs),
        }
    }

    pub fn matching(name: &str, categories: Vec<Category>, rounds: u32) -> Self {
        Self {
            name: name.to_string(),
            difficulty: Difficulty::Matching { categories },
            rounds,
            time_limit_secs: None,
        }
    }
}
