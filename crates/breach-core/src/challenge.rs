//! Puzzle generators keyed by challenge type, plus answer verification.

use crate::error::BreachError;
use crate::types::DifficultyLevel;
use rand::seq::IteratorRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ChallengeType
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeType {
    Math,
    Logic,
    Pattern,
}

impl ChallengeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChallengeType::Math => "math",
            ChallengeType::Logic => "logic",
            ChallengeType::Pattern => "pattern",
        }
    }
}

impl fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChallengeType {
    type Err = BreachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "math" => Ok(ChallengeType::Math),
            "logic" => Ok(ChallengeType::Logic),
            "pattern" => Ok(ChallengeType::Pattern),
            _ => Err(BreachError::UnknownChallengeType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Challenge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ChallengeType,
    pub question: String,
    pub answer: String,
    pub hint: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<DifficultyLevel>,
}

fn challenge_id(kind: ChallengeType) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{kind}-{}", &id[..8])
}

/// Case-insensitive comparison after trimming both sides.
pub fn verify(challenge: &Challenge, submitted: &str) -> bool {
    submitted.trim().to_lowercase() == challenge.answer.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

pub trait ChallengeGenerator {
    fn kind(&self) -> ChallengeType;

    fn difficulty(&self) -> Option<DifficultyLevel> {
        None
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Challenge;
}

fn operand_ceiling(difficulty: Option<DifficultyLevel>) -> i64 {
    match difficulty.unwrap_or_default() {
        DifficultyLevel::Easy => 10,
        DifficultyLevel::Normal => 25,
        DifficultyLevel::Hard => 60,
        DifficultyLevel::Expert => 150,
    }
}

/// Single arithmetic operation on two integers.
pub struct MathGenerator {
    difficulty: Option<DifficultyLevel>,
}

impl MathGenerator {
    pub fn new(difficulty: Option<DifficultyLevel>) -> Self {
        Self { difficulty }
    }
}

impl ChallengeGenerator for MathGenerator {
    fn kind(&self) -> ChallengeType {
        ChallengeType::Math
    }

    fn difficulty(&self) -> Option<DifficultyLevel> {
        self.difficulty
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Challenge {
        let max = operand_ceiling(self.difficulty);
        let a = rng.gen_range(2..=max);
        let b = rng.gen_range(2..=max);
        let (symbol, name, result) = match rng.gen_range(0..3) {
            0 => ('+', "sum", a + b),
            1 => ('-', "difference", a - b),
            _ => ('*', "product", a * b),
        };
        Challenge {
            id: challenge_id(ChallengeType::Math),
            kind: ChallengeType::Math,
            question: format!("What is {a} {symbol} {b}?"),
            answer: result.to_string(),
            hint: format!("Compute the {name} of the two numbers"),
            explanation: format!("{a} {symbol} {b} = {result}"),
            difficulty: self.difficulty,
        }
    }
}

/// Boolean gate evaluation.
pub struct LogicGenerator {
    difficulty: Option<DifficultyLevel>,
}

impl LogicGenerator {
    pub fn new(difficulty: Option<DifficultyLevel>) -> Self {
        Self { difficulty }
    }
}

impl ChallengeGenerator for LogicGenerator {
    fn kind(&self) -> ChallengeType {
        ChallengeType::Logic
    }

    fn difficulty(&self) -> Option<DifficultyLevel> {
        self.difficulty
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Challenge {
        let a = rng.gen_bool(0.5) as u8;
        let b = rng.gen_bool(0.5) as u8;
        let (gate, result, rule) = match rng.gen_range(0..3) {
            0 => ("AND", a & b, "AND is 1 only when both inputs are 1"),
            1 => ("OR", a | b, "OR is 1 when at least one input is 1"),
            _ => ("XOR", a ^ b, "XOR is 1 when the inputs differ"),
        };
        Challenge {
            id: challenge_id(ChallengeType::Logic),
            kind: ChallengeType::Logic,
            question: format!("What is {a} {gate} {b}? (answer 0 or 1)"),
            answer: result.to_string(),
            hint: rule.to_string(),
            explanation: format!("{a} {gate} {b} = {result} because {}", rule.to_lowercase()),
            difficulty: self.difficulty,
        }
    }
}

/// Next term of an arithmetic or geometric sequence.
pub struct PatternGenerator {
    difficulty: Option<DifficultyLevel>,
}

impl PatternGenerator {
    pub fn new(difficulty: Option<DifficultyLevel>) -> Self {
        Self { difficulty }
    }
}

impl ChallengeGenerator for PatternGenerator {
    fn kind(&self) -> ChallengeType {
        ChallengeType::Pattern
    }

    fn difficulty(&self) -> Option<DifficultyLevel> {
        self.difficulty
    }

    fn generate(&self, rng: &mut dyn RngCore) -> Challenge {
        let start = rng.gen_range(1..=operand_ceiling(self.difficulty) / 2);
        let geometric = rng.gen_bool(0.5);
        let step = if geometric {
            rng.gen_range(2..=3)
        } else {
            rng.gen_range(2..=9)
        };
        let terms: Vec<i64> = (0..5)
            .scan(start, |acc, _| {
                let cur = *acc;
                *acc = if geometric { cur * step } else { cur + step };
                Some(cur)
            })
            .collect();
        let shown = terms[..4]
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let (hint, rule) = if geometric {
            (
                "Each term is a multiple of the one before".to_string(),
                format!("multiply by {step}"),
            )
        } else {
            (
                "The gap between terms is constant".to_string(),
                format!("add {step}"),
            )
        };
        Challenge {
            id: challenge_id(ChallengeType::Pattern),
            kind: ChallengeType::Pattern,
            question: format!("What comes next: {shown}, ?"),
            answer: terms[4].to_string(),
            hint,
            explanation: format!("The rule is {rule}, so the next term is {}", terms[4]),
            difficulty: self.difficulty,
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// One generator per challenge type; registering a type again replaces it.
#[derive(Default)]
pub struct ChallengeRegistry {
    generators: BTreeMap<ChallengeType, Box<dyn ChallengeGenerator>>,
}

impl ChallengeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the math, logic, and pattern generators.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MathGenerator::new(Some(DifficultyLevel::Easy))));
        registry.register(Box::new(LogicGenerator::new(Some(DifficultyLevel::Normal))));
        registry.register(Box::new(PatternGenerator::new(Some(DifficultyLevel::Hard))));
        registry
    }

    pub fn register(&mut self, generator: Box<dyn ChallengeGenerator>) {
        let kind = generator.kind();
        if self.generators.insert(kind, generator).is_some() {
            tracing::debug!(kind = %kind, "challenge generator replaced");
        }
    }

    pub fn get(&self, kind: ChallengeType) -> Option<&dyn ChallengeGenerator> {
        self.generators.get(&kind).map(|g| g.as_ref())
    }

    pub fn types(&self) -> Vec<ChallengeType> {
        self.generators.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Uniform pick over registered types. `None` when nothing is registered.
    pub fn generate_random(&self, rng: &mut dyn RngCore) -> Option<Challenge> {
        let generator = self.generators.values().choose(rng)?;
        Some(generator.generate(rng))
    }

    pub fn generate_by_type(&self, kind: ChallengeType, rng: &mut dyn RngCore) -> Option<Challenge> {
        self.get(kind).map(|g| g.generate(rng))
    }
}
