use crate::error::BreachError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// DifficultyLevel
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Easy,
    #[default]
    Normal,
    Hard,
    Expert,
}

impl DifficultyLevel {
    pub fn all() -> &'static [DifficultyLevel] {
        &[
            DifficultyLevel::Easy,
            DifficultyLevel::Normal,
            DifficultyLevel::Hard,
            DifficultyLevel::Expert,
        ]
    }

    pub fn multiplier(self) -> f64 {
        match self {
            DifficultyLevel::Easy => 0.75,
            DifficultyLevel::Normal => 1.0,
            DifficultyLevel::Hard => 1.5,
            DifficultyLevel::Expert => 2.0,
        }
    }

    /// Scale a base duration, rounding half-up (3 × 1.5 = 4.5 → 5).
    pub fn scale(self, base_ticks: u64) -> u64 {
        (base_ticks as f64 * self.multiplier()).round() as u64
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "easy",
            DifficultyLevel::Normal => "normal",
            DifficultyLevel::Hard => "hard",
            DifficultyLevel::Expert => "expert",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DifficultyLevel {
    type Err = BreachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(DifficultyLevel::Easy),
            "normal" => Ok(DifficultyLevel::Normal),
            "hard" => Ok(DifficultyLevel::Hard),
            "expert" => Ok(DifficultyLevel::Expert),
            _ => Err(BreachError::UnknownDifficulty(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// The kinds of delayed work the scheduler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Connect,
    Scan,
    Crack,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Connect => "connect",
            ActionKind::Scan => "scan",
            ActionKind::Crack => "crack",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// UniqueList
// ---------------------------------------------------------------------------

/// Insertion-ordered list with unique entries.
///
/// Serializes as a plain sequence so save files stay readable and diffable.
/// Duplicates in hand-edited input are dropped on load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct UniqueList(Vec<String>);

impl UniqueList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns true if the value was not already present.
    pub fn insert(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.0.contains(&value) {
            return false;
        }
        self.0.push(value);
        true
    }

    pub fn remove(&mut self, value: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|v| v != value);
        self.0.len() != before
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for UniqueList {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw: Vec<String> = Vec::deserialize(d)?;
        Ok(raw.into_iter().collect())
    }
}

impl<S: Into<String>> FromIterator<S> for UniqueList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = UniqueList::new();
        for item in iter {
            list.insert(item);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hard_rounds_half_up() {
        assert_eq!(DifficultyLevel::Hard.scale(3), 5);
        assert_eq!(DifficultyLevel::Easy.scale(3), 2);
        assert_eq!(DifficultyLevel::Normal.scale(3), 3);
        assert_eq!(DifficultyLevel::Expert.scale(3), 6);
    }

    #[test]
    fn zero_base_stays_zero() {
        for level in DifficultyLevel::all() {
            assert_eq!(level.scale(0), 0);
        }
    }

    #[test]
    fn difficulty_parse() {
        assert_eq!("HARD".parse::<DifficultyLevel>().unwrap(), DifficultyLevel::Hard);
        assert!("insane".parse::<DifficultyLevel>().is_err());
    }

    #[test]
    fn unique_list_keeps_first_insertion_order() {
        let mut list = UniqueList::new();
        assert!(list.insert("b"));
        assert!(list.insert("a"));
        assert!(!list.insert("b"));
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn unique_list_dedupes_on_load() {
        let list: UniqueList = serde_yaml::from_str("[x, y, x]").unwrap();
        assert_eq!(list.len(), 2);
        let out = serde_yaml::to_string(&list).unwrap();
        assert_eq!(out, "- x\n- y\n");
    }
}
