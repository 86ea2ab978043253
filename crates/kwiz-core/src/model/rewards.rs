//! Reward rules: coin values and achievements

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Keyed;

/// Validation bounds for reward configuration
pub mod limits {
    pub const COIN_MIN_VALUE: u32 = 1;
    pub const COIN_MAX_VALUE: u32 = 1000;
    pub const STREAK_MIN_MULTIPLIER: f64 = 1.0;
    pub const STREAK_MAX_MULTIPLIER: f64 = 10.0;
}

/// Coins paid out per answer outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinValues {
    pub correct: u32,
    /// May be zero: wrong answers commonly pay nothing
    pub incorrect: u32,
    pub bonus: u32,
    pub streak_multiplier: f64,
}

impl Default for CoinValues {
    fn default() -> Self {
        Self {
            correct: 25,
            incorrect: 0,
            bonus: 50,
            streak_multiplier: 1.0,
        }
    }
}

impl CoinValues {
    /// Check every value against [`limits`], returning one message per violation.
    pub fn violations(&self) -> Vec<String> {
        use limits::*;

        let mut problems = Vec::new();
        let in_range = |v: u32| (COIN_MIN_VALUE..=COIN_MAX_VALUE).contains(&v);

        if !in_range(self.correct) {
            problems.push(format!(
                "coinValues.correct must be between {} and {}, got {}",
                COIN_MIN_VALUE, COIN_MAX_VALUE, self.correct
            ));
        }
        if self.incorrect > COIN_MAX_VALUE {
            problems.push(format!(
                "coinValues.incorrect must be at most {}, got {}",
                COIN_MAX_VALUE, self.incorrect
            ));
        }
        if !in_range(self.bonus) {
            problems.push(format!(
                "coinValues.bonus must be between {} and {}, got {}",
                COIN_MIN_VALUE, COIN_MAX_VALUE, self.bonus
            ));
        }
        if !(STREAK_MIN_MULTIPLIER..=STREAK_MAX_MULTIPLIER).contains(&self.streak_multiplier) {
            problems.push(format!(
                "coinValues.streakMultiplier must be between {} and {}, got {}",
                STREAK_MIN_MULTIPLIER, STREAK_MAX_MULTIPLIER, self.streak_multiplier
            ));
        }

        problems
    }
}

/// An unlockable achievement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    /// e.g. "questions_answered", "streak"
    #[serde(default)]
    pub requirement_type: String,
    #[serde(default)]
    pub requirement_value: u32,
    #[serde(default)]
    pub coin_reward: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Achievement {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            icon: String::new(),
            requirement_type: String::new(),
            requirement_value: 1,
            coin_reward: 0,
            is_active: true,
            updated_at: None,
        }
    }
}

impl Keyed for Achievement {
    fn key(&self) -> &str {
        &self.id
    }

    fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_coin_values_are_valid() {
        assert!(CoinValues::default().violations().is_empty());
    }

    #[test]
    fn out_of_range_values_are_reported() {
        let coins = CoinValues {
            correct: 0,
            incorrect: 2000,
            bonus: 50,
            streak_multiplier: 11.0,
        };
        let problems = coins.violations();
        assert_eq!(problems.len(), 3);
        assert!(problems[0].contains("correct"));
    }

    #[test]
    fn achievement_defaults_to_active() {
        let a: Achievement =
            serde_json::from_str(r#"{"id":"first","name":"First Quiz"}"#).unwrap();
        assert!(a.is_active);
    }
}
