//! Configuration data model shared by the admin and frontend stores

mod question;
mod rewards;
mod snapshot;

pub use question::{Difficulty, QuestionSection, QuestionType, QuizCategory, QuizQuestion};
pub use rewards::{Achievement, CoinValues, limits};
pub use snapshot::{
    ConfigSnapshot, QuizSection, RewardSection, Section, SettingsSection, SnapshotPatch,
};

use chrono::{DateTime, Utc};

/// An item stored in an id-keyed collection
pub trait Keyed {
    /// Stable identifier used to pair items across snapshots
    fn key(&self) -> &str;

    /// Item-level modification time, when the item tracks one
    fn modified_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}
