//! Sample configuration data.
//!
//! All timestamps are fixed so fixtures compare and fingerprint the same
//! across runs.

use chrono::{DateTime, TimeZone, Utc};
use kwiz_core::model::{Difficulty, QuestionSection};
use kwiz_core::{Achievement, ConfigSnapshot, QuizCategory, QuizQuestion};
use serde_json::json;

/// Fixed reference time used by every fixture
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("fixed_time: invalid date"))
}

/// A four-option question with id `id`
pub fn sample_question(id: &str) -> QuizQuestion {
    let mut question = QuizQuestion::new(
        id,
        format!("Which keyword declares an immutable binding? ({id})"),
        vec![
            "let".to_string(),
            "mut".to_string(),
            "var".to_string(),
            "const".to_string(),
        ],
        0,
    );
    question.difficulty = Difficulty::Beginner;
    question.category = "programming".to_string();
    question.subcategory = "rust".to_string();
    question.fun_fact = "Bindings are immutable unless marked mut.".to_string();
    question.section = Some(QuestionSection::Category);
    question
}

/// Questions `q1` through `q{count}`
pub fn sample_questions(count: usize) -> Vec<QuizQuestion> {
    (1..=count)
        .map(|n| sample_question(&format!("q{n}")))
        .collect()
}

pub fn sample_category(id: &str) -> QuizCategory {
    let mut category = QuizCategory::new(id, id.to_uppercase());
    category.icon = "code".to_string();
    category.color = "#3366ff".to_string();
    category
}

pub fn sample_achievement(id: &str) -> Achievement {
    let mut achievement = Achievement::new(id, format!("Achievement {id}"));
    achievement.requirement_type = "questions_answered".to_string();
    achievement.requirement_value = 10;
    achievement.coin_reward = 100;
    achievement
}

/// A realistic snapshot: five questions, two categories, one achievement,
/// coin values, popup settings, config values and feature flags.
pub fn sample_snapshot() -> ConfigSnapshot {
    let mut snapshot = ConfigSnapshot::default();
    let at = fixed_time();

    snapshot.quiz.questions = sample_questions(5);
    snapshot.quiz.categories = vec![sample_category("rust"), sample_category("web")];
    snapshot.quiz.settings = json!({"timeLimit": 30, "shuffleOptions": true});
    snapshot.quiz.updated_at = at;

    snapshot.rewards.achievements = vec![sample_achievement("first-steps")];
    snapshot.rewards.coin_values.correct = 14;
    snapshot.rewards.popup_settings = json!({"showDelay": 2, "autoClose": true});
    snapshot.rewards.updated_at = at;

    snapshot
        .settings
        .config_values
        .insert("maxQuestions".to_string(), json!(10));
    snapshot
        .settings
        .feature_flags
        .insert("leaderboard".to_string(), true);
    snapshot.settings.updated_at = at;

    snapshot
}
