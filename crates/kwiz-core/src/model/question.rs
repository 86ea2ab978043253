//! Quiz questions and categories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Keyed;

/// Difficulty tier of a question
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// Where in the app a question is surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSection {
    Onboarding,
    Homepage,
    Category,
    General,
}

/// Regular questions pay the standard coin value, bonus questions pay the bonus value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Regular,
    Bonus,
}

/// A single multiple-choice quiz question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub correct_answer: usize,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub fun_fact: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<QuestionSection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl QuizQuestion {
    /// Create a question with default metadata
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        options: Vec<String>,
        correct_answer: usize,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            options,
            correct_answer,
            difficulty: Difficulty::default(),
            fun_fact: String::new(),
            category: String::new(),
            subcategory: String::new(),
            section: None,
            tags: Vec::new(),
            question_type: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Text of the correct option, if the index is in range
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_answer).map(String::as_str)
    }
}

impl Keyed for QuizQuestion {
    fn key(&self) -> &str {
        &self.id
    }

    fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

/// A quiz category shown on the home page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub difficulty_levels: Vec<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl QuizCategory {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            icon: String::new(),
            color: String::new(),
            difficulty_levels: vec![
                Difficulty::Beginner,
                Difficulty::Intermediate,
                Difficulty::Advanced,
            ],
            updated_at: None,
        }
    }
}

impl Keyed for QuizCategory {
    fn key(&self) -> &str {
        &self.id
    }

    fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}
