use serde::{Deserialize, Serialize};

/// Column order of each table. Queries select exactly these columns.
pub const CATEGORY_FIELDS: [&str; 2] = ["id", "name"];
pub const QUIZ_FIELDS: [&str; 4] = ["id", "title", "level", "category_id"];
pub const QUESTION_FIELDS: [&str; 4] = ["id", "content", "score", "quiz_id"];
pub const OPTION_FIELDS: [&str; 3] = ["id", "content", "is_correct"];

// Validated create payloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuiz {
    pub title: String,
    pub level: i64,
    pub category_id: i64,
}

/// A question with its distractors and the single correct answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub content: String,
    pub score: i64,
    pub quiz_id: i64,
    pub distractors: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
}
