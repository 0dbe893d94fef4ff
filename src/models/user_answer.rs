use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAnswer {
    pub id: i64,
    pub user_id: Uuid,
    pub question_id: i64,
    pub session_id: Uuid,
    pub selected_answer: String,
    pub is_correct: bool,
    pub time_taken_seconds: i32,
    pub answered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for the atomic (user, question, session) upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnswer {
    pub user_id: Uuid,
    pub question_id: i64,
    pub session_id: Uuid,
    pub selected_answer: char,
    pub is_correct: bool,
    pub time_taken_seconds: i32,
}
