use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const STATUS_IN_PROGRESS: &str = "in_progress";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_FINALIZE_PENDING: &str = "finalize_pending";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PracticeSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject_id: i64,
    pub exam_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: String,
    pub total_questions: i32,
    pub correct_answers: Option<i32>,
    pub total_time_seconds: Option<i32>,
    pub score: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Final numbers written at session end; both exit paths build the same
/// value so the finalize stays last-write-wins idempotent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionStats {
    pub total_questions: i32,
    pub correct_answers: i32,
    pub total_time_seconds: i32,
    pub score: f64,
}
