use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Cumulative per-exam coverage: distinct questions ever answered and
/// distinct questions ever answered correctly, across all sessions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProgress {
    pub id: i64,
    pub user_id: Uuid,
    pub exam_id: i64,
    pub questions_completed: i32,
    pub correct_answers: i32,
    pub score: Option<f64>,
    pub last_updated_at: DateTime<Utc>,
    pub created_at: Option<DateTime<Utc>>,
}
