use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::error::Result;
use crate::models::practice_session::{PracticeSession, SessionStats, STATUS_COMPLETED};
use crate::models::user_answer::NewAnswer;
use crate::models::user_progress::UserProgress;
use crate::services::answer_service::AnswerService;

#[derive(Clone)]
pub struct ProgressService {
    pool: PgPool,
    answers: AnswerService,
}

impl ProgressService {
    pub fn new(pool: PgPool) -> Self {
        let answers = AnswerService::new(pool.clone());
        Self { pool, answers }
    }

    /// End-of-session writes in one transaction: re-drive answer rows the
    /// optimistic path failed to commit, finalize the session row, then
    /// recompute cumulative exam progress and upsert it. Safe to run more
    /// than once with the same stats (last write wins throughout).
    pub async fn finalize_session(
        &self,
        session_id: Option<Uuid>,
        user_id: Uuid,
        exam_id: Option<i64>,
        stats: SessionStats,
        reconcile: &[NewAnswer],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for answer in reconcile {
            self.answers.upsert_in_tx(&mut tx, answer).await?;
        }

        if let Some(session_id) = session_id {
            self.complete_session_in_tx(&mut tx, session_id, stats)
                .await?;
        }

        if let Some(exam_id) = exam_id {
            self.upsert_progress_in_tx(&mut tx, user_id, exam_id, stats.score)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn complete_session_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        session_id: Uuid,
        stats: SessionStats,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE s_practice_sessions
            SET end_time = $1, status = $2, total_questions = $3, correct_answers = $4,
                total_time_seconds = $5, score = $6, updated_at = NOW()
            WHERE id = $7
            "#,
        )
        .bind(Utc::now())
        .bind(STATUS_COMPLETED)
        .bind(stats.total_questions)
        .bind(stats.correct_answers)
        .bind(stats.total_time_seconds)
        .bind(stats.score)
        .bind(session_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Cumulative coverage over the exam's full question set: distinct
    /// questions ever answered and distinct questions ever answered
    /// correctly, across all of the user's sessions. A question re-answered
    /// in a later session counts once.
    async fn upsert_progress_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Uuid,
        exam_id: i64,
        score: f64,
    ) -> Result<()> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(DISTINCT ua.question_id) AS completed,
                   COUNT(DISTINCT ua.question_id) FILTER (WHERE ua.is_correct) AS correct
            FROM s_user_answers ua
            JOIN s_practice_questions q ON q.id = ua.question_id
            WHERE ua.user_id = $1 AND q.exam_id = $2
            "#,
        )
        .bind(user_id)
        .bind(exam_id)
        .fetch_one(&mut **tx)
        .await?;
        let completed: i64 = row.try_get("completed")?;
        let correct: i64 = row.try_get("correct")?;

        sqlx::query(
            r#"
            INSERT INTO s_user_progress (user_id, exam_id, questions_completed, correct_answers, score, last_updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (user_id, exam_id) DO UPDATE
            SET questions_completed = EXCLUDED.questions_completed,
                correct_answers = EXCLUDED.correct_answers,
                score = EXCLUDED.score,
                last_updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(exam_id)
        .bind(completed as i32)
        .bind(correct as i32)
        .bind(score)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn get_for_exam(&self, user_id: Uuid, exam_id: i64) -> Result<Option<UserProgress>> {
        let row = sqlx::query_as::<_, UserProgress>(
            r#"SELECT * FROM s_user_progress WHERE user_id = $1 AND exam_id = $2"#,
        )
        .bind(user_id)
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Retries sessions whose finalize transaction failed earlier. Stats
    /// are rebuilt from persisted rows since the in-memory answer map is
    /// gone by the time the sweeper runs.
    pub async fn retry_finalize_pending(&self, sessions: &[PracticeSession]) -> Result<usize> {
        let mut retried = 0;
        for session in sessions {
            let correct = self.answers.session_correct_count(session.id).await? as i32;
            let total = session.total_questions;
            let score = if total > 0 {
                correct as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            let elapsed = session
                .total_time_seconds
                .or_else(|| {
                    session
                        .end_time
                        .map(|end| (end - session.start_time).num_seconds() as i32)
                })
                .unwrap_or(0);

            let stats = SessionStats {
                total_questions: total,
                correct_answers: correct,
                total_time_seconds: elapsed,
                score,
            };
            match self
                .finalize_session(Some(session.id), session.user_id, session.exam_id, stats, &[])
                .await
            {
                Ok(()) => {
                    tracing::info!(session_id = %session.id, "retried pending finalize");
                    retried += 1;
                }
                Err(e) => {
                    tracing::error!(session_id = %session.id, error = ?e, "finalize retry failed");
                }
            }
        }
        Ok(retried)
    }
}
