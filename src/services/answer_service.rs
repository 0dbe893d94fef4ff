use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::Result;
use crate::models::user_answer::{NewAnswer, UserAnswer};

#[derive(Clone)]
pub struct AnswerService {
    pool: PgPool,
}

const UPSERT_SQL: &str = r#"
    INSERT INTO s_user_answers
        (user_id, question_id, session_id, selected_answer, is_correct, time_taken_seconds)
    VALUES ($1, $2, $3, $4, $5, $6)
    ON CONFLICT (user_id, question_id, session_id) DO UPDATE
    SET selected_answer = EXCLUDED.selected_answer,
        is_correct = EXCLUDED.is_correct,
        time_taken_seconds = EXCLUDED.time_taken_seconds,
        updated_at = NOW()
"#;

impl AnswerService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Atomic upsert keyed by (user, question, session): re-answering
    /// overwrites the row instead of duplicating it.
    pub async fn upsert(&self, answer: &NewAnswer) -> Result<()> {
        sqlx::query(UPSERT_SQL)
            .bind(answer.user_id)
            .bind(answer.question_id)
            .bind(answer.session_id)
            .bind(answer.selected_answer.to_string())
            .bind(answer.is_correct)
            .bind(answer.time_taken_seconds)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Same upsert inside the caller's transaction; used by the finalize
    /// path to re-drive writes that failed during play.
    pub async fn upsert_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        answer: &NewAnswer,
    ) -> Result<()> {
        sqlx::query(UPSERT_SQL)
            .bind(answer.user_id)
            .bind(answer.question_id)
            .bind(answer.session_id)
            .bind(answer.selected_answer.to_string())
            .bind(answer.is_correct)
            .bind(answer.time_taken_seconds)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Prior answers for the given questions, used to seed the answered
    /// state when a quiz opens. Later sessions win on duplicates.
    pub async fn load_for_questions(
        &self,
        user_id: Uuid,
        question_ids: &[i64],
    ) -> Result<HashMap<i64, (char, bool)>> {
        let rows = sqlx::query_as::<_, UserAnswer>(
            r#"
            SELECT * FROM s_user_answers
            WHERE user_id = $1 AND question_id = ANY($2)
            ORDER BY answered_at
            "#,
        )
        .bind(user_id)
        .bind(question_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut map = HashMap::new();
        for row in rows {
            if let Some(letter) = row.selected_answer.chars().next() {
                map.insert(row.question_id, (letter, row.is_correct));
            }
        }
        Ok(map)
    }

    /// Distinct correct count for one session, used by the finalize-retry
    /// sweeper when the in-memory answer map is gone.
    pub async fn session_correct_count(&self, session_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(DISTINCT question_id) FROM s_user_answers
            WHERE session_id = $1 AND is_correct
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
