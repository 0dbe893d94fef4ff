use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::practice_session::{PracticeSession, STATUS_FINALIZE_PENDING, STATUS_IN_PROGRESS};

#[derive(Clone)]
pub struct SessionService {
    pool: PgPool,
}

impl SessionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolves the exam a subject belongs to when the caller did not pass
    /// one explicitly.
    pub async fn resolve_exam_id(
        &self,
        subject_id: i64,
        exam_id: Option<i64>,
    ) -> Result<Option<i64>> {
        if exam_id.is_some() {
            return Ok(exam_id);
        }
        let resolved = sqlx::query_scalar::<_, Option<i64>>(
            r#"SELECT exam_id FROM s_practice_subjects WHERE id = $1"#,
        )
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(resolved.flatten())
    }

    pub async fn start(
        &self,
        user_id: Uuid,
        subject_id: i64,
        exam_id: Option<i64>,
        total_questions: i32,
    ) -> Result<PracticeSession> {
        let session = sqlx::query_as::<_, PracticeSession>(
            r#"
            INSERT INTO s_practice_sessions (user_id, subject_id, exam_id, start_time, status, total_questions)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(subject_id)
        .bind(exam_id)
        .bind(Utc::now())
        .bind(STATUS_IN_PROGRESS)
        .bind(total_questions)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn get_by_id(&self, session_id: Uuid) -> Result<PracticeSession> {
        let session = sqlx::query_as::<_, PracticeSession>(
            r#"SELECT * FROM s_practice_sessions WHERE id = $1"#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(session)
    }

    /// Best-effort marker set when the finalize transaction fails; the
    /// retry sweeper picks these sessions up later.
    pub async fn mark_finalize_pending(&self, session_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE s_practice_sessions
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status <> 'completed'
            "#,
        )
        .bind(STATUS_FINALIZE_PENDING)
        .bind(session_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_finalize_pending(&self, limit: i64) -> Result<Vec<PracticeSession>> {
        let rows = sqlx::query_as::<_, PracticeSession>(
            r#"
            SELECT * FROM s_practice_sessions
            WHERE status = $1
            ORDER BY updated_at
            LIMIT $2
            "#,
        )
        .bind(STATUS_FINALIZE_PENDING)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::practice_session::STATUS_COMPLETED;
    use sqlx::postgres::PgPoolOptions;

    async fn setup_test_db() -> PgPool {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .expect("Failed to create test pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        pool
    }

    async fn seed_subject(pool: &PgPool) -> (i64, i64) {
        let exam_id: i64 =
            sqlx::query_scalar("INSERT INTO s_exams (name) VALUES ('Exam') RETURNING id")
                .fetch_one(pool)
                .await
                .expect("seed exam");
        let subject_id: i64 = sqlx::query_scalar(
            "INSERT INTO s_practice_subjects (exam_id, name) VALUES ($1, 'Subject') RETURNING id",
        )
        .bind(exam_id)
        .fetch_one(pool)
        .await
        .expect("seed subject");
        (exam_id, subject_id)
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database"]
    async fn start_resolves_exam_from_subject() {
        let pool = setup_test_db().await;
        let service = SessionService::new(pool.clone());
        let (exam_id, subject_id) = seed_subject(&pool).await;

        let resolved = service
            .resolve_exam_id(subject_id, None)
            .await
            .expect("resolve");
        assert_eq!(resolved, Some(exam_id));

        let session = service
            .start(Uuid::new_v4(), subject_id, resolved, 12)
            .await
            .expect("start session");
        assert_eq!(session.status, STATUS_IN_PROGRESS);
        assert_eq!(session.total_questions, 12);
        assert!(session.end_time.is_none());
    }

    #[tokio::test]
    #[ignore = "requires a PostgreSQL database"]
    async fn finalize_pending_excludes_completed() {
        let pool = setup_test_db().await;
        let service = SessionService::new(pool.clone());
        let (exam_id, subject_id) = seed_subject(&pool).await;

        let session = service
            .start(Uuid::new_v4(), subject_id, Some(exam_id), 3)
            .await
            .expect("start session");

        sqlx::query("UPDATE s_practice_sessions SET status = $1 WHERE id = $2")
            .bind(STATUS_COMPLETED)
            .bind(session.id)
            .execute(&pool)
            .await
            .expect("complete");

        service
            .mark_finalize_pending(session.id)
            .await
            .expect("mark");
        let refreshed = service.get_by_id(session.id).await.expect("get");
        assert_eq!(refreshed.status, STATUS_COMPLETED);
    }
}
