use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Clone)]
pub struct AccessService {
    pool: PgPool,
}

impl AccessService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Entry gate for the practice quiz. Access grants are materialized by
    /// the payment flow elsewhere; here they are only consumed: a paid or
    /// demo grant row for (user, exam) admits the user.
    pub async fn ensure_exam_access(&self, user_id: Uuid, exam_id: i64) -> Result<()> {
        let allowed = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM s_user_exams
                WHERE user_id = $1 AND exam_id = $2
                  AND (is_paid OR access_type IN ('paid', 'demo'))
            )
            "#,
        )
        .bind(user_id)
        .bind(exam_id)
        .fetch_one(&self.pool)
        .await?;

        if !allowed {
            return Err(Error::Forbidden(
                "No access to this exam. Purchase or start a demo first.".to_string(),
            ));
        }
        Ok(())
    }
}
