use sqlx::PgPool;

use crate::error::Result;
use crate::models::exam::Exam;
use crate::models::subject::Subject;

#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_exams(&self) -> Result<Vec<Exam>> {
        let exams = sqlx::query_as::<_, Exam>(r#"SELECT * FROM s_exams ORDER BY name"#)
            .fetch_all(&self.pool)
            .await?;
        Ok(exams)
    }

    pub async fn get_exam(&self, exam_id: i64) -> Result<Exam> {
        let exam = sqlx::query_as::<_, Exam>(r#"SELECT * FROM s_exams WHERE id = $1"#)
            .bind(exam_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exam)
    }

    pub async fn list_subjects(&self, exam_id: i64) -> Result<Vec<Subject>> {
        let subjects = sqlx::query_as::<_, Subject>(
            r#"SELECT * FROM s_practice_subjects WHERE exam_id = $1 ORDER BY name"#,
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subjects)
    }

    pub async fn get_subject(&self, subject_id: i64) -> Result<Subject> {
        let subject = sqlx::query_as::<_, Subject>(
            r#"SELECT * FROM s_practice_subjects WHERE id = $1"#,
        )
        .bind(subject_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(subject)
    }
}
