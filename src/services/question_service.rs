use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::thread_rng;
use sqlx::PgPool;

use crate::error::Result;
use crate::models::question::{AnswerChoiceRow, PracticeQuestion, QuestionRow};

#[derive(Clone)]
pub struct QuestionService {
    pool: PgPool,
}

impl QuestionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the practice set for a subject: questions and their choices in
    /// two queries, joined in memory. Questions with no choices or no
    /// correct-flagged choice are dropped with a warning. The surviving set
    /// is shuffled uniformly, once per load.
    pub async fn load_practice_set(&self, subject_id: i64) -> Result<Vec<PracticeQuestion>> {
        let questions = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, subject_id, exam_id, question_text, explanation, rationale
            FROM s_practice_questions
            WHERE subject_id = $1
            "#,
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await?;

        if questions.is_empty() {
            return Ok(Vec::new());
        }

        let question_ids: Vec<i64> = questions.iter().map(|q| q.id).collect();

        // Letter labels are positional; the id ordering must be stable
        // across loads for a given question.
        let choices = sqlx::query_as::<_, AnswerChoiceRow>(
            r#"
            SELECT id, question_id, answer_text, is_correct
            FROM s_practice_answers
            WHERE question_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&question_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_question: HashMap<i64, Vec<AnswerChoiceRow>> = HashMap::new();
        for choice in choices {
            by_question.entry(choice.question_id).or_default().push(choice);
        }

        let mut formatted: Vec<PracticeQuestion> = Vec::with_capacity(questions.len());
        for question in questions {
            let question_id = question.id;
            let question_choices = by_question.remove(&question_id).unwrap_or_default();
            match PracticeQuestion::from_rows(question, &question_choices) {
                Some(q) => formatted.push(q),
                None => {
                    tracing::warn!(
                        question_id,
                        "question has no usable answer choices, dropping from practice set"
                    );
                }
            }
        }

        formatted.shuffle(&mut thread_rng());
        Ok(formatted)
    }
}
