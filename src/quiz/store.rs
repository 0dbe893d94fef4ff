use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::practice_session::{PracticeSession, SessionStats};
use crate::models::question::PracticeQuestion;
use crate::models::user_answer::NewAnswer;
use crate::services::answer_service::AnswerService;
use crate::services::bookmark_service::BookmarkService;
use crate::services::progress_service::ProgressService;
use crate::services::question_service::QuestionService;
use crate::services::session_service::SessionService;

/// Everything the quiz controller needs from storage, behind one seam so
/// controller behavior is testable without a database.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PracticeStore: Send + Sync {
    async fn load_practice_set(&self, subject_id: i64) -> Result<Vec<PracticeQuestion>>;

    async fn resolve_exam_id(&self, subject_id: i64, exam_id: Option<i64>)
        -> Result<Option<i64>>;

    async fn start_session(
        &self,
        user_id: Uuid,
        subject_id: i64,
        exam_id: Option<i64>,
        total_questions: i32,
    ) -> Result<PracticeSession>;

    async fn load_bookmarks(&self, user_id: Uuid) -> Result<HashSet<i64>>;

    async fn load_answers(
        &self,
        user_id: Uuid,
        question_ids: Vec<i64>,
    ) -> Result<HashMap<i64, (char, bool)>>;

    async fn upsert_answer(&self, answer: NewAnswer) -> Result<()>;

    async fn toggle_bookmark(&self, user_id: Uuid, question_id: i64) -> Result<bool>;

    async fn finalize_session(
        &self,
        session_id: Option<Uuid>,
        user_id: Uuid,
        exam_id: Option<i64>,
        stats: SessionStats,
        reconcile: Vec<NewAnswer>,
    ) -> Result<()>;

    async fn mark_finalize_pending(&self, session_id: Uuid) -> Result<()>;
}

/// Production store: delegates to the sqlx-backed services.
#[derive(Clone)]
pub struct PgPracticeStore {
    questions: QuestionService,
    sessions: SessionService,
    answers: AnswerService,
    bookmarks: BookmarkService,
    progress: ProgressService,
}

impl PgPracticeStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            questions: QuestionService::new(pool.clone()),
            sessions: SessionService::new(pool.clone()),
            answers: AnswerService::new(pool.clone()),
            bookmarks: BookmarkService::new(pool.clone()),
            progress: ProgressService::new(pool),
        }
    }
}

#[async_trait]
impl PracticeStore for PgPracticeStore {
    async fn load_practice_set(&self, subject_id: i64) -> Result<Vec<PracticeQuestion>> {
        self.questions.load_practice_set(subject_id).await
    }

    async fn resolve_exam_id(
        &self,
        subject_id: i64,
        exam_id: Option<i64>,
    ) -> Result<Option<i64>> {
        self.sessions.resolve_exam_id(subject_id, exam_id).await
    }

    async fn start_session(
        &self,
        user_id: Uuid,
        subject_id: i64,
        exam_id: Option<i64>,
        total_questions: i32,
    ) -> Result<PracticeSession> {
        self.sessions
            .start(user_id, subject_id, exam_id, total_questions)
            .await
    }

    async fn load_bookmarks(&self, user_id: Uuid) -> Result<HashSet<i64>> {
        self.bookmarks.load_for_user(user_id).await
    }

    async fn load_answers(
        &self,
        user_id: Uuid,
        question_ids: Vec<i64>,
    ) -> Result<HashMap<i64, (char, bool)>> {
        self.answers.load_for_questions(user_id, &question_ids).await
    }

    async fn upsert_answer(&self, answer: NewAnswer) -> Result<()> {
        self.answers.upsert(&answer).await
    }

    async fn toggle_bookmark(&self, user_id: Uuid, question_id: i64) -> Result<bool> {
        self.bookmarks.toggle(user_id, question_id).await
    }

    async fn finalize_session(
        &self,
        session_id: Option<Uuid>,
        user_id: Uuid,
        exam_id: Option<i64>,
        stats: SessionStats,
        reconcile: Vec<NewAnswer>,
    ) -> Result<()> {
        self.progress
            .finalize_session(session_id, user_id, exam_id, stats, &reconcile)
            .await
    }

    async fn mark_finalize_pending(&self, session_id: Uuid) -> Result<()> {
        self.sessions.mark_finalize_pending(session_id).await
    }
}
