use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::dto::practice_dto::{
    AnswerResponse, ChoiceView, QuestionView, ScoreReport, SessionView,
};
use crate::error::{Error, Result};
use crate::models::exam::Exam;
use crate::models::practice_session::SessionStats;
use crate::models::question::{choice_letter, letter_index, PracticeQuestion};
use crate::models::subject::Subject;
use crate::models::user::CurrentUser;
use crate::models::user_answer::NewAnswer;
use crate::quiz::navigation::{filtered_indices, ArrowKey, Navigator, QuestionFilter};
use crate::quiz::store::PracticeStore;
use crate::quiz::timer::SessionTimer;
use crate::services::question_bank_service::QuestionBankService;
use crate::utils::time::format_duration;

/// Outcome of an optimistic local mutation. Local state is never rolled
/// back; Failed answers get re-driven by the finalize transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Pending,
    Committed,
    Failed,
}

#[derive(Debug, Clone)]
struct AnswerEntry {
    choice: char,
    is_correct: bool,
    time_taken_seconds: i32,
    status: WriteStatus,
}

#[derive(Debug, Clone)]
struct BookmarkEntry {
    bookmarked: bool,
    status: WriteStatus,
}

/// One active practice run: the shuffled question set, the navigation
/// cursor, optimistic answer/bookmark state and the session clock. The
/// authenticated user is injected at construction; the database row (when
/// the session insert succeeded) is the durable counterpart.
pub struct QuizController {
    user: CurrentUser,
    subject_id: i64,
    subject_name: String,
    exam_id: Option<i64>,
    exam_name: Option<String>,
    session_id: Option<Uuid>,
    questions: Vec<PracticeQuestion>,
    nav: Navigator,
    filter: QuestionFilter,
    quiz_mode: bool,
    answers: HashMap<i64, AnswerEntry>,
    bookmarks: HashMap<i64, BookmarkEntry>,
    explanations: HashSet<i64>,
    timer: SessionTimer,
    finished: Option<ScoreReport>,
    last_activity: Instant,
    store: Arc<dyn PracticeStore>,
    bank: QuestionBankService,
}

impl QuizController {
    /// Loads the practice set and opens a session. A failed question load
    /// is fatal; bookmark/answer preloads and the session insert degrade
    /// gracefully (the quiz proceeds and dependent writes become no-ops).
    pub async fn open(
        user: CurrentUser,
        subject: Subject,
        exam: Option<Exam>,
        store: Arc<dyn PracticeStore>,
        bank: QuestionBankService,
    ) -> Result<Self> {
        let questions = store.load_practice_set(subject.id).await?;
        if questions.is_empty() {
            return Err(Error::NotFound(
                "No questions available for this subject".to_string(),
            ));
        }

        let exam_id = exam.as_ref().map(|e| e.id);
        let question_ids: Vec<i64> = questions.iter().map(|q| q.id).collect();

        let bookmarks = match store.load_bookmarks(user.id).await {
            Ok(ids) => ids
                .into_iter()
                .map(|id| {
                    (
                        id,
                        BookmarkEntry {
                            bookmarked: true,
                            status: WriteStatus::Committed,
                        },
                    )
                })
                .collect(),
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = ?e, "failed to load bookmarks");
                HashMap::new()
            }
        };

        let mut answers = HashMap::new();
        let mut explanations = HashSet::new();
        match store.load_answers(user.id, question_ids).await {
            Ok(prior) => {
                for (question_id, (choice, is_correct)) in prior {
                    answers.insert(
                        question_id,
                        AnswerEntry {
                            choice,
                            is_correct,
                            time_taken_seconds: 0,
                            status: WriteStatus::Committed,
                        },
                    );
                    explanations.insert(question_id);
                }
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = ?e, "failed to load prior answers");
            }
        }

        let session_id = match store
            .start_session(user.id, subject.id, exam_id, questions.len() as i32)
            .await
        {
            Ok(session) => Some(session.id),
            Err(e) => {
                tracing::error!(user_id = %user.id, subject_id = subject.id, error = ?e,
                    "failed to create practice session, continuing without one");
                None
            }
        };

        let nav = Navigator::new(questions.len());
        Ok(Self {
            user,
            subject_id: subject.id,
            subject_name: subject.name,
            exam_id,
            exam_name: exam.map(|e| e.name),
            session_id,
            questions,
            nav,
            filter: QuestionFilter::All,
            quiz_mode: true,
            answers,
            bookmarks,
            explanations,
            timer: SessionTimer::new(),
            finished: None,
            last_activity: Instant::now(),
            store,
            bank,
        })
    }

    pub fn owner_id(&self) -> Uuid {
        self.user.id
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn current_question_id(&self) -> i64 {
        self.current_question().id
    }

    pub fn exam_id(&self) -> Option<i64> {
        self.exam_id
    }

    pub fn exam_name(&self) -> Option<&str> {
        self.exam_name.as_deref()
    }

    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    fn current_question(&self) -> &PracticeQuestion {
        &self.questions[self.nav.index()]
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_idle(&self, limit: Duration) -> bool {
        self.last_activity.elapsed() >= limit
    }

    /// Driven by the registry's 1-second interval.
    pub fn tick(&mut self) {
        if self.finished.is_none() {
            self.timer.tick();
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if self.finished.is_some() {
            return Err(Error::BadRequest(
                "Practice session already finalized".to_string(),
            ));
        }
        Ok(())
    }

    /// Records an answer for the current question. Local state updates
    /// optimistically; the upsert result only moves the write status. In
    /// show-answers mode nothing is recorded.
    pub async fn record_answer(&mut self, choice: char) -> Result<AnswerResponse> {
        self.ensure_active()?;
        self.touch();

        let question = self.current_question().clone();
        if !self.quiz_mode {
            return Ok(AnswerResponse {
                question_id: question.id,
                is_correct: question.is_correct_choice(choice),
                correct_answer: question.correct_answer,
                rationale: question.rationale,
            });
        }

        let valid = letter_index(choice)
            .map(|i| i < question.options.len())
            .unwrap_or(false);
        if !valid {
            return Err(Error::BadRequest(format!(
                "'{}' is not a choice of this question",
                choice
            )));
        }

        let is_correct = question.is_correct_choice(choice);
        let time_taken_seconds = self.timer.question_seconds();
        self.answers.insert(
            question.id,
            AnswerEntry {
                choice,
                is_correct,
                time_taken_seconds,
                status: WriteStatus::Pending,
            },
        );
        self.explanations.insert(question.id);
        self.timer.reset_question();

        // Without a session row there is nothing to attach the answer to.
        if let Some(session_id) = self.session_id {
            let new_answer = NewAnswer {
                user_id: self.user.id,
                question_id: question.id,
                session_id,
                selected_answer: choice,
                is_correct,
                time_taken_seconds,
            };
            let status = match self.store.upsert_answer(new_answer).await {
                Ok(()) => WriteStatus::Committed,
                Err(e) => {
                    tracing::error!(question_id = question.id, error = ?e, "failed to save answer");
                    WriteStatus::Failed
                }
            };
            if let Some(entry) = self.answers.get_mut(&question.id) {
                entry.status = status;
            }
        }

        let bank = self.bank.clone();
        let question_id = question.id;
        tokio::spawn(async move {
            bank.record_result(question_id, is_correct).await;
        });

        Ok(AnswerResponse {
            question_id: question.id,
            is_correct,
            correct_answer: question.correct_answer,
            rationale: question.rationale,
        })
    }

    /// Flips the bookmark on the current question. The local flip sticks
    /// even when persistence fails; last action wins.
    pub async fn toggle_bookmark(&mut self) -> Result<bool> {
        self.ensure_active()?;
        self.touch();

        let question_id = self.current_question().id;
        let was_bookmarked = self.is_bookmarked(question_id);
        self.bookmarks.insert(
            question_id,
            BookmarkEntry {
                bookmarked: !was_bookmarked,
                status: WriteStatus::Pending,
            },
        );

        match self.store.toggle_bookmark(self.user.id, question_id).await {
            Ok(server_state) => {
                self.bookmarks.insert(
                    question_id,
                    BookmarkEntry {
                        bookmarked: server_state,
                        status: WriteStatus::Committed,
                    },
                );
                Ok(server_state)
            }
            Err(e) => {
                tracing::error!(question_id, error = ?e, "failed to toggle bookmark");
                if let Some(entry) = self.bookmarks.get_mut(&question_id) {
                    entry.status = WriteStatus::Failed;
                }
                Ok(!was_bookmarked)
            }
        }
    }

    pub fn next(&mut self) -> usize {
        self.touch();
        self.nav.next()
    }

    pub fn previous(&mut self) -> usize {
        self.touch();
        self.nav.previous()
    }

    pub fn jump_to(&mut self, index: usize) -> Result<usize> {
        self.touch();
        if !self.nav.jump_to(index) {
            return Err(Error::BadRequest(format!(
                "Question index {} out of range",
                index
            )));
        }
        Ok(self.nav.index())
    }

    pub fn handle_key(&mut self, key: ArrowKey) -> usize {
        self.touch();
        self.nav.handle_key(key)
    }

    pub fn set_filter(&mut self, filter: QuestionFilter) {
        self.touch();
        self.filter = filter;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.touch();
        self.timer.set_paused(paused);
    }

    pub fn set_quiz_mode(&mut self, quiz_mode: bool) {
        self.touch();
        self.quiz_mode = quiz_mode;
    }

    fn is_bookmarked(&self, question_id: i64) -> bool {
        self.bookmarks
            .get(&question_id)
            .map(|b| b.bookmarked)
            .unwrap_or(false)
    }

    fn answered_ids(&self) -> HashSet<i64> {
        self.answers.keys().copied().collect()
    }

    fn bookmarked_ids(&self) -> HashSet<i64> {
        self.bookmarks
            .iter()
            .filter(|(_, b)| b.bookmarked)
            .map(|(id, _)| *id)
            .collect()
    }

    fn compute_stats(&self) -> SessionStats {
        let total_questions = self.questions.len() as i32;
        let correct_answers = self
            .answers
            .iter()
            .filter(|(question_id, entry)| {
                self.questions
                    .iter()
                    .find(|q| q.id == **question_id)
                    .map(|q| q.is_correct_choice(entry.choice))
                    .unwrap_or(false)
            })
            .count() as i32;
        let score = if total_questions > 0 {
            correct_answers as f64 / total_questions as f64 * 100.0
        } else {
            0.0
        };
        SessionStats {
            total_questions,
            correct_answers,
            total_time_seconds: self.timer.total_seconds(),
            score,
        }
    }

    /// Finalizes the session. Both exit paths (explicit exit and the score
    /// screen) land here; the second call returns the cached report and
    /// performs no further writes. A failed finalize marks the session
    /// finalize_pending for the background sweeper and still reports the
    /// score.
    pub async fn finish(&mut self) -> Result<ScoreReport> {
        if let Some(report) = &self.finished {
            return Ok(report.clone());
        }
        self.touch();

        let stats = self.compute_stats();

        let reconcile: Vec<NewAnswer> = match self.session_id {
            Some(session_id) => self
                .answers
                .iter()
                .filter(|(_, entry)| entry.status != WriteStatus::Committed)
                .map(|(question_id, entry)| NewAnswer {
                    user_id: self.user.id,
                    question_id: *question_id,
                    session_id,
                    selected_answer: entry.choice,
                    is_correct: entry.is_correct,
                    time_taken_seconds: entry.time_taken_seconds,
                })
                .collect(),
            None => Vec::new(),
        };

        match self
            .store
            .finalize_session(
                self.session_id,
                self.user.id,
                self.exam_id,
                stats,
                reconcile,
            )
            .await
        {
            Ok(()) => {
                for entry in self.answers.values_mut() {
                    entry.status = WriteStatus::Committed;
                }
            }
            Err(e) => {
                tracing::error!(session_id = ?self.session_id, error = ?e,
                    "session finalize failed, marking for retry");
                if let Some(session_id) = self.session_id {
                    if let Err(mark_err) = self.store.mark_finalize_pending(session_id).await {
                        tracing::error!(%session_id, error = ?mark_err,
                            "could not mark session finalize_pending");
                    }
                }
            }
        }

        let report = ScoreReport {
            session_id: self.session_id,
            exam_id: self.exam_id,
            total_questions: stats.total_questions,
            correct_answers: stats.correct_answers,
            incorrect_answers: stats.total_questions - stats.correct_answers,
            score: stats.score,
            total_time_seconds: stats.total_time_seconds,
            time_display: format_duration(stats.total_time_seconds as i64),
        };
        self.finished = Some(report.clone());
        Ok(report)
    }

    pub fn view(&self) -> SessionView {
        let answered = self.answered_ids();
        let bookmarked = self.bookmarked_ids();
        let visible_indices =
            filtered_indices(self.filter, &self.questions, &answered, &bookmarked);

        let question = if self.questions.is_empty() {
            None
        } else {
            let q = self.current_question();
            let selected = self.answers.get(&q.id).map(|a| a.choice);
            let reveal = !self.quiz_mode || self.explanations.contains(&q.id);
            Some(QuestionView {
                id: q.id,
                question_text: q.question_text.clone(),
                options: q
                    .options
                    .iter()
                    .enumerate()
                    .map(|(i, text)| ChoiceView {
                        letter: choice_letter(i),
                        text: text.clone(),
                    })
                    .collect(),
                selected_answer: selected,
                bookmarked: self.is_bookmarked(q.id),
                correct_answer: reveal.then_some(q.correct_answer),
                rationale: if reveal { q.rationale.clone() } else { None },
            })
        };

        SessionView {
            session_id: self.session_id,
            exam_id: self.exam_id,
            subject_id: self.subject_id,
            exam_name: self.exam_name.clone(),
            subject_name: self.subject_name.clone(),
            current_index: self.nav.index(),
            total_questions: self.questions.len(),
            answered_count: self.answers.len(),
            bookmarked_count: bookmarked.len(),
            filter: self.filter,
            visible_indices,
            quiz_mode: self.quiz_mode,
            timer_paused: self.timer.is_paused(),
            elapsed_seconds: self.timer.total_seconds(),
            question,
        }
    }

    #[cfg(test)]
    pub(crate) fn answer_status(&self, question_id: i64) -> Option<WriteStatus> {
        self.answers.get(&question_id).map(|a| a.status)
    }
}
