use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::quiz::navigation::QuestionFilter;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StartPracticeRequest {
    #[validate(range(min = 1))]
    pub subject_id: i64,
    pub exam_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPracticeResponse {
    pub practice_id: Uuid,
    pub session_id: Option<Uuid>,
    pub exam_id: Option<i64>,
    pub exam_name: Option<String>,
    pub subject_name: String,
    pub total_questions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnswerRequest {
    /// Choice letter: 'a', 'b', ...
    #[validate(length(min = 1, max = 1))]
    pub choice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub question_id: i64,
    pub is_correct: bool,
    pub correct_answer: char,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkResponse {
    pub question_id: i64,
    pub bookmarked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NavigateRequest {
    /// One of: next, previous, jump, arrow_left, arrow_right.
    pub action: String,
    pub index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRequest {
    pub filter: QuestionFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerRequest {
    pub paused: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeRequest {
    pub quiz_mode: bool,
}

/// One choice as presented: positional letter plus display text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceView {
    pub letter: char,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: i64,
    pub question_text: String,
    pub options: Vec<ChoiceView>,
    pub selected_answer: Option<char>,
    pub bookmarked: bool,
    /// Present once answered, or always in show-answers mode.
    pub correct_answer: Option<char>,
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: Option<Uuid>,
    pub exam_id: Option<i64>,
    pub subject_id: i64,
    pub exam_name: Option<String>,
    pub subject_name: String,
    pub current_index: usize,
    pub total_questions: usize,
    pub answered_count: usize,
    pub bookmarked_count: usize,
    pub filter: QuestionFilter,
    /// Absolute indices of the questions visible under the active filter.
    pub visible_indices: Vec<usize>,
    pub quiz_mode: bool,
    pub timer_paused: bool,
    pub elapsed_seconds: i32,
    pub question: Option<QuestionView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    pub session_id: Option<Uuid>,
    pub exam_id: Option<i64>,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub incorrect_answers: i32,
    pub score: f64,
    pub total_time_seconds: i32,
    pub time_display: String,
}
