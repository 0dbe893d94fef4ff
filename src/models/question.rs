use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Raw question row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub subject_id: i64,
    pub exam_id: Option<i64>,
    pub question_text: String,
    pub explanation: Option<String>,
    pub rationale: Option<String>,
}

/// Raw answer-choice row. The display letter is never stored; it is the
/// choice's ordinal position within its question, in id order.
#[derive(Debug, Clone, FromRow)]
pub struct AnswerChoiceRow {
    pub id: i64,
    pub question_id: i64,
    pub answer_text: String,
    pub is_correct: bool,
}

/// A question normalized for presentation: ordered options plus the
/// derived letter of the single correct choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeQuestion {
    pub id: i64,
    pub question_text: String,
    pub rationale: Option<String>,
    pub options: Vec<String>,
    pub correct_answer: char,
}

pub fn choice_letter(index: usize) -> char {
    (b'a' + index as u8) as char
}

pub fn letter_index(letter: char) -> Option<usize> {
    if letter.is_ascii_lowercase() {
        Some((letter as u8 - b'a') as usize)
    } else {
        None
    }
}

impl PracticeQuestion {
    /// Joins a question with its choices. Returns `None` when the question
    /// has no choices or no correct-flagged choice; callers drop such
    /// questions from the practice set.
    pub fn from_rows(question: QuestionRow, choices: &[AnswerChoiceRow]) -> Option<Self> {
        if choices.is_empty() {
            return None;
        }
        let correct_index = choices.iter().position(|c| c.is_correct)?;

        Some(Self {
            id: question.id,
            question_text: question.question_text,
            rationale: question.explanation.or(question.rationale),
            options: choices.iter().map(|c| c.answer_text.clone()).collect(),
            correct_answer: choice_letter(correct_index),
        })
    }

    pub fn is_correct_choice(&self, letter: char) -> bool {
        letter == self.correct_answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question_row(id: i64) -> QuestionRow {
        QuestionRow {
            id,
            subject_id: 1,
            exam_id: Some(1),
            question_text: format!("question {id}"),
            explanation: None,
            rationale: Some("because".into()),
        }
    }

    fn choice(id: i64, question_id: i64, is_correct: bool) -> AnswerChoiceRow {
        AnswerChoiceRow {
            id,
            question_id,
            answer_text: format!("choice {id}"),
            is_correct,
        }
    }

    #[test]
    fn letters_follow_insertion_order() {
        assert_eq!(choice_letter(0), 'a');
        assert_eq!(choice_letter(1), 'b');
        assert_eq!(choice_letter(3), 'd');
        assert_eq!(letter_index('a'), Some(0));
        assert_eq!(letter_index('c'), Some(2));
        assert_eq!(letter_index('A'), None);
    }

    #[test]
    fn correct_letter_indexes_into_own_choices() {
        let choices = vec![
            choice(10, 1, false),
            choice(11, 1, false),
            choice(12, 1, true),
        ];
        let q = PracticeQuestion::from_rows(question_row(1), &choices).unwrap();
        assert_eq!(q.correct_answer, 'c');
        let idx = letter_index(q.correct_answer).unwrap();
        assert!(idx < q.options.len());
        assert_eq!(q.options[idx], "choice 12");
    }

    #[test]
    fn question_without_choices_is_dropped() {
        assert!(PracticeQuestion::from_rows(question_row(1), &[]).is_none());
    }

    #[test]
    fn question_without_correct_choice_is_dropped() {
        let choices = vec![choice(10, 1, false), choice(11, 1, false)];
        assert!(PracticeQuestion::from_rows(question_row(1), &choices).is_none());
    }

    #[test]
    fn explanation_wins_over_rationale() {
        let mut row = question_row(1);
        row.explanation = Some("explained".into());
        let q = PracticeQuestion::from_rows(row, &[choice(10, 1, true)]).unwrap();
        assert_eq!(q.rationale.as_deref(), Some("explained"));
    }
}
