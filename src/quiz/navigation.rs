use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::question::PracticeQuestion;

/// Sidebar view filter. Filtering derives a subsequence of absolute
/// indices; it never reorders or mutates the underlying question set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionFilter {
    All,
    Bookmarked,
    Unanswered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Left,
    Right,
}

/// Current-question cursor over `0..len`. Transitions clamp at both ends.
#[derive(Debug, Clone)]
pub struct Navigator {
    index: usize,
    len: usize,
}

impl Navigator {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn next(&mut self) -> usize {
        if self.index + 1 < self.len {
            self.index += 1;
        }
        self.index
    }

    pub fn previous(&mut self) -> usize {
        if self.index > 0 {
            self.index -= 1;
        }
        self.index
    }

    /// Direct jump from the sidebar; positions in a filtered view must be
    /// translated to absolute indices before calling this.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index < self.len {
            self.index = index;
            true
        } else {
            false
        }
    }

    pub fn handle_key(&mut self, key: ArrowKey) -> usize {
        match key {
            ArrowKey::Left => self.previous(),
            ArrowKey::Right => self.next(),
        }
    }
}

/// Absolute indices of the questions visible under `filter`.
pub fn filtered_indices(
    filter: QuestionFilter,
    questions: &[PracticeQuestion],
    answered: &HashSet<i64>,
    bookmarked: &HashSet<i64>,
) -> Vec<usize> {
    questions
        .iter()
        .enumerate()
        .filter(|(_, q)| match filter {
            QuestionFilter::All => true,
            QuestionFilter::Bookmarked => bookmarked.contains(&q.id),
            QuestionFilter::Unanswered => !answered.contains(&q.id),
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: i64) -> PracticeQuestion {
        PracticeQuestion {
            id,
            question_text: format!("q{id}"),
            rationale: None,
            options: vec!["x".into(), "y".into()],
            correct_answer: 'a',
        }
    }

    #[test]
    fn previous_clamps_at_zero() {
        let mut nav = Navigator::new(3);
        assert_eq!(nav.previous(), 0);
        assert_eq!(nav.index(), 0);
    }

    #[test]
    fn next_clamps_at_last() {
        let mut nav = Navigator::new(3);
        nav.jump_to(2);
        assert_eq!(nav.next(), 2);
        assert_eq!(nav.index(), 2);
    }

    #[test]
    fn jump_rejects_out_of_range() {
        let mut nav = Navigator::new(3);
        assert!(nav.jump_to(1));
        assert!(!nav.jump_to(3));
        assert_eq!(nav.index(), 1);
    }

    #[test]
    fn arrow_keys_map_to_prev_next() {
        let mut nav = Navigator::new(2);
        assert_eq!(nav.handle_key(ArrowKey::Right), 1);
        assert_eq!(nav.handle_key(ArrowKey::Right), 1);
        assert_eq!(nav.handle_key(ArrowKey::Left), 0);
        assert_eq!(nav.handle_key(ArrowKey::Left), 0);
    }

    #[test]
    fn unanswered_filter_keeps_remaining_questions() {
        let questions = vec![question(1), question(2), question(3)];
        let answered: HashSet<i64> = [1].into_iter().collect();
        let indices = filtered_indices(
            QuestionFilter::Unanswered,
            &questions,
            &answered,
            &HashSet::new(),
        );
        let ids: Vec<i64> = indices.iter().map(|&i| questions[i].id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn bookmarked_filter_translates_to_absolute_indices() {
        let questions = vec![question(7), question(8), question(9)];
        let bookmarked: HashSet<i64> = [9, 7].into_iter().collect();
        let indices = filtered_indices(
            QuestionFilter::Bookmarked,
            &questions,
            &HashSet::new(),
            &bookmarked,
        );
        assert_eq!(indices, vec![0, 2]);

        let mut nav = Navigator::new(questions.len());
        // Second row of the filtered grid is absolute index 2.
        assert!(nav.jump_to(indices[1]));
        assert_eq!(questions[nav.index()].id, 9);
    }

    #[test]
    fn all_filter_preserves_order() {
        let questions = vec![question(5), question(6)];
        let indices = filtered_indices(
            QuestionFilter::All,
            &questions,
            &HashSet::new(),
            &HashSet::new(),
        );
        assert_eq!(indices, vec![0, 1]);
    }
}
