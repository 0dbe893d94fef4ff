/// Session clock driven by a 1-second external tick. Pausing is just a
/// flag; ticks are dropped while paused, nothing is suspended.
#[derive(Debug, Clone)]
pub struct SessionTimer {
    total_seconds: i32,
    question_seconds: i32,
    paused: bool,
}

impl SessionTimer {
    pub fn new() -> Self {
        Self {
            total_seconds: 0,
            question_seconds: 0,
            paused: false,
        }
    }

    pub fn tick(&mut self) {
        if self.paused {
            return;
        }
        self.total_seconds = self.total_seconds.saturating_add(1);
        self.question_seconds = self.question_seconds.saturating_add(1);
    }

    /// The per-question counter restarts after each recorded answer; the
    /// session total keeps accumulating.
    pub fn reset_question(&mut self) {
        self.question_seconds = 0;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn total_seconds(&self) -> i32 {
        self.total_seconds
    }

    pub fn question_seconds(&self) -> i32 {
        self.question_seconds
    }
}

impl Default for SessionTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_advance_both_counters() {
        let mut timer = SessionTimer::new();
        timer.tick();
        timer.tick();
        assert_eq!(timer.total_seconds(), 2);
        assert_eq!(timer.question_seconds(), 2);
    }

    #[test]
    fn question_reset_keeps_session_total() {
        let mut timer = SessionTimer::new();
        timer.tick();
        timer.tick();
        timer.reset_question();
        timer.tick();
        assert_eq!(timer.total_seconds(), 3);
        assert_eq!(timer.question_seconds(), 1);
    }

    #[test]
    fn paused_timer_ignores_ticks() {
        let mut timer = SessionTimer::new();
        timer.tick();
        timer.set_paused(true);
        timer.tick();
        timer.tick();
        assert_eq!(timer.total_seconds(), 1);
        timer.set_paused(false);
        timer.tick();
        assert_eq!(timer.total_seconds(), 2);
    }
}
