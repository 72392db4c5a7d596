use crate::card::{CardData, CardState, Rating, ReviewResult};
use crate::timing;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A review record (for the caller's audit trail and FSRS parameter training)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
    pub rating: Rating,
    pub previous_state: CardState,
    pub new_state: CardState,
    pub previous_difficulty: f64,
    pub new_difficulty: f64,
    pub previous_stability: f64,
    pub new_stability: f64,
    /// Days since the previous review, as used by the scheduler
    pub elapsed_days: f64,
    /// Days the card was scheduled to wait before this review
    pub scheduled_days: f64,
    pub reviewed_at: DateTime<Utc>,
}

impl ReviewLog {
    /// Record the transition from `card` to `result`
    pub fn new(
        card: &CardData,
        rating: Rating,
        result: &ReviewResult,
        reviewed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            rating,
            previous_state: card.state,
            new_state: result.state,
            previous_difficulty: card.difficulty,
            new_difficulty: result.difficulty,
            previous_stability: card.stability,
            new_stability: result.stability,
            elapsed_days: timing::elapsed_days(card, reviewed_at),
            scheduled_days: timing::scheduled_days(card, reviewed_at),
            reviewed_at,
        }
    }

    /// True if this review sent a graduated card back to relearning
    pub fn is_lapse(&self) -> bool {
        self.previous_state == CardState::Review && self.rating == Rating::Again
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StudySettings;
    use crate::scheduler::Scheduler;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_log_captures_transition() {
        let now = Utc.with_ymd_and_hms(2024, 2, 10, 18, 0, 0).unwrap();
        let card = CardData {
            state: CardState::Review,
            difficulty: 0.3,
            stability: 10.0,
            last_review: Some(now - Duration::days(12)),
            due_date: Some(now - Duration::days(2)),
            interval: 10.0,
            repetitions: 5,
            lapses: 0,
            elapsed_days: 0.0,
            learning_step: 0,
        };
        let scheduler = Scheduler::new(&StudySettings::default()).unwrap();
        let result = scheduler.review_card(&card, Rating::Again, now).unwrap();

        let log = ReviewLog::new(&card, Rating::Again, &result, now);
        assert_eq!(log.previous_state, CardState::Review);
        assert_eq!(log.new_state, CardState::Relearning);
        assert_eq!(log.previous_stability, 10.0);
        assert_eq!(log.new_stability, result.stability);
        assert_eq!(log.previous_difficulty, 0.3);
        assert_eq!(log.new_difficulty, result.difficulty);
        assert_eq!(log.elapsed_days, 12.0);
        assert_eq!(log.scheduled_days, 10.0);
        assert_eq!(log.reviewed_at, now);
        assert!(log.is_lapse());
    }

    #[test]
    fn test_new_card_log() {
        let now = Utc.with_ymd_and_hms(2024, 2, 10, 18, 0, 0).unwrap();
        let card = CardData::new();
        let scheduler = Scheduler::new(&StudySettings::default()).unwrap();
        let result = scheduler.review_card(&card, Rating::Good, now).unwrap();

        let log = ReviewLog::new(&card, Rating::Good, &result, now);
        assert_eq!(log.previous_state, CardState::New);
        assert_eq!(log.new_state, CardState::Learning);
        assert_eq!(log.elapsed_days, 0.0);
        assert_eq!(log.scheduled_days, 0.0);
        assert!(!log.is_lapse());
    }
}
