use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a card sits in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    /// Never reviewed
    #[default]
    New,
    /// Climbing the learning steps
    Learning,
    /// Graduated, scheduled in days
    Review,
    /// Lapsed, climbing the relearning steps
    Relearning,
}

impl CardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Review => "review",
            CardState::Relearning => "relearning",
        }
    }

    /// True before the card first reaches the review state
    pub fn is_ungraduated(&self) -> bool {
        matches!(self, CardState::New | CardState::Learning)
    }

    /// True while a step staircase controls the timing
    pub fn is_stepping(&self) -> bool {
        matches!(self, CardState::Learning | CardState::Relearning)
    }
}

/// The learner's self-reported recall quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Forgot
    Again = 1,
    /// Recalled with serious effort
    Hard = 2,
    /// Recalled after some hesitation
    Good = 3,
    /// Recalled effortlessly
    Easy = 4,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    /// Convert to FSRS rating (1-4)
    pub fn as_u32(&self) -> u32 {
        *self as u32
    }

    /// Any rating other than Again
    pub fn is_pass(&self) -> bool {
        !matches!(self, Rating::Again)
    }
}

impl TryFrom<u8> for Rating {
    type Error = anyhow::Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Rating::Again),
            2 => Ok(Rating::Hard),
            3 => Ok(Rating::Good),
            4 => Ok(Rating::Easy),
            other => bail!("Invalid rating {other}, expected 1 (Again) to 4 (Easy)"),
        }
    }
}

/// Persisted memory state of a single card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardData {
    pub state: CardState,
    /// Normalized difficulty in [0, 1]
    pub difficulty: f64,
    /// Memory stability in days
    pub stability: f64,
    pub last_review: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    /// Days until due, fractional for sub-day steps
    pub interval: f64,
    /// Successful (non-Again) reviews
    pub repetitions: u32,
    /// Again ratings given while in review
    pub lapses: u32,
    /// Only read when `last_review` is missing
    pub elapsed_days: f64,
    /// Position on the learning or relearning staircase
    #[serde(default)]
    pub learning_step: u32,
}

impl Default for CardData {
    fn default() -> Self {
        Self::new()
    }
}

impl CardData {
    /// A card that has never been reviewed
    pub fn new() -> Self {
        Self {
            state: CardState::New,
            difficulty: 0.0,
            stability: 0.0,
            last_review: None,
            due_date: None,
            interval: 0.0,
            repetitions: 0,
            lapses: 0,
            elapsed_days: 0.0,
            learning_step: 0,
        }
    }

    /// Merge a review result into the card, as a caller would before persisting it
    pub fn apply(&self, result: &ReviewResult, reviewed_at: DateTime<Utc>) -> CardData {
        CardData {
            state: result.state,
            difficulty: result.difficulty,
            stability: result.stability,
            last_review: Some(reviewed_at),
            due_date: Some(result.due_date),
            interval: result.interval,
            repetitions: result.repetitions,
            lapses: result.lapses,
            elapsed_days: result.elapsed_days,
            learning_step: result.learning_step,
        }
    }
}

/// Snapshot of a card immediately after one rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewResult {
    pub state: CardState,
    pub difficulty: f64,
    pub stability: f64,
    pub due_date: DateTime<Utc>,
    /// Days until due; 0 while a sub-day step controls the timing
    pub interval: f64,
    pub repetitions: u32,
    pub lapses: u32,
    /// Always 0: it only means something relative to the next review
    pub elapsed_days: f64,
    pub learning_step: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_rating_from_u8() {
        assert_eq!(Rating::try_from(1u8).unwrap(), Rating::Again);
        assert_eq!(Rating::try_from(2u8).unwrap(), Rating::Hard);
        assert_eq!(Rating::try_from(3u8).unwrap(), Rating::Good);
        assert_eq!(Rating::try_from(4u8).unwrap(), Rating::Easy);
    }

    #[test]
    fn test_rating_out_of_range() {
        assert!(Rating::try_from(0u8).is_err());
        assert!(Rating::try_from(5u8).is_err());
    }

    #[test]
    fn test_rating_as_u32_matches_fsrs_numbering() {
        let numbers: Vec<u32> = Rating::ALL.iter().map(|r| r.as_u32()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_state_groups() {
        assert!(CardState::New.is_ungraduated());
        assert!(CardState::Learning.is_ungraduated());
        assert!(!CardState::Review.is_ungraduated());
        assert!(!CardState::Relearning.is_ungraduated());

        assert!(CardState::Learning.is_stepping());
        assert!(CardState::Relearning.is_stepping());
        assert!(!CardState::New.is_stepping());
    }

    #[test]
    fn test_new_card() {
        let card = CardData::new();
        assert_eq!(card.state, CardState::New);
        assert!(card.last_review.is_none());
        assert!(card.due_date.is_none());
        assert_eq!(card.repetitions, 0);
    }

    #[test]
    fn test_apply_result() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let result = ReviewResult {
            state: CardState::Review,
            difficulty: 0.4,
            stability: 3.2,
            due_date: now + Duration::days(3),
            interval: 3.0,
            repetitions: 2,
            lapses: 0,
            elapsed_days: 0.0,
            learning_step: 0,
        };

        let card = CardData::new().apply(&result, now);
        assert_eq!(card.state, CardState::Review);
        assert_eq!(card.last_review, Some(now));
        assert_eq!(card.due_date, Some(now + Duration::days(3)));
        assert_eq!(card.interval, 3.0);
        assert_eq!(card.repetitions, 2);
    }

    #[test]
    fn test_state_serialization() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            state: CardState,
        }
        let text = toml::to_string(&Wrapper {
            state: CardState::Relearning,
        })
        .unwrap();
        assert_eq!(text.trim(), "state = \"relearning\"");
        let back: Wrapper = toml::from_str("state = \"learning\"").unwrap();
        assert_eq!(back.state, CardState::Learning);
    }
}
