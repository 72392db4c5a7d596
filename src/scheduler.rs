use crate::card::{CardData, CardState, Rating, ReviewResult};
use crate::config::StudySettings;
use crate::fuzz;
use crate::params::Parameters;
use crate::steps::Step;
use crate::timing;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use fsrs::{FSRS, MemoryState, NextStates};

/// Lowest and highest difficulty on the model's own scale
const MODEL_DIFFICULTY_MIN: f64 = 1.0;
const MODEL_DIFFICULTY_MAX: f64 = 10.0;

/// Difficulty assumed when the stored value is unusable
const FALLBACK_DIFFICULTY: f64 = 0.5;

/// Map normalized difficulty [0, 1] onto the model's [1, 10]
fn to_model_difficulty(difficulty: f64) -> f32 {
    let span = MODEL_DIFFICULTY_MAX - MODEL_DIFFICULTY_MIN;
    (MODEL_DIFFICULTY_MIN + span * difficulty.clamp(0.0, 1.0)) as f32
}

/// Map the model's [1, 10] difficulty back onto [0, 1]
fn from_model_difficulty(difficulty: f32) -> f64 {
    let span = MODEL_DIFFICULTY_MAX - MODEL_DIFFICULTY_MIN;
    let normalized = (difficulty as f64 - MODEL_DIFFICULTY_MIN) / span;
    if normalized.is_finite() {
        normalized.clamp(0.0, 1.0)
    } else {
        log::warn!("Model returned difficulty {difficulty}, using {FALLBACK_DIFFICULTY}");
        FALLBACK_DIFFICULTY
    }
}

/// Scheduling stage as the scheduler sees it. New cards are learning cards
/// on their first step with no memory yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Learning { step: usize },
    Review,
    Relearning { step: usize },
}

impl Stage {
    fn of(card: &CardData) -> Self {
        let step = card.learning_step as usize;
        match card.state {
            CardState::New => Stage::Learning { step: 0 },
            CardState::Learning => Stage::Learning { step },
            CardState::Review => Stage::Review,
            CardState::Relearning => Stage::Relearning { step },
        }
    }

    fn state(&self) -> CardState {
        match self {
            Stage::Learning { .. } => CardState::Learning,
            Stage::Review => CardState::Review,
            Stage::Relearning { .. } => CardState::Relearning,
        }
    }

    fn step(&self) -> u32 {
        match self {
            Stage::Learning { step } | Stage::Relearning { step } => *step as u32,
            Stage::Review => 0,
        }
    }
}

/// Where a rating moves a card on a step staircase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Climb {
    Stay { step: usize, delay: Duration },
    Graduate,
}

/// Move along a learning or relearning staircase
fn climb(steps: &[Step], step: usize, rating: Rating) -> Climb {
    if steps.is_empty() {
        return Climb::Graduate;
    }

    let first = steps[0].duration();

    // Steps were shortened since the card was last seen
    if step >= steps.len() {
        return match rating {
            Rating::Again => Climb::Stay {
                step: 0,
                delay: first,
            },
            _ => Climb::Graduate,
        };
    }

    match rating {
        Rating::Again => Climb::Stay {
            step: 0,
            delay: first,
        },
        Rating::Hard => {
            let delay = if step > 0 {
                steps[step].duration()
            } else if steps.len() == 1 {
                first * 3 / 2
            } else {
                (first + steps[1].duration()) / 2
            };
            Climb::Stay { step, delay }
        }
        Rating::Good if step + 1 < steps.len() => Climb::Stay {
            step: step + 1,
            delay: steps[step + 1].duration(),
        },
        Rating::Good | Rating::Easy => Climb::Graduate,
    }
}

/// One projected outcome before it is turned into calendar terms
#[derive(Debug, Clone, Copy)]
struct Branch {
    stage: Stage,
    stability: f64,
    difficulty: f64,
    /// Days until due as projected; may be zero or non-finite
    scheduled_days: f64,
}

/// The outcome of every possible rating for one card
#[derive(Debug, Clone, PartialEq)]
pub struct NextReviews {
    pub again: ReviewResult,
    pub hard: ReviewResult,
    pub good: ReviewResult,
    pub easy: ReviewResult,
}

impl NextReviews {
    pub fn get(&self, rating: Rating) -> &ReviewResult {
        match rating {
            Rating::Again => &self.again,
            Rating::Hard => &self.hard,
            Rating::Good => &self.good,
            Rating::Easy => &self.easy,
        }
    }

    pub fn into_result(self, rating: Rating) -> ReviewResult {
        match rating {
            Rating::Again => self.again,
            Rating::Hard => self.hard,
            Rating::Good => self.good,
            Rating::Easy => self.easy,
        }
    }

    /// All four ratings in order, Again first
    pub fn iter(&self) -> impl Iterator<Item = (Rating, &ReviewResult)> {
        Rating::ALL.into_iter().map(move |rating| (rating, self.get(rating)))
    }
}

/// Scheduler wrapping FSRS
pub struct Scheduler {
    fsrs: FSRS,
    params: Parameters,
}

impl Scheduler {
    /// Create a scheduler for one user's settings
    pub fn new(settings: &StudySettings) -> Result<Self> {
        Self::from_parameters(Parameters::from_settings(settings))
    }

    /// Create a scheduler from already assembled parameters
    pub fn from_parameters(params: Parameters) -> Result<Self> {
        params.validate()?;
        let fsrs = FSRS::new(Some(params.weights.as_slice()))?;
        Ok(Self { fsrs, params })
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    /// Apply one rating to a card at `now`
    pub fn review_card(
        &self,
        card: &CardData,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<ReviewResult> {
        let result = self.preview_reviews(card, now)?.into_result(rating);
        log::debug!(
            "Reviewed {} card as {:?}: now {} due {} (interval {:.2}d, stability {:.2}, difficulty {:.3})",
            card.state.as_str(),
            rating,
            result.state.as_str(),
            result.due_date,
            result.interval,
            result.stability,
            result.difficulty,
        );
        Ok(result)
    }

    /// Apply one rating to a card at the current instant
    pub fn review_card_now(&self, card: &CardData, rating: Rating) -> Result<ReviewResult> {
        self.review_card(card, rating, Utc::now())
    }

    /// Project every rating for a card at the current instant
    pub fn preview_reviews_now(&self, card: &CardData) -> Result<NextReviews> {
        self.preview_reviews(card, Utc::now())
    }

    /// Project what every rating would do to a card at `now`, without committing to one
    pub fn preview_reviews(&self, card: &CardData, now: DateTime<Utc>) -> Result<NextReviews> {
        let elapsed = timing::elapsed_days(card, now);
        let scheduled = timing::scheduled_days(card, now);
        if card.state == CardState::Review && elapsed > scheduled {
            log::debug!(
                "Card is {:.2} days overdue ({elapsed:.2} elapsed of {scheduled:.2} scheduled)",
                elapsed - scheduled
            );
        }

        let memory = self.memory_of(card);
        let days_elapsed = elapsed.floor() as u32;
        let next_states = self.fsrs.next_states(
            memory,
            self.params.desired_retention,
            days_elapsed,
        )?;

        let branches = self.branches(card, &next_states, now);
        let [again, hard, good, easy] = Rating::ALL.map(|rating| {
            self.finish(card, rating, branches[rating as usize - 1], now)
        });

        Ok(NextReviews {
            again,
            hard,
            good,
            easy,
        })
    }

    /// Current probability of recall, 0 for cards without memory
    pub fn retrievability(&self, card: &CardData, now: DateTime<Utc>) -> f64 {
        match self.memory_of(card) {
            Some(memory) => {
                let elapsed = timing::elapsed_days(card, now) as f32;
                fsrs::current_retrievability(memory, elapsed, self.params.decay()) as f64
            }
            None => 0.0,
        }
    }

    /// The model's view of a stored card, or None when it has no usable memory
    fn memory_of(&self, card: &CardData) -> Option<MemoryState> {
        if card.state == CardState::New {
            return None;
        }
        if !card.stability.is_finite() || card.stability <= 0.0 {
            log::warn!(
                "Ignoring stored stability {} on a {} card, starting memory afresh",
                card.stability,
                card.state.as_str()
            );
            return None;
        }

        let difficulty = if !card.difficulty.is_finite() {
            log::warn!(
                "Stored difficulty {} is not a number, using {FALLBACK_DIFFICULTY}",
                card.difficulty
            );
            FALLBACK_DIFFICULTY
        } else if !(0.0..=1.0).contains(&card.difficulty) {
            log::warn!("Stored difficulty {} out of range, clamping", card.difficulty);
            card.difficulty.clamp(0.0, 1.0)
        } else {
            card.difficulty
        };

        Some(MemoryState {
            stability: card.stability as f32,
            difficulty: to_model_difficulty(difficulty),
        })
    }

    /// Review intervals in days for each rating, rounded, bounded, fuzzed and
    /// ordered so that hard <= good < easy
    fn review_intervals(
        &self,
        card: &CardData,
        next_states: &NextStates,
        now: DateTime<Utc>,
    ) -> [f64; 4] {
        let (min, max) = self.params.interval_bounds();
        let seed = fuzz::seed(
            now,
            card.repetitions,
            card.lapses,
            card.stability * card.difficulty,
        );

        let items = [
            &next_states.again,
            &next_states.hard,
            &next_states.good,
            &next_states.easy,
        ];
        let mut days = [0.0; 4];
        for (i, item) in items.iter().enumerate() {
            let raw = (item.interval as f64).round().clamp(min, max);
            days[i] = if self.params.enable_fuzz {
                let salt = seed.wrapping_add(i as u64);
                fuzz::fuzz_interval(raw, self.params.maximum_interval, salt).clamp(min, max)
            } else {
                raw
            };
        }

        let [again, mut hard, mut good, mut easy] = days;
        hard = hard.min(good);
        good = good.max(hard + 1.0);
        easy = easy.max(good + 1.0);
        [again, hard.min(max), good.min(max), easy.min(max)]
    }

    /// Project each rating onto a stage, memory and delay
    fn branches(
        &self,
        card: &CardData,
        next_states: &NextStates,
        now: DateTime<Utc>,
    ) -> [Branch; 4] {
        let review_days = self.review_intervals(card, next_states, now);
        let items = [
            &next_states.again,
            &next_states.hard,
            &next_states.good,
            &next_states.easy,
        ];
        let stage = Stage::of(card);
        let longest_step = Duration::days(i64::from(self.params.maximum_interval));

        Rating::ALL.map(|rating| {
            let i = rating as usize - 1;
            let on_steps = |steps: &[Step], step: usize, relearning: bool| {
                match climb(steps, step, rating) {
                    Climb::Stay { step, delay } => {
                        let stage = if relearning {
                            Stage::Relearning { step }
                        } else {
                            Stage::Learning { step }
                        };
                        (stage, timing::to_days(delay.min(longest_step)))
                    }
                    Climb::Graduate => (Stage::Review, review_days[i]),
                }
            };

            let learning = self.params.learning_steps.as_slice();
            let relearning = self.params.relearning_steps.as_slice();
            let (stage, scheduled_days) = match stage {
                Stage::Learning { step } => on_steps(learning, step, false),
                Stage::Relearning { step } => on_steps(relearning, step, true),
                Stage::Review if rating == Rating::Again => on_steps(relearning, 0, true),
                Stage::Review => (Stage::Review, review_days[i]),
            };

            let memory = &items[i].memory;
            Branch {
                stage,
                stability: memory.stability as f64,
                difficulty: from_model_difficulty(memory.difficulty),
                scheduled_days,
            }
        })
    }

    /// Turn a projected branch into a calendar result and apply the interval overrides
    fn finish(
        &self,
        card: &CardData,
        rating: Rating,
        branch: Branch,
        now: DateTime<Utc>,
    ) -> ReviewResult {
        let state = branch.stage.state();
        let stability = if branch.stability.is_finite() {
            branch.stability.max(0.0)
        } else {
            log::warn!("Model returned stability {}, using 0", branch.stability);
            0.0
        };

        let mut due_date = self.due_from(branch.scheduled_days, stability, now);
        let mut interval = if state.is_stepping() && due_date - now < Duration::days(1) {
            0.0
        } else {
            timing::to_days(due_date - now)
        };

        // New and learning cards have no settled stability yet, so the
        // configured day counts win over the model on graduation
        if card.state.is_ungraduated() && state == CardState::Review {
            let configured = match rating {
                Rating::Easy => Some(self.params.easy_interval),
                Rating::Hard | Rating::Good => Some(self.params.graduating_interval),
                Rating::Again => None,
            };
            if let Some(days) = configured.filter(|&days| days > 0) {
                let days = days
                    .max(self.params.minimum_interval)
                    .min(self.params.maximum_interval) as f64;
                due_date = timing::add_days(now, days);
                interval = days;
            }
        }

        let repetitions = card.repetitions + u32::from(rating.is_pass());
        let lapses = card.lapses
            + u32::from(card.state == CardState::Review && rating == Rating::Again);

        ReviewResult {
            state,
            difficulty: branch.difficulty,
            stability,
            due_date,
            interval,
            repetitions,
            lapses,
            elapsed_days: 0.0,
            learning_step: branch.stage.step(),
        }
    }

    /// Due date for a projected delay, never at or before `now`
    fn due_from(&self, scheduled_days: f64, stability: f64, now: DateTime<Utc>) -> DateTime<Utc> {
        let due = if scheduled_days.is_finite() && scheduled_days > 0.0 {
            timing::add_days(now, scheduled_days)
        } else if stability > 0.0 {
            log::warn!("No projected delay, deriving due date from stability {stability:.2}");
            timing::add_days(now, stability.min(self.params.maximum_interval as f64))
        } else {
            log::warn!("No projected delay or stability, scheduling one minute out");
            now + timing::min_delay()
        };

        if due <= now {
            log::warn!("Projected due date {due} is not after {now}, scheduling one minute out");
            now + timing::min_delay()
        } else {
            due
        }
    }
}

/// Apply one rating to a card, building a scheduler for the given settings
pub fn review_card(
    card: &CardData,
    rating: Rating,
    settings: &StudySettings,
    now: DateTime<Utc>,
) -> Result<ReviewResult> {
    Scheduler::new(settings)?.review_card(card, rating, now)
}

/// Project all four ratings for a card, building a scheduler for the given settings
pub fn preview_reviews(
    card: &CardData,
    settings: &StudySettings,
    now: DateTime<Utc>,
) -> Result<NextReviews> {
    Scheduler::new(settings)?.preview_reviews(card, now)
}
