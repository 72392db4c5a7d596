//! Spaced repetition scheduling on top of the FSRS memory model.
//!
//! Callers hand in a card's stored memory state, a rating and the user's
//! study settings, and persist the [`ReviewResult`] they get back. The
//! scheduler adds learning and relearning steps, interval bounds, fuzz and
//! the easy/graduating interval overrides around the `fsrs` crate.

pub mod audit;
pub mod card;
pub mod config;
pub mod fuzz;
pub mod params;
pub mod scheduler;
pub mod steps;
pub mod timing;

pub use audit::ReviewLog;
pub use card::{CardData, CardState, Rating, ReviewResult};
pub use config::{FsrsOverrides, StudySettings};
pub use params::Parameters;
pub use scheduler::{NextReviews, Scheduler, preview_reviews, review_card};
pub use steps::Step;
