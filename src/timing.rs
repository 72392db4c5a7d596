//! Conversions between calendar time and fractional days.

use crate::card::CardData;
use chrono::{DateTime, Duration, Utc};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Shortest delay before a card may come due again
pub fn min_delay() -> Duration {
    Duration::minutes(1)
}

/// A span of time as a real number of days
pub fn to_days(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// A real number of days as a span of time, rounded to the millisecond.
/// Non-finite or negative inputs give a zero span.
pub fn from_days(days: f64) -> Duration {
    if !days.is_finite() || days <= 0.0 {
        return Duration::zero();
    }
    Duration::milliseconds((days * MILLIS_PER_DAY).round() as i64)
}

/// Days since the last review, never negative.
/// Falls back to the stored value for cards without review history.
pub fn elapsed_days(card: &CardData, now: DateTime<Utc>) -> f64 {
    match card.last_review {
        Some(last) => {
            let days = to_days(now.signed_duration_since(last));
            if days < 0.0 {
                log::warn!("Last review {last} is after {now}, treating elapsed time as zero");
                0.0
            } else {
                days
            }
        }
        None if card.elapsed_days.is_finite() => card.elapsed_days.max(0.0),
        None => 0.0,
    }
}

/// Days the card was meant to wait before this review, never negative
pub fn scheduled_days(card: &CardData, now: DateTime<Utc>) -> f64 {
    if card.interval.is_finite() && card.interval > 0.0 {
        return card.interval;
    }
    match card.due_date {
        Some(due) => to_days(due.signed_duration_since(now)).max(0.0),
        None => 0.0,
    }
}

/// `now + days`, saturating instead of overflowing the calendar
pub fn add_days(now: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    now.checked_add_signed(from_days(days))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardState;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_day_conversions() {
        assert_eq!(to_days(Duration::days(3)), 3.0);
        assert_eq!(to_days(Duration::hours(6)), 0.25);
        assert_eq!(from_days(0.5), Duration::hours(12));
        assert_eq!(from_days(1.0 / 1440.0), Duration::minutes(1));
    }

    #[test]
    fn test_from_days_rejects_garbage() {
        assert_eq!(from_days(-2.0), Duration::zero());
        assert_eq!(from_days(f64::NAN), Duration::zero());
        assert_eq!(from_days(f64::INFINITY), Duration::zero());
    }

    #[test]
    fn test_elapsed_is_fractional() {
        let card = CardData {
            last_review: Some(now() - Duration::minutes(10)),
            ..CardData::new()
        };
        let elapsed = elapsed_days(&card, now());
        assert!((elapsed - 10.0 / 1440.0).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_clamps_clock_skew() {
        let card = CardData {
            last_review: Some(now() + Duration::hours(2)),
            ..CardData::new()
        };
        assert_eq!(elapsed_days(&card, now()), 0.0);
    }

    #[test]
    fn test_elapsed_falls_back_to_stored() {
        let card = CardData {
            elapsed_days: 2.5,
            ..CardData::new()
        };
        assert_eq!(elapsed_days(&card, now()), 2.5);

        let card = CardData {
            elapsed_days: -1.0,
            ..CardData::new()
        };
        assert_eq!(elapsed_days(&card, now()), 0.0);
    }

    #[test]
    fn test_scheduled_prefers_interval() {
        let card = CardData {
            state: CardState::Review,
            interval: 10.0,
            due_date: Some(now() + Duration::days(3)),
            ..CardData::new()
        };
        assert_eq!(scheduled_days(&card, now()), 10.0);
    }

    #[test]
    fn test_scheduled_from_due_date() {
        let card = CardData {
            due_date: Some(now() + Duration::hours(36)),
            ..CardData::new()
        };
        assert_eq!(scheduled_days(&card, now()), 1.5);

        // Reviewed late
        let card = CardData {
            due_date: Some(now() - Duration::days(2)),
            ..CardData::new()
        };
        assert_eq!(scheduled_days(&card, now()), 0.0);
    }

    #[test]
    fn test_scheduled_without_history() {
        assert_eq!(scheduled_days(&CardData::new(), now()), 0.0);
    }

    #[test]
    fn test_add_days() {
        assert_eq!(add_days(now(), 4.0), now() + Duration::days(4));
        assert_eq!(add_days(now(), 0.0), now());
    }
}
