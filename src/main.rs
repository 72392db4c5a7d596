use anyhow::Result;
use cardsched::{CardData, Rating, Scheduler, StudySettings};
use chrono::Utc;

/// Reviews simulated after the preview
const SIMULATED_REVIEWS: usize = 12;

fn main() -> Result<()> {
    env_logger::init();

    // Optional single argument: the rating to simulate with (1-4, default Good)
    let rating = match std::env::args().nth(1) {
        Some(arg) => Rating::try_from(arg.parse::<u8>()?)?,
        None => Rating::Good,
    };

    let settings = StudySettings::load()?;
    log::debug!(
        "Loaded settings from {}",
        StudySettings::settings_path().display()
    );
    let scheduler = Scheduler::new(&settings)?;

    let now = Utc::now();
    let card = CardData::new();

    println!("New card, reviewed at {now}");
    for (rating, result) in scheduler.preview_reviews(&card, now)?.iter() {
        println!(
            "  {:<5} -> {:<10} due {} ({:.2} days)",
            format!("{rating:?}"),
            result.state.as_str(),
            result.due_date.format("%Y-%m-%d %H:%M"),
            result.interval,
        );
    }

    println!();
    println!("Always rating {rating:?}:");
    let mut card = card;
    let mut at = now;
    for i in 1..=SIMULATED_REVIEWS {
        let result = scheduler.review_card(&card, rating, at)?;
        println!(
            "  #{i:<2} {:<10} due {} interval {:>8.2}d stability {:>8.2} difficulty {:.3}",
            result.state.as_str(),
            result.due_date.format("%Y-%m-%d %H:%M"),
            result.interval,
            result.stability,
            result.difficulty,
        );
        card = card.apply(&result, at);
        at = result.due_date;
    }

    Ok(())
}
