//! Illustrative records a new session starts with. Not persisted.

use chrono::{DateTime, Duration, Utc};
use sentix_core::{Classification, ClassificationRecord, RecordError, SentimentLabel};

struct Seed {
    id: &'static str,
    text: &'static str,
    label: SentimentLabel,
    confidence: f64,
    hours_ago: i64,
    key_terms: [&'static str; 3],
}

// Most recent first.
const SEEDS: [Seed; 3] = [
    Seed {
        id: "tx_54321",
        text: "It's fine for the price, but the quality could be better.",
        label: SentimentLabel::Neutral,
        confidence: 0.72,
        hours_ago: 1,
        key_terms: ["fine", "price", "quality"],
    },
    Seed {
        id: "tx_67890",
        text: "The product arrived late and the box was damaged. Very unhappy.",
        label: SentimentLabel::Negative,
        confidence: 0.94,
        hours_ago: 2,
        key_terms: ["late", "damaged", "unhappy"],
    },
    Seed {
        id: "tx_12345",
        text: "Excellent customer service, they answered my questions in minutes.",
        label: SentimentLabel::Positive,
        confidence: 0.98,
        hours_ago: 5,
        key_terms: ["excellent", "service", "minutes"],
    },
];

/// Seed records timestamped relative to `now`, most recent first.
pub fn seed_records(now: DateTime<Utc>) -> Result<Vec<ClassificationRecord>, RecordError> {
    SEEDS
        .iter()
        .map(|seed| {
            let classification = Classification::new(
                seed.label,
                seed.confidence,
                seed.key_terms.iter().map(|t| t.to_string()).collect(),
            )?;
            ClassificationRecord::restore(
                seed.id,
                seed.text,
                classification,
                now - Duration::hours(seed.hours_ago),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_are_newest_first_with_one_of_each_label() {
        let now = Utc::now();
        let seeds = seed_records(now).unwrap();
        assert_eq!(seeds.len(), 3);
        assert!(seeds.windows(2).all(|w| w[0].created_at() > w[1].created_at()));
        assert_eq!(seeds[0].created_at(), now - Duration::hours(1));
        for label in SentimentLabel::ALL {
            assert_eq!(seeds.iter().filter(|r| r.label() == label).count(), 1);
        }
    }
}
