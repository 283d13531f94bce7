//! Aggregate statistics derived from a sequence of classification records.

use serde::Serialize;

use crate::label::SentimentLabel;
use crate::record::ClassificationRecord;

/// Counts per label and mean confidence over a set of records.
///
/// A pure projection: recompute it whenever the underlying records are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total: usize,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    /// Mean confidence. Zero when there are no records.
    pub average_confidence: f64,
}

impl AggregateStats {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ClassificationRecord>,
    {
        let mut stats = Self::default();
        let mut confidence_sum = 0.0;

        for record in records {
            match record.label() {
                SentimentLabel::Positive => stats.positive += 1,
                SentimentLabel::Neutral => stats.neutral += 1,
                SentimentLabel::Negative => stats.negative += 1,
            }
            confidence_sum += record.confidence();
            stats.total += 1;
        }

        if stats.total > 0 {
            stats.average_confidence = confidence_sum / stats.total as f64;
        }
        stats
    }

    pub fn count(&self, label: SentimentLabel) -> usize {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Negative => self.negative,
        }
    }

    /// Percentage of records carrying `label`, in [0, 100]. Zero when empty.
    pub fn share(&self, label: SentimentLabel) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.count(label) as f64 / self.total as f64 * 100.0
    }

    /// Non-zero label counts in display order.
    pub fn distribution(&self) -> Vec<(SentimentLabel, usize)> {
        SentimentLabel::ALL
            .into_iter()
            .map(|label| (label, self.count(label)))
            .filter(|&(_, n)| n > 0)
            .collect()
    }
}
