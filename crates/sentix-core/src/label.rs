//! The closed set of sentiment labels a classification may carry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentiment classification label.
///
/// The wire names (`"Positive"`, `"Neutral"`, `"Negative"`) are shared by the
/// classifier response schema, JSON output, and CSV export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown sentiment label: {0:?}")]
pub struct UnknownLabel(pub String);

impl SentimentLabel {
    /// All labels, in display order.
    pub const ALL: [SentimentLabel; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Neutral => "Neutral",
            Self::Negative => "Negative",
        }
    }

    /// The wire names, in display order. Used to build the response schema enum.
    pub fn wire_names() -> [&'static str; 3] {
        Self::ALL.map(|l| l.as_str())
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = UnknownLabel;

    /// Exact match on the wire name. Anything else is rejected, not coerced.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}
