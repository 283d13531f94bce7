//! Log-view filtering over classification records.

use crate::label::SentimentLabel;
use crate::record::ClassificationRecord;

/// Search term plus optional label filter.
///
/// The term matches record text case-insensitively as a substring; an empty
/// term matches everything. `label: None` means all labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    term: String,
    label: Option<SentimentLabel>,
}

impl HistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = term.into().to_lowercase();
        self
    }

    pub fn with_label(mut self, label: Option<SentimentLabel>) -> Self {
        self.label = label;
        self
    }

    pub fn matches(&self, record: &ClassificationRecord) -> bool {
        let label_ok = self.label.is_none_or(|l| l == record.label());
        label_ok && (self.term.is_empty() || record.text().to_lowercase().contains(&self.term))
    }

    /// Records matching the query, in input order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a ClassificationRecord>
    where
        I: IntoIterator<Item = &'a ClassificationRecord>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}
