//! Session history: the ordered, growing collection of classification records.
//!
//! Order is most-recent-first. The only mutation is [`HistoryStore::prepend`];
//! views read through `&HistoryStore` or an immutable [`HistorySnapshot`].

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sentix_core::{AggregateStats, ClassificationRecord, HistoryQuery};
use tracing::info;

use crate::StoreError;
use crate::seed::seed_records;

/// In-memory history for one session. Unbounded; no per-record deletion.
///
/// Records are held behind `Arc` so snapshots share them with the store.
#[derive(Debug, Default)]
pub struct HistoryStore {
    records: VecDeque<Arc<ClassificationRecord>>,
    ids: HashSet<String>,
}

impl HistoryStore {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// A history holding the illustrative seed records.
    pub fn seeded(now: DateTime<Utc>) -> Result<Self, StoreError> {
        Self::with_records(seed_records(now)?)
    }

    /// A history initialised from existing records, given most recent first.
    pub fn with_records(records: Vec<ClassificationRecord>) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for record in records.into_iter().rev() {
            store.insert_front(record)?;
        }
        Ok(store)
    }

    /// Add a record at the front. Fails only if its id is already present.
    pub fn prepend(&mut self, record: ClassificationRecord) -> Result<(), StoreError> {
        let (id, label) = (record.id().to_string(), record.label());
        self.insert_front(record)?;
        info!(id = %id, label = %label, total = self.records.len(), "record added to history");
        Ok(())
    }

    fn insert_front(&mut self, record: ClassificationRecord) -> Result<(), StoreError> {
        if !self.ids.insert(record.id().to_string()) {
            return Err(StoreError::DuplicateId(record.id().to_string()));
        }
        self.records.push_front(Arc::new(record));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, most recent first.
    pub fn records(&self) -> impl DoubleEndedIterator<Item = &ClassificationRecord> + '_ {
        self.records.iter().map(Arc::as_ref)
    }

    pub fn latest(&self) -> Option<&ClassificationRecord> {
        self.records.front().map(Arc::as_ref)
    }

    pub fn get(&self, id: &str) -> Option<&ClassificationRecord> {
        self.records().find(|r| r.id() == id)
    }

    /// The last `n` records of the sequence (the oldest ones), in sequence order.
    pub fn suffix(&self, n: usize) -> impl Iterator<Item = &ClassificationRecord> + '_ {
        self.records().skip(self.records.len().saturating_sub(n))
    }

    pub fn stats(&self) -> AggregateStats {
        AggregateStats::from_records(self.records())
    }

    pub fn search(&self, query: &HistoryQuery) -> Vec<&ClassificationRecord> {
        query.apply(self.records())
    }

    /// Freeze the current contents for readers that must not hold a borrow.
    ///
    /// Copies one pointer per record; the records themselves are shared.
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            records: self.records.iter().cloned().collect(),
        }
    }
}

/// Immutable, cheaply cloneable view of the history at one point in time.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    records: Arc<[Arc<ClassificationRecord>]>,
}

impl Default for HistorySnapshot {
    fn default() -> Self {
        Self {
            records: Arc::from(Vec::new()),
        }
    }
}

impl HistorySnapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, most recent first.
    pub fn records(&self) -> impl DoubleEndedIterator<Item = &ClassificationRecord> + '_ {
        self.records.iter().map(Arc::as_ref)
    }

    pub fn latest(&self) -> Option<&ClassificationRecord> {
        self.records.first().map(Arc::as_ref)
    }

    /// The last `n` records of the sequence, in sequence order.
    pub fn suffix(&self, n: usize) -> impl Iterator<Item = &ClassificationRecord> + '_ {
        self.records[self.records.len().saturating_sub(n)..]
            .iter()
            .map(Arc::as_ref)
    }

    pub fn stats(&self) -> AggregateStats {
        AggregateStats::from_records(self.records())
    }

    pub fn search(&self, query: &HistoryQuery) -> Vec<&ClassificationRecord> {
        query.apply(self.records())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentix_core::{Classification, SentimentLabel};

    fn record(text: &str, label: SentimentLabel, confidence: f64) -> ClassificationRecord {
        ClassificationRecord::finalize(
            text,
            Classification::new(label, confidence, vec![]).unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn empty_store_stats_are_zero() {
        let store = HistoryStore::new();
        let stats = store.stats();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.positive + stats.neutral + stats.negative, 0);
        assert_eq!(stats.average_confidence, 0.0);
        assert!(store.latest().is_none());
    }

    #[test]
    fn prepend_puts_newest_first_and_keeps_prior_order() {
        let mut store = HistoryStore::seeded(Utc::now()).unwrap();
        let before: Vec<String> = store.records().map(|r| r.id().to_string()).collect();

        let added: Vec<ClassificationRecord> = (0..4)
            .map(|i| record(&format!("feedback number {i}"), SentimentLabel::Positive, 0.8))
            .collect();
        for r in &added {
            store.prepend(r.clone()).unwrap();
            assert_eq!(store.latest().unwrap().id(), r.id());
        }

        assert_eq!(store.len(), before.len() + added.len());
        let after: Vec<&str> = store.records().map(|r| r.id()).collect();
        let expected_front: Vec<&str> = added.iter().rev().map(|r| r.id()).collect();
        assert_eq!(&after[..4], expected_front.as_slice());
        assert_eq!(&after[4..], before.as_slice());
    }

    #[test]
    fn identical_text_yields_distinct_records() {
        let mut store = HistoryStore::new();
        store
            .prepend(record("same words again", SentimentLabel::Neutral, 0.5))
            .unwrap();
        store
            .prepend(record("same words again", SentimentLabel::Neutral, 0.5))
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn duplicate_id_is_rejected_without_mutation() {
        let mut store = HistoryStore::new();
        let r = record("first one here", SentimentLabel::Negative, 0.9);
        store.prepend(r.clone()).unwrap();
        let err = store.prepend(r.clone()).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(id) if id == r.id()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn with_records_keeps_given_order() {
        let records = vec![
            record("newest entry", SentimentLabel::Positive, 0.9),
            record("older entry", SentimentLabel::Negative, 0.7),
        ];
        let store = HistoryStore::with_records(records.clone()).unwrap();
        let ids: Vec<&str> = store.records().map(|r| r.id()).collect();
        assert_eq!(ids, vec![records[0].id(), records[1].id()]);
        assert!(store.get(records[1].id()).is_some());
    }

    #[test]
    fn suffix_returns_tail_of_sequence() {
        let store = HistoryStore::seeded(Utc::now()).unwrap();
        let tail: Vec<&str> = store.suffix(2).map(|r| r.id()).collect();
        assert_eq!(tail, vec!["tx_67890", "tx_12345"]);
        assert_eq!(store.suffix(10).count(), 3);
        assert_eq!(store.suffix(0).count(), 0);
    }

    #[test]
    fn snapshot_is_detached_from_later_writes() {
        let mut store = HistoryStore::seeded(Utc::now()).unwrap();
        let snapshot = store.snapshot();
        store
            .prepend(record("after the snapshot", SentimentLabel::Positive, 0.6))
            .unwrap();

        assert_eq!(snapshot.len(), 3);
        assert_eq!(store.len(), 4);
        assert_eq!(snapshot.stats(), HistoryStore::seeded(Utc::now()).unwrap().stats());
        assert_eq!(snapshot.latest().unwrap().id(), "tx_54321");
        let tail: Vec<&str> = snapshot.suffix(1).map(|r| r.id()).collect();
        assert_eq!(tail, vec!["tx_12345"]);
    }

    #[test]
    fn snapshot_shares_records_with_store() {
        let mut store = HistoryStore::seeded(Utc::now()).unwrap();
        let first = store.snapshot();
        store
            .prepend(record("one more for the pile", SentimentLabel::Neutral, 0.55))
            .unwrap();
        let second = store.snapshot();

        assert!(Arc::ptr_eq(&first.records[0], &second.records[1]));
        for (held, shared) in store.records.iter().zip(second.records.iter()) {
            assert!(Arc::ptr_eq(held, shared));
        }
    }

    #[test]
    fn search_filters_by_label() {
        let store = HistoryStore::seeded(Utc::now()).unwrap();
        let hits = store.search(&HistoryQuery::new().with_label(Some(SentimentLabel::Negative)));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "tx_67890");
        assert_eq!(store.snapshot().search(&HistoryQuery::new().with_term("PRICE")).len(), 1);
    }
}
