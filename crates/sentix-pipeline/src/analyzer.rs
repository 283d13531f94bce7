//! The analysis workflow: validate → classify → build record → (optionally) store.
//!
//! Validation happens before any network call. A failed classification never
//! produces a record, partial or otherwise.

use chrono::Utc;
use sentix_ai::{Classifier, ClassifyError, ErrorKind};
use sentix_core::ClassificationRecord;
use sentix_store::HistoryStore;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::AnalysisError;

/// Minimum trimmed length, in characters, of a text worth classifying.
pub const DEFAULT_MIN_CHARS: usize = 5;

/// Whether any analysis is waiting on the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalysisState {
    #[default]
    Idle,
    Pending { in_flight: usize },
}

impl AnalysisState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// Marks one analysis as in flight until dropped, including when the future
/// running the analysis is dropped mid-call.
struct PendingGuard<'a>(&'a watch::Sender<AnalysisState>);

impl<'a> PendingGuard<'a> {
    fn enter(state: &'a watch::Sender<AnalysisState>) -> Self {
        state.send_modify(|s| {
            *s = match *s {
                AnalysisState::Idle => AnalysisState::Pending { in_flight: 1 },
                AnalysisState::Pending { in_flight } => AnalysisState::Pending {
                    in_flight: in_flight + 1,
                },
            }
        });
        Self(state)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|s| {
            *s = match *s {
                AnalysisState::Pending { in_flight } if in_flight > 1 => AnalysisState::Pending {
                    in_flight: in_flight - 1,
                },
                _ => AnalysisState::Idle,
            }
        });
    }
}

/// Runs analyses against one classifier.
///
/// Each call is independent: identical texts produce distinct records, and
/// concurrent calls do not wait on each other.
pub struct Analyzer<C> {
    classifier: C,
    min_chars: usize,
    state: watch::Sender<AnalysisState>,
}

impl<C: Classifier> Analyzer<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            min_chars: DEFAULT_MIN_CHARS,
            state: watch::Sender::new(AnalysisState::Idle),
        }
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn min_chars(&self) -> usize {
        self.min_chars
    }

    pub fn state(&self) -> AnalysisState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<AnalysisState> {
        self.state.subscribe()
    }

    /// Trim the input and check it against the minimum length.
    pub fn validate<'t>(&self, text: &'t str) -> Result<&'t str, AnalysisError> {
        let trimmed = text.trim();
        let actual = trimmed.chars().count();
        if actual < self.min_chars {
            warn!(chars = actual, min_chars = self.min_chars, "feedback rejected: too short");
            return Err(AnalysisError::Validation {
                min_chars: self.min_chars,
                actual,
            });
        }
        Ok(trimmed)
    }

    /// Validate and classify `text`, returning the finished record.
    ///
    /// The record carries the trimmed text, a fresh id, and the local time at
    /// which the classifier answered.
    pub async fn analyze(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<ClassificationRecord, AnalysisError> {
        let text = self.validate(text)?;

        let result = {
            let _pending = PendingGuard::enter(&self.state);
            self.classifier.classify(text, cancel).await
        };

        match result {
            Ok(classification) => {
                let record = ClassificationRecord::finalize(text, classification, Utc::now());
                info!(
                    id = %record.id(),
                    label = %record.label(),
                    confidence = record.confidence(),
                    "analysis complete"
                );
                Ok(record)
            }
            Err(err) => Err(self.report(err)),
        }
    }

    /// Analyze `text` and put the record at the front of `store`.
    pub async fn submit(
        &self,
        text: &str,
        store: &mut HistoryStore,
        cancel: &CancellationToken,
    ) -> Result<ClassificationRecord, AnalysisError> {
        let record = self.analyze(text, cancel).await?;
        store.prepend(record.clone())?;
        Ok(record)
    }

    fn report(&self, err: ClassifyError) -> AnalysisError {
        let classifier = self.classifier.name();
        match err.kind() {
            ErrorKind::Configuration => {
                error!(classifier, error = %err, "classifier is not configured");
            }
            ErrorKind::Transport => {
                error!(classifier, kind = err.kind().as_str(), error = %err, "classification call failed");
            }
            ErrorKind::Schema => {
                error!(
                    classifier,
                    kind = err.kind().as_str(),
                    error = %err,
                    "classifier response broke the schema contract"
                );
            }
            ErrorKind::Cancelled => {
                info!(classifier, "classification cancelled");
            }
        }
        AnalysisError::from_classify(err)
    }
}
