//! Classification payloads and the immutable history records built from them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::label::SentimentLabel;

/// Prefix of ids minted for records produced by an analysis.
pub const RECORD_ID_PREFIX: &str = "AN-";

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
    #[error("record id must not be empty")]
    EmptyId,
}

/// Check that a confidence value is finite and within the closed interval [0, 1].
pub fn check_confidence(confidence: f64) -> Result<f64, RecordError> {
    if confidence.is_finite() && (0.0..=1.0).contains(&confidence) {
        Ok(confidence)
    } else {
        Err(RecordError::ConfidenceOutOfRange(confidence))
    }
}

/// Mint a fresh record id: `AN-` followed by 32 uppercase hex digits.
pub fn new_record_id() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_ascii_uppercase();
    format!("{RECORD_ID_PREFIX}{hex}")
}

/// A validated classifier verdict for one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    label: SentimentLabel,
    confidence: f64,
    key_terms: Option<Vec<String>>,
}

impl Classification {
    /// Build a classification, rejecting out-of-range confidence.
    ///
    /// Key terms keep the classifier's order. An empty list is stored as absent.
    pub fn new(
        label: SentimentLabel,
        confidence: f64,
        key_terms: Vec<String>,
    ) -> Result<Self, RecordError> {
        Ok(Self {
            label,
            confidence: check_confidence(confidence)?,
            key_terms: (!key_terms.is_empty()).then_some(key_terms),
        })
    }

    pub fn label(&self) -> SentimentLabel {
        self.label
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn key_terms(&self) -> Option<&[String]> {
        self.key_terms.as_deref()
    }
}

/// One completed analysis.
///
/// Created by the analysis pipeline after a successful classification (or
/// loaded at session start from seed data or an earlier export). Immutable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRecord {
    id: String,
    text: String,
    label: SentimentLabel,
    confidence: f64,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_terms: Option<Vec<String>>,
}

impl ClassificationRecord {
    /// Finalise a record from a classification with a fresh id.
    pub fn finalize(
        text: impl Into<String>,
        classification: Classification,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_record_id(),
            text: text.into(),
            label: classification.label,
            confidence: classification.confidence,
            created_at,
            key_terms: classification.key_terms,
        }
    }

    /// Rebuild a record with a known id (seed data, CSV import).
    pub fn restore(
        id: impl Into<String>,
        text: impl Into<String>,
        classification: Classification,
        created_at: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        let id = id.into();
        if id.is_empty() {
            return Err(RecordError::EmptyId);
        }
        Ok(Self {
            id,
            text: text.into(),
            label: classification.label,
            confidence: classification.confidence,
            created_at,
            key_terms: classification.key_terms,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn label(&self) -> SentimentLabel {
        self.label
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn key_terms(&self) -> Option<&[String]> {
        self.key_terms.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positive(confidence: f64) -> Result<Classification, RecordError> {
        Classification::new(
            SentimentLabel::Positive,
            confidence,
            vec!["excellent".into(), "service".into(), "fast".into()],
        )
    }

    #[test]
    fn confidence_bounds_are_inclusive() {
        assert!(positive(0.0).is_ok());
        assert!(positive(1.0).is_ok());
        assert_eq!(
            positive(1.0001).unwrap_err(),
            RecordError::ConfidenceOutOfRange(1.0001)
        );
        assert!(positive(-0.01).is_err());
        assert!(positive(f64::NAN).is_err());
        assert!(positive(f64::INFINITY).is_err());
    }

    #[test]
    fn key_terms_keep_order_and_duplicates() {
        let c = Classification::new(
            SentimentLabel::Negative,
            0.5,
            vec!["late".into(), "broken".into(), "late".into()],
        )
        .unwrap();
        assert_eq!(c.key_terms().unwrap(), ["late", "broken", "late"]);
    }

    #[test]
    fn empty_key_terms_are_absent() {
        let c = Classification::new(SentimentLabel::Neutral, 0.5, vec![]).unwrap();
        assert!(c.key_terms().is_none());
    }

    #[test]
    fn finalize_mints_distinct_ids() {
        let now = Utc::now();
        let a = ClassificationRecord::finalize("same text", positive(0.9).unwrap(), now);
        let b = ClassificationRecord::finalize("same text", positive(0.9).unwrap(), now);
        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with(RECORD_ID_PREFIX));
        assert_eq!(a.id().len(), RECORD_ID_PREFIX.len() + 32);
    }

    #[test]
    fn restore_rejects_empty_id() {
        let err = ClassificationRecord::restore("", "text", positive(0.9).unwrap(), Utc::now())
            .unwrap_err();
        assert_eq!(err, RecordError::EmptyId);
    }

    #[test]
    fn serializes_camel_case() {
        let record = ClassificationRecord::restore(
            "tx_1",
            "Excellent service, very fast.",
            positive(0.97).unwrap(),
            "2024-05-01T10:00:00Z".parse().unwrap(),
        )
        .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "tx_1");
        assert_eq!(json["label"], "Positive");
        assert_eq!(json["confidence"], 0.97);
        assert_eq!(json["createdAt"], "2024-05-01T10:00:00Z");
        assert_eq!(json["keyTerms"][0], "excellent");
    }
}
