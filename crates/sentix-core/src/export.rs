//! CSV export of classification records, and the matching import.
//!
//! The export layout is a compatibility contract with existing consumers:
//!
//! ```text
//! ID,Fecha,Texto,Previsión,Probabilidad
//! AN-3F2A...,2024-05-01T10:00:00.000Z,"She said ""great""",Positive,0.9700
//! ```
//!
//! - Timestamp: ISO 8601 UTC, millisecond precision, `Z` suffix.
//! - Text: always double-quoted, inner quotes doubled. Nothing else escaped.
//! - Confidence: 4 decimals.
//! - Rows joined with `\n`, no trailing newline.

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use tracing::debug;

use crate::label::{SentimentLabel, UnknownLabel};
use crate::record::{Classification, ClassificationRecord, RecordError};

/// Header row of the export.
pub const CSV_HEADER: [&str; 5] = ["ID", "Fecha", "Texto", "Previsión", "Probabilidad"];

/// Default file name for exports.
pub const DEFAULT_EXPORT_FILE: &str = "sentix_export.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("empty CSV input")]
    Empty,
    #[error("unexpected CSV header: {0:?}")]
    Header(String),
    #[error("row {row}: unterminated quoted field")]
    UnterminatedQuote { row: usize },
    #[error("row {row}: expected {} fields, found {found}", CSV_HEADER.len())]
    FieldCount { row: usize, found: usize },
    #[error("row {row}: invalid timestamp {value:?}")]
    Timestamp { row: usize, value: String },
    #[error("row {row}: {source}")]
    Label {
        row: usize,
        #[source]
        source: UnknownLabel,
    },
    #[error("row {row}: invalid confidence {value:?}")]
    Confidence { row: usize, value: String },
    #[error("row {row}: {source}")]
    Record {
        row: usize,
        #[source]
        source: RecordError,
    },
}

/// Format a timestamp the way the export does (`2024-05-01T10:00:00.000Z`).
pub fn iso_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Quote a text field, doubling any inner quotes.
pub fn quote_field(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

/// Render records as CSV, header first, in the given order.
pub fn to_csv<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a ClassificationRecord>,
{
    let mut lines = vec![CSV_HEADER.join(",")];
    lines.extend(records.into_iter().map(|r| {
        [
            r.id().to_string(),
            iso_timestamp(r.created_at()),
            quote_field(r.text()),
            r.label().to_string(),
            format!("{:.4}", r.confidence()),
        ]
        .join(",")
    }));
    lines.join("\n")
}

/// Parse an export back into records. Key terms are not part of the export
/// and come back absent.
pub fn from_csv(input: &str) -> Result<Vec<ClassificationRecord>, ExportError> {
    let mut rows = split_rows(input)?.into_iter();

    let header = rows.next().ok_or(ExportError::Empty)?;
    if header != CSV_HEADER {
        return Err(ExportError::Header(header.join(",")));
    }

    let records = rows
        .enumerate()
        // Header is row 1.
        .map(|(i, fields)| parse_row(i + 2, fields))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = records.len(), "parsed CSV export");
    Ok(records)
}

fn parse_row(row: usize, fields: Vec<String>) -> Result<ClassificationRecord, ExportError> {
    let [id, ts, text, label, confidence]: [String; 5] =
        fields
            .try_into()
            .map_err(|fields: Vec<String>| ExportError::FieldCount {
                row,
                found: fields.len(),
            })?;

    let created_at = DateTime::parse_from_rfc3339(&ts)
        .map_err(|_| ExportError::Timestamp {
            row,
            value: ts.clone(),
        })?
        .with_timezone(&Utc);
    let label: SentimentLabel = label
        .parse()
        .map_err(|source| ExportError::Label { row, source })?;
    let confidence: f64 = confidence
        .parse()
        .map_err(|_| ExportError::Confidence {
            row,
            value: confidence.clone(),
        })?;

    let classification = Classification::new(label, confidence, Vec::new())
        .map_err(|source| ExportError::Record { row, source })?;
    ClassificationRecord::restore(id, text, classification, created_at)
        .map_err(|source| ExportError::Record { row, source })
}

/// Split CSV text into rows of fields.
///
/// Quoted fields may contain commas, newlines and doubled quotes. Blank lines
/// are skipped. `\r\n` line endings are accepted.
fn split_rows(input: &str) -> Result<Vec<Vec<String>>, ExportError> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !quoted => {
                in_quotes = true;
                quoted = true;
            }
            ',' => {
                row.push(std::mem::take(&mut field));
                quoted = false;
            }
            '\n' => {
                end_row(&mut row, &mut field, &mut rows);
                quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ExportError::UnterminatedQuote {
            row: rows.len() + 1,
        });
    }
    if quoted || !field.is_empty() || !row.is_empty() {
        end_row(&mut row, &mut field, &mut rows);
    }
    Ok(rows)
}

fn end_row(row: &mut Vec<String>, field: &mut String, rows: &mut Vec<Vec<String>>) {
    row.push(std::mem::take(field));
    let row = std::mem::take(row);
    if !(row.len() == 1 && row[0].is_empty()) {
        rows.push(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, text: &str, label: SentimentLabel, confidence: f64) -> ClassificationRecord {
        ClassificationRecord::restore(
            id,
            text,
            Classification::new(label, confidence, vec!["kept".into()]).unwrap(),
            "2024-05-01T10:00:00.123456Z".parse().unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn exact_layout() {
        let records = vec![
            record("AN-1", "Excellent service, very fast.", SentimentLabel::Positive, 0.97),
            record("AN-2", "She said \"meh\"", SentimentLabel::Neutral, 0.5),
        ];
        let csv = to_csv(&records);
        assert_eq!(
            csv,
            "ID,Fecha,Texto,Previsión,Probabilidad\n\
             AN-1,2024-05-01T10:00:00.123Z,\"Excellent service, very fast.\",Positive,0.9700\n\
             AN-2,2024-05-01T10:00:00.123Z,\"She said \"\"meh\"\"\",Neutral,0.5000"
        );
    }

    #[test]
    fn empty_export_is_header_only() {
        let csv = to_csv(&Vec::<ClassificationRecord>::new());
        assert_eq!(csv, "ID,Fecha,Texto,Previsión,Probabilidad");
        assert!(from_csv(&csv).unwrap().is_empty());
    }

    #[test]
    fn reimport_recovers_exported_fields() {
        let records = vec![
            record(
                "AN-1",
                "Multi-line,\n\"quoted\" and, commas",
                SentimentLabel::Negative,
                0.123456,
            ),
            record("tx_2", "plain", SentimentLabel::Positive, 1.0),
        ];
        let parsed = from_csv(&to_csv(&records)).unwrap();
        assert_eq!(parsed.len(), 2);
        for (orig, back) in records.iter().zip(&parsed) {
            assert_eq!(back.id(), orig.id());
            assert_eq!(back.text(), orig.text());
            assert_eq!(back.label(), orig.label());
            assert_eq!(iso_timestamp(back.created_at()), iso_timestamp(orig.created_at()));
            assert_eq!(
                format!("{:.4}", back.confidence()),
                format!("{:.4}", orig.confidence())
            );
            assert!(back.key_terms().is_none());
        }
    }

    #[test]
    fn accepts_crlf_and_trailing_newline() {
        let csv = "ID,Fecha,Texto,Previsión,Probabilidad\r\n\
                   AN-1,2024-05-01T10:00:00.000Z,\"ok then\",Neutral,0.7200\r\n";
        let parsed = from_csv(csv).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].text(), "ok then");
        assert_eq!(parsed[0].confidence(), 0.72);
    }

    #[test]
    fn rejects_wrong_header() {
        let err = from_csv("id,date,text,label,confidence").unwrap_err();
        assert!(matches!(err, ExportError::Header(_)));
    }

    #[test]
    fn rejects_label_outside_enumeration() {
        let csv = "ID,Fecha,Texto,Previsión,Probabilidad\n\
                   AN-1,2024-05-01T10:00:00.000Z,\"x\",Mixed,0.5000";
        let err = from_csv(csv).unwrap_err();
        assert!(matches!(err, ExportError::Label { row: 2, .. }));
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let csv = "ID,Fecha,Texto,Previsión,Probabilidad\n\
                   AN-1,2024-05-01T10:00:00.000Z,\"x\",Positive,1.2000";
        let err = from_csv(csv).unwrap_err();
        assert!(matches!(err, ExportError::Record { row: 2, .. }));
    }

    #[test]
    fn rejects_short_rows_and_open_quotes() {
        let short = "ID,Fecha,Texto,Previsión,Probabilidad\nAN-1,2024-05-01T10:00:00.000Z";
        assert!(matches!(
            from_csv(short).unwrap_err(),
            ExportError::FieldCount { row: 2, found: 2 }
        ));

        let open = "ID,Fecha,Texto,Previsión,Probabilidad\nAN-1,2024,\"never closed";
        assert!(matches!(
            from_csv(open).unwrap_err(),
            ExportError::UnterminatedQuote { row: 2 }
        ));
    }
}
