//! Terminal rendering for classification records and history views.
//!
//! Cards for single results, a summary block for aggregate stats, a bar chart
//! for the label distribution, and a fixed-width table for the history log.

use chrono::Local;
use sentix_core::{AggregateStats, ClassificationRecord, SentimentLabel};

const BAR_WIDTH: usize = 30;
const LOG_TEXT_WIDTH: usize = 48;

// ── Public API ──

/// Print one analysis result as a vertical card.
pub fn print_record_card(record: &ClassificationRecord) {
    println!("=== {} ===", record.id());
    println!("  {:<12} {}", "sentiment", record.label());
    println!("  {:<12} {}", "confidence", percent(record.confidence()));
    println!("  {:<12} {}", "analysed", local_time(record));
    if let Some(terms) = record.key_terms() {
        println!("  {:<12} {}", "key terms", terms.join(", "));
    }
    println!("  {:<12} {}", "text", record.text());
}

/// Print the aggregate summary: total, per-label counts, mean confidence.
pub fn print_stats(stats: &AggregateStats) {
    println!("Summary");
    println!("  {:<20} {}", "total analyses", stats.total);
    for label in SentimentLabel::ALL {
        println!(
            "  {:<20} {:>4}  ({:.1}%)",
            label.as_str(),
            stats.count(label),
            stats.share(label)
        );
    }
    println!(
        "  {:<20} {}",
        "average confidence",
        percent(stats.average_confidence)
    );
}

/// Horizontal bar per label, omitting labels with no records.
pub fn print_distribution(stats: &AggregateStats) {
    println!("Distribution");
    let rows = stats.distribution();
    if rows.is_empty() {
        println!("  (no data)");
        return;
    }
    for (label, n) in rows {
        println!(
            "  {:<9} {:<width$} {n}",
            label.as_str(),
            bar(stats.share(label), BAR_WIDTH),
            width = BAR_WIDTH
        );
    }
}

/// Confidence of each record in `records`, in the order given. The dashboard
/// passes the tail of the history, which holds its oldest entries.
pub fn print_trend(records: &[&ClassificationRecord]) {
    println!("{}", trend_heading(records.len()));
    if records.is_empty() {
        println!("  (no data)");
        return;
    }
    for record in records {
        println!(
            "  {:<9} {:<width$} {}",
            record.label().as_str(),
            bar(record.confidence() * 100.0, BAR_WIDTH),
            percent(record.confidence()),
            width = BAR_WIDTH
        );
    }
}

/// Tabular history log, most recent first.
pub fn print_log(records: &[&ClassificationRecord]) {
    if records.is_empty() {
        println!("No matching records.");
        return;
    }
    println!(
        "{:<10} {:<16} {:<9} {:>6}  {}",
        "ID", "TIME", "LABEL", "CONF", "TEXT"
    );
    for record in records {
        println!(
            "{:<10} {:<16} {:<9} {:>6}  {}",
            short_id(record.id()),
            local_time(record),
            record.label().as_str(),
            percent(record.confidence()),
            truncate(record.text(), LOG_TEXT_WIDTH)
        );
    }
    println!("({} records)", records.len());
}

// ── Formatting helpers ──

fn trend_heading(n: usize) -> String {
    format!("Confidence trend (oldest {n} in history)")
}

fn percent(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

fn local_time(record: &ClassificationRecord) -> String {
    record
        .created_at()
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Bar of `#` proportional to `share` (a percentage) out of `width` cells.
fn bar(share: f64, width: usize) -> String {
    let filled = ((share.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    "#".repeat(filled)
}

/// First characters of the id, enough to tell records apart in a table.
fn short_id(id: &str) -> &str {
    match id.char_indices().nth(10) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

fn truncate(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
    format!("{cut}…")
}
