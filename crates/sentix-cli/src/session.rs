//! Interactive session: stdin lines become submissions to a running dispatcher.

use std::path::PathBuf;

use anyhow::{Context, Result};
use sentix_ai::Classifier;
use sentix_core::{HistoryQuery, SentimentLabel, to_csv};
use sentix_pipeline::{Analyzer, Event, session};
use sentix_store::HistoryStore;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use crate::display;

const HELP: &str = "\
Type feedback text and press enter to analyse it.
  :stats                 summary and distribution
  :log [label] [term]    history, optionally filtered
  :export <path>         write the history as CSV
  :cancel                abandon analyses in flight
  :help                  this message
  :quit                  leave the session";

#[derive(Debug, PartialEq)]
enum Input {
    Submit(String),
    Stats,
    Log(HistoryQuery),
    Export(PathBuf),
    Cancel,
    Help,
    Quit,
    Blank,
    Unknown(String),
}

fn parse_line(line: &str) -> Input {
    let line = line.trim();
    let Some(rest) = line.strip_prefix(':') else {
        return if line.is_empty() {
            Input::Blank
        } else {
            Input::Submit(line.to_string())
        };
    };

    let mut words = rest.split_whitespace();
    match words.next().unwrap_or_default() {
        "stats" => Input::Stats,
        "log" => {
            let mut args: Vec<&str> = words.collect();
            let label = args.first().and_then(|w| w.parse::<SentimentLabel>().ok());
            if label.is_some() {
                args.remove(0);
            }
            Input::Log(
                HistoryQuery::new()
                    .with_label(label)
                    .with_term(args.join(" ")),
            )
        }
        "export" => match words.next() {
            Some(path) => Input::Export(PathBuf::from(path)),
            None => Input::Unknown(line.to_string()),
        },
        "cancel" => Input::Cancel,
        "help" => Input::Help,
        "quit" | "q" => Input::Quit,
        _ => Input::Unknown(line.to_string()),
    }
}

/// Drive a session from `input` until `:quit` or end of input.
///
/// Analyses still in flight at that point are allowed to finish; their
/// records are in the returned history.
pub async fn run<C, R>(
    analyzer: Analyzer<C>,
    store: HistoryStore,
    input: R,
) -> Result<HistoryStore>
where
    C: Classifier + 'static,
    R: AsyncBufRead + Unpin,
{
    let (dispatcher, handle) = session(analyzer, store);
    let dispatcher = tokio::spawn(dispatcher.run());
    let printer = tokio::spawn(print_events(handle.subscribe()));

    println!("{HELP}");
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("reading input")? {
        match parse_line(&line) {
            Input::Submit(text) => handle.submit(text).await?,
            Input::Stats => {
                let stats = handle.history().stats();
                display::print_stats(&stats);
                display::print_distribution(&stats);
            }
            Input::Log(query) => {
                let history = handle.history();
                display::print_log(&history.search(&query));
            }
            Input::Export(path) => {
                let history = handle.history();
                tokio::fs::write(&path, to_csv(history.records()))
                    .await
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Exported {} records to {}", history.len(), path.display());
            }
            Input::Cancel => handle.cancel().await?,
            Input::Help => println!("{HELP}"),
            Input::Quit => break,
            Input::Blank => {}
            Input::Unknown(cmd) => eprintln!("Unknown command {cmd:?}. Type :help."),
        }
    }

    handle.close().await?;
    drop(handle);
    let store = dispatcher.await.context("session dispatcher panicked")?;
    printer.await.context("event printer panicked")?;
    Ok(store)
}

/// Print events until every sender is gone.
async fn print_events(mut events: broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(Event::Started { ticket }) => println!("[#{ticket}] analysing..."),
            Ok(Event::RecordAdded { ticket, record }) => {
                println!("[#{ticket}] done");
                display::print_record_card(&record);
            }
            Ok(Event::Rejected { message }) => eprintln!("{message}"),
            Ok(Event::Failed { ticket, message }) => eprintln!("[#{ticket}] {message}"),
            Ok(Event::Cancelled { ticket }) => println!("[#{ticket}] cancelled"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "event printer fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}
