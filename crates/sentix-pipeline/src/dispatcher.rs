//! Session dispatcher: owns the history and serialises every write to it.
//!
//! Front-ends talk to a running [`Dispatcher`] through a cloneable
//! [`SessionHandle`]: commands go in over an mpsc channel, outcomes come back
//! as broadcast [`Event`]s, and readers watch the latest [`HistorySnapshot`].
//! Analyses run concurrently; each result is prepended as it completes, so the
//! last one to finish ends up first in the history.

use std::sync::Arc;

use sentix_ai::Classifier;
use sentix_core::ClassificationRecord;
use sentix_store::{HistorySnapshot, HistoryStore};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::analyzer::{AnalysisState, Analyzer};
use crate::error::{AnalysisError, DispatchClosed};

const COMMAND_CAPACITY: usize = 32;
const CLOSING: &str = "The session is closing; no new analyses are accepted.";
const EVENT_CAPACITY: usize = 64;

/// Identifies one accepted submission within a session.
pub type Ticket = u64;

#[derive(Debug)]
pub enum Command {
    Submit { text: String },
    /// Cancel every analysis currently in flight. Later submissions are unaffected.
    Cancel,
    /// Stop accepting submissions and return once in-flight analyses finish.
    Close,
    /// Cancel in-flight analyses and return immediately.
    Shutdown,
}

#[derive(Debug, Clone)]
pub enum Event {
    /// The text failed validation; nothing was sent to the classifier.
    Rejected { message: String },
    Started { ticket: Ticket },
    RecordAdded {
        ticket: Ticket,
        record: ClassificationRecord,
    },
    Failed { ticket: Ticket, message: String },
    Cancelled { ticket: Ticket },
}

type Outcome = (Ticket, Result<ClassificationRecord, AnalysisError>);

/// Create a dispatcher over `store` and a handle to drive it.
///
/// The dispatcher does nothing until [`Dispatcher::run`] is awaited or spawned.
pub fn session<C>(analyzer: Analyzer<C>, store: HistoryStore) -> (Dispatcher<C>, SessionHandle)
where
    C: Classifier + 'static,
{
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    let (history_tx, history_rx) = watch::channel(store.snapshot());
    let state = analyzer.subscribe_state();

    let dispatcher = Dispatcher {
        analyzer: Arc::new(analyzer),
        store,
        commands: commands_rx,
        events: events.clone(),
        history: history_tx,
        cancel: CancellationToken::new(),
        next_ticket: 1,
    };
    let handle = SessionHandle {
        commands: commands_tx,
        events,
        history: history_rx,
        state,
    };
    (dispatcher, handle)
}

pub struct Dispatcher<C> {
    analyzer: Arc<Analyzer<C>>,
    store: HistoryStore,
    commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<Event>,
    history: watch::Sender<HistorySnapshot>,
    cancel: CancellationToken,
    next_ticket: Ticket,
}

impl<C: Classifier + 'static> Dispatcher<C> {
    /// Process commands until the session is closed and drained, shut down,
    /// or every handle is dropped.
    ///
    /// After `Close`, in-flight analyses run to completion (`Cancel` still
    /// applies). After `Shutdown` or the last handle going away, they are
    /// cancelled. Returns the final history.
    pub async fn run(mut self) -> HistoryStore {
        let mut in_flight: JoinSet<Outcome> = JoinSet::new();
        let mut closing = false;
        info!(records = self.store.len(), "session started");

        loop {
            if closing && in_flight.is_empty() {
                break;
            }
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Submit { .. }) if closing => {
                        self.emit(Event::Rejected { message: CLOSING.to_string() });
                    }
                    Some(Command::Submit { text }) => self.start(text, &mut in_flight),
                    Some(Command::Cancel) => {
                        info!(in_flight = in_flight.len(), "cancelling in-flight analyses");
                        self.cancel.cancel();
                        self.cancel = CancellationToken::new();
                    }
                    Some(Command::Close) => {
                        info!(in_flight = in_flight.len(), "session closing");
                        closing = true;
                    }
                    Some(Command::Shutdown) | None => break,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    self.finish(joined);
                }
            }
        }

        self.cancel.cancel();
        while let Some(joined) = in_flight.join_next().await {
            self.finish(joined);
        }
        info!(records = self.store.len(), "session stopped");
        self.store
    }

    fn start(&mut self, text: String, in_flight: &mut JoinSet<Outcome>) {
        if let Err(err) = self.analyzer.validate(&text) {
            self.emit(Event::Rejected {
                message: err.user_message(),
            });
            return;
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let analyzer = Arc::clone(&self.analyzer);
        let cancel = self.cancel.child_token();
        in_flight.spawn(async move {
            let result = analyzer.analyze(&text, &cancel).await;
            (ticket, result)
        });
        debug!(ticket, "analysis started");
        self.emit(Event::Started { ticket });
    }

    fn finish(&mut self, joined: Result<Outcome, JoinError>) {
        let (ticket, result) = match joined {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "analysis task aborted");
                return;
            }
        };

        let record = match result {
            Ok(record) => record,
            Err(AnalysisError::Cancelled) => {
                self.emit(Event::Cancelled { ticket });
                return;
            }
            Err(err) => {
                self.emit(Event::Failed {
                    ticket,
                    message: err.user_message(),
                });
                return;
            }
        };

        if let Err(err) = self.store.prepend(record.clone()) {
            error!(ticket, error = %err, "could not add record to history");
            self.emit(Event::Failed {
                ticket,
                message: AnalysisError::from(err).user_message(),
            });
            return;
        }
        self.history.send_replace(self.store.snapshot());
        self.emit(Event::RecordAdded { ticket, record });
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine; the history watch still carries the state.
        let _ = self.events.send(event);
    }
}

/// Cloneable front-end handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
    history: watch::Receiver<HistorySnapshot>,
    state: watch::Receiver<AnalysisState>,
}

impl SessionHandle {
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), DispatchClosed> {
        self.send(Command::Submit { text: text.into() }).await
    }

    pub async fn cancel(&self) -> Result<(), DispatchClosed> {
        self.send(Command::Cancel).await
    }

    /// Let in-flight analyses finish, then stop the dispatcher.
    pub async fn close(&self) -> Result<(), DispatchClosed> {
        self.send(Command::Close).await
    }

    pub async fn shutdown(&self) -> Result<(), DispatchClosed> {
        self.send(Command::Shutdown).await
    }

    async fn send(&self, command: Command) -> Result<(), DispatchClosed> {
        self.commands.send(command).await.map_err(|_| DispatchClosed)
    }

    /// Events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// The history as of the last completed analysis.
    pub fn history(&self) -> HistorySnapshot {
        self.history.borrow().clone()
    }

    pub fn history_updates(&self) -> watch::Receiver<HistorySnapshot> {
        self.history.clone()
    }

    pub fn analysis_state(&self) -> AnalysisState {
        *self.state.borrow()
    }
}
