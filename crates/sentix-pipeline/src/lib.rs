//! Analysis orchestration: input validation, one classifier call per text,
//! record construction, and the session dispatcher that owns the history.

mod analyzer;
mod dispatcher;
mod error;
#[cfg(test)]
mod testing;

pub use analyzer::{AnalysisState, Analyzer, DEFAULT_MIN_CHARS};
pub use dispatcher::{Command, Dispatcher, Event, SessionHandle, Ticket, session};
pub use error::{AnalysisError, DispatchClosed, SERVICE_INTERRUPTED};
