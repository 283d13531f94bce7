use sentix_core::{RecordError, UnknownLabel};
use thiserror::Error;

/// Failure of a single classification call.
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("missing API credential: set {var}")]
    MissingCredential { var: &'static str },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("response violates the classification schema: {0}")]
    Schema(#[from] SchemaViolation),
    #[error("classification cancelled")]
    Cancelled,
}

/// A response that reached us but does not conform to the requested schema.
#[derive(Error, Debug)]
pub enum SchemaViolation {
    #[error("no candidate text in response (finish reason: {finish_reason:?})")]
    NoCandidates { finish_reason: Option<String> },
    #[error("malformed response envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error("malformed classification payload: {0}")]
    Payload(#[source] serde_json::Error),
    #[error(transparent)]
    Label(#[from] UnknownLabel),
    #[error(transparent)]
    Confidence(#[from] RecordError),
}

/// Coarse category of a [`ClassifyError`], used for logging and for deciding
/// what the user is told.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Not configured. Fatal; no request was sent.
    Configuration,
    /// Network failure, timeout, or non-2xx status.
    Transport,
    /// The service answered outside its contract.
    Schema,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Transport => "transport",
            Self::Schema => "schema_violation",
            Self::Cancelled => "cancelled",
        }
    }
}

impl ClassifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential { .. } => ErrorKind::Configuration,
            Self::Http(_) | Self::Server { .. } => ErrorKind::Transport,
            Self::Schema(_) => ErrorKind::Schema,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            ClassifyError::MissingCredential { var: "GEMINI_API_KEY" }.kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            ClassifyError::Server {
                status: 503,
                body: String::new()
            }
            .kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            ClassifyError::from(SchemaViolation::Label(UnknownLabel("Mixed".into()))).kind(),
            ErrorKind::Schema
        );
        assert_eq!(ErrorKind::Schema.as_str(), "schema_violation");
    }

    #[test]
    fn label_violation_message_names_value() {
        let err = ClassifyError::from(SchemaViolation::Label(UnknownLabel("Mixed".into())));
        assert!(err.to_string().contains("\"Mixed\""));
    }
}
