use sentix_ai::{ClassifyError, ErrorKind};
use sentix_store::StoreError;
use thiserror::Error;

/// Shown to the user for every transport or schema failure. The underlying
/// error is logged, not displayed.
pub const SERVICE_INTERRUPTED: &str = "Inference service interrupted. Check your connection.";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("input has {actual} characters, at least {min_chars} required")]
    Validation { min_chars: usize, actual: usize },
    #[error("classifier not configured: {0}")]
    Configuration(#[source] ClassifyError),
    #[error("classification failed: {0}")]
    Service(#[source] ClassifyError),
    #[error("analysis cancelled")]
    Cancelled,
    #[error("history update failed: {0}")]
    Store(#[from] StoreError),
}

impl AnalysisError {
    /// Sort a classifier failure into the workflow taxonomy.
    pub fn from_classify(err: ClassifyError) -> Self {
        match err.kind() {
            ErrorKind::Configuration => Self::Configuration(err),
            ErrorKind::Transport | ErrorKind::Schema => Self::Service(err),
            ErrorKind::Cancelled => Self::Cancelled,
        }
    }

    /// The message a user sees for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { min_chars, .. } => {
                format!("Insufficient content: at least {min_chars} characters are required.")
            }
            Self::Configuration(err) => {
                format!("The classification service is not configured ({err}).")
            }
            Self::Service(_) | Self::Store(_) => SERVICE_INTERRUPTED.to_string(),
            Self::Cancelled => "Analysis cancelled.".to_string(),
        }
    }
}

/// The dispatcher behind a [`SessionHandle`](crate::SessionHandle) is gone.
#[derive(Debug, Error)]
#[error("session dispatcher has stopped")]
pub struct DispatchClosed;

#[cfg(test)]
mod tests {
    use super::*;
    use sentix_ai::SchemaViolation;
    use sentix_core::UnknownLabel;

    #[test]
    fn service_failures_share_one_message() {
        let transport = AnalysisError::from_classify(ClassifyError::Server {
            status: 500,
            body: "internal".into(),
        });
        let schema = AnalysisError::from_classify(ClassifyError::Schema(SchemaViolation::Label(
            UnknownLabel("Mixed".into()),
        )));
        assert_eq!(transport.user_message(), SERVICE_INTERRUPTED);
        assert_eq!(schema.user_message(), SERVICE_INTERRUPTED);
        assert!(!schema.user_message().contains("Mixed"));
    }

    #[test]
    fn configuration_is_distinct() {
        let err = AnalysisError::from_classify(ClassifyError::MissingCredential {
            var: "GEMINI_API_KEY",
        });
        assert!(matches!(err, AnalysisError::Configuration(_)));
        assert!(err.user_message().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn validation_message_names_minimum() {
        let err = AnalysisError::Validation {
            min_chars: 5,
            actual: 2,
        };
        assert_eq!(
            err.user_message(),
            "Insufficient content: at least 5 characters are required."
        );
    }
}
