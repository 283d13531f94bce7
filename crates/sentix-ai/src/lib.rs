//! Classification client: one structured-output request to a hosted language
//! model per text, validated into a [`Classification`](sentix_core::Classification).

mod classifier;
pub mod config;
mod error;
pub mod gemini;

pub use classifier::Classifier;
pub use config::ClientConfig;
pub use error::{ClassifyError, ErrorKind, SchemaViolation};
pub use gemini::GeminiClient;
