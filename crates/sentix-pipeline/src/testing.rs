//! Scripted classifier for orchestrator and dispatcher tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use sentix_ai::gemini::parse_payload;
use sentix_ai::{Classifier, ClassifyError};
use sentix_core::Classification;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub enum Reply {
    /// Raw structured payload, validated the same way the Gemini client does.
    Payload(&'static str),
    Server(u16),
    Unconfigured,
}

impl Reply {
    fn into_result(self) -> Result<Classification, ClassifyError> {
        match self {
            Self::Payload(json) => Ok(parse_payload(json)?),
            Self::Server(status) => Err(ClassifyError::Server {
                status,
                body: "scripted failure".into(),
            }),
            Self::Unconfigured => Err(ClassifyError::MissingCredential {
                var: "GEMINI_API_KEY",
            }),
        }
    }
}

pub const POSITIVE: &str =
    r#"{"label":"Positive","confidence":0.97,"key_terms":["excellent","service","fast"]}"#;

pub struct ScriptedClassifier {
    default: (Duration, Reply),
    by_text: HashMap<String, (Duration, Reply)>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedClassifier {
    pub fn replying(reply: Reply) -> Self {
        Self {
            default: (Duration::ZERO, reply),
            by_text: HashMap::new(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default.0 = delay;
        self
    }

    /// Reply differently for one exact text.
    pub fn on(mut self, text: &str, delay: Duration, reply: Reply) -> Self {
        self.by_text.insert(text.to_string(), (delay, reply));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Classification, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(text.to_string());
        let (delay, reply) = self
            .by_text
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.default.clone());

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClassifyError::Cancelled),
            _ = tokio::time::sleep(delay) => reply.into_result(),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
