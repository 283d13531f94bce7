use std::sync::Arc;

use async_trait::async_trait;
use sentix_core::Classification;
use tokio_util::sync::CancellationToken;

use crate::ClassifyError;

/// A sentiment classifier reached over one request/response exchange.
///
/// Implementations perform exactly one outbound call per `classify`, with no
/// caching and no retry. Cancelling `cancel` must abandon the call promptly
/// with [`ClassifyError::Cancelled`].
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Classification, ClassifyError>;

    /// Model or backend name, for logs.
    fn name(&self) -> &str;
}

#[async_trait]
impl<C: Classifier + ?Sized> Classifier for Arc<C> {
    async fn classify(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Classification, ClassifyError> {
        (**self).classify(text, cancel).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
