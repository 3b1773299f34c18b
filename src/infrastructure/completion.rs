use crate::error::{InvokeError, Result};
use tokio::sync::oneshot;
use tracing::debug;

/// Creates a completion callback whose single invocation resolves `receiver`.
///
/// If the flow is dropped without completing, the callback is dropped with it
/// and [`wait`] reports [`InvokeError::Incomplete`].
pub fn channel<T: 'static>() -> (impl FnOnce(T) + 'static, oneshot::Receiver<T>) {
    let (sender, receiver) = oneshot::channel();
    let callback = move |value: T| {
        if sender.send(value).is_err() {
            debug!("completion receiver dropped before the flow completed");
        }
    };
    (callback, receiver)
}

/// Awaits the outcome delivered through a [`channel`] callback.
pub async fn wait<T>(receiver: oneshot::Receiver<T>) -> Result<T> {
    receiver.await.map_err(|_| InvokeError::Incomplete)
}
