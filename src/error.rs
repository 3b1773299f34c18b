use thiserror::Error;

/// Default error type a handler may return or pass to `fail`.
pub type Fault = Box<dyn std::error::Error + Send + Sync>;

/// Reason a handler chain terminated without success.
#[derive(Error, Debug, PartialEq)]
pub enum FlowError<E> {
    /// `next` was called with no handler left in the queue.
    #[error("End of handlers: no handler completed the chain")]
    EndOfHandlers,
    /// A handler called `fail` or returned an error.
    #[error("{0}")]
    Handler(E),
    /// A handler panicked; holds the panic message.
    #[error("Handler panicked: {0}")]
    Panicked(String),
}

impl<E> FlowError<E> {
    /// Returns the handler-supplied error, if this failure carries one.
    pub fn handler_error(&self) -> Option<&E> {
        match self {
            FlowError::Handler(error) => Some(error),
            _ => None,
        }
    }
}

/// Errors raised by the invoke harness while hosting a flow.
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Flow ended without invoking its completion callback")]
    Incomplete,
}

pub type Result<T> = std::result::Result<T, InvokeError>;
