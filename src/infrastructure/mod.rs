//! Concrete adapters: the JSON response builder and the bridge from completion
//! callbacks to `tokio` oneshot channels.

pub mod completion;
pub mod json_response;
