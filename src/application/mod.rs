//! Application layer containing the handler-chaining engines.
//!
//! [`flow::FlowEngine`] drives an ordered chain of handlers over one event and
//! reports a single outcome. [`http_flow::HttpFlowEngine`] wraps it with a
//! response builder and always answers with a wire-format HTTP response.

pub mod flow;
pub mod http_flow;
