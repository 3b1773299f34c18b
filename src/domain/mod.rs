//! Domain types shared by the flow engines: the invocation state container,
//! the HTTP wire response and the response-builder port.

pub mod ports;
pub mod response;
pub mod state;
