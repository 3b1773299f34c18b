use super::response::WireResponse;
use serde_json::Value;

/// Accumulates an HTTP response and renders it to its wire format.
///
/// A fresh builder (from `Default`) carries status 200, no headers and no body.
/// Header names are unique; setting a name twice keeps the last value.
pub trait ResponseBuilder: Default {
    fn status(&mut self, code: u16) -> &mut Self;
    fn header(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self;
    fn body(&mut self, payload: impl Into<Value>) -> &mut Self;
    fn status_code(&self) -> u16;
    fn to_wire_format(&self) -> WireResponse;
}
