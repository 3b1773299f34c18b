use crate::domain::ports::ResponseBuilder;
use crate::domain::response::WireResponse;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Response builder rendering structured bodies as JSON text.
///
/// String bodies pass through untouched, a missing body renders as the empty
/// string, anything else is serialized with `serde_json`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    status_code: u16,
    headers: BTreeMap<String, Value>,
    body: Value,
}

impl Default for JsonResponse {
    fn default() -> Self {
        Self {
            status_code: 200,
            headers: BTreeMap::new(),
            body: Value::Null,
        }
    }
}

impl JsonResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the body from any serializable value.
    pub fn json_body<T: Serialize>(&mut self, payload: &T) -> serde_json::Result<&mut Self> {
        self.body = serde_json::to_value(payload)?;
        Ok(self)
    }

    pub fn headers(&self) -> &BTreeMap<String, Value> {
        &self.headers
    }

    pub fn body_value(&self) -> &Value {
        &self.body
    }
}

impl ResponseBuilder for JsonResponse {
    fn status(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self
    }

    fn header(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    fn body(&mut self, payload: impl Into<Value>) -> &mut Self {
        self.body = payload.into();
        self
    }

    fn status_code(&self) -> u16 {
        self.status_code
    }

    fn to_wire_format(&self) -> WireResponse {
        let body = match &self.body {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            structured => structured.to_string(),
        };
        WireResponse {
            status_code: self.status_code,
            headers: self.headers.clone(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let wire = JsonResponse::new().to_wire_format();
        assert_eq!(wire.status_code, 200);
        assert!(wire.headers.is_empty());
        assert_eq!(wire.body, "");
    }

    #[test]
    fn test_last_header_write_wins() {
        let mut response = JsonResponse::new();
        response.header("x-trace", "a").header("x-trace", "b");

        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.to_wire_format().headers["x-trace"], "b");
    }

    #[test]
    fn test_structured_body_is_json_text() {
        let mut response = JsonResponse::new();
        response.status(301).body(json!({ "message": "Moved permanently" }));

        let wire = response.to_wire_format();
        assert_eq!(wire.status_code, 301);
        assert_eq!(wire.body, r#"{"message":"Moved permanently"}"#);
    }

    #[test]
    fn test_string_body_passes_through() {
        let mut response = JsonResponse::new();
        response.body("plain text");
        assert_eq!(response.to_wire_format().body, "plain text");
    }

    #[test]
    fn test_json_body_from_struct() {
        #[derive(Serialize)]
        struct Counter {
            v: u32,
        }

        let mut response = JsonResponse::new();
        response.json_body(&Counter { v: 3 }).unwrap();
        assert_eq!(response.body_value(), &json!({ "v": 3 }));
    }
}
