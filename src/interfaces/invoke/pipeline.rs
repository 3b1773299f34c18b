//! Sample HTTP handler chain hosted by the `lambda-flow` binary.
//!
//! 1. `request_id` copies `awsRequestId` from the context into `x-request-id`.
//! 2. [`RequireHeader`] answers 401 when the event lacks the configured header.
//! 3. `parse_body` decodes the JSON request body into shared state.
//! 4. `echo` answers with the path, method and decoded payload.

use crate::application::flow::HandlerResult;
use crate::application::http_flow::{HttpFlowContext, HttpFlowEngine, HttpHandler};
use crate::domain::ports::ResponseBuilder;
use crate::domain::response::WireResponse;
use crate::error::Fault;
use crate::infrastructure::json_response::JsonResponse;
use serde_json::{Value, json};
use tracing::debug;

pub type InvokeFlow = HttpFlowEngine<Value, Value, JsonResponse, Fault>;

type InvokeContext<'f, 'a> = HttpFlowContext<'f, 'a, Value, Value, JsonResponse, Fault>;

/// Shared-state key holding the decoded request body.
pub const PAYLOAD_KEY: &str = "payload";

/// Builds the sample chain over `event` and `context`.
pub fn build(
    event: Value,
    context: Value,
    auth_header: &str,
    callback: impl FnOnce(WireResponse) + 'static,
) -> InvokeFlow {
    let mut flow = InvokeFlow::new(event, context, callback);
    flow.add(request_id)
        .add_handler(RequireHeader::new(auth_header))
        .add(parse_body)
        .add(echo);
    flow
}

fn request_id(_event: &Value, context: &Value, flow: &mut InvokeContext<'_, '_>) -> HandlerResult {
    if let Some(id) = context.get("awsRequestId").and_then(Value::as_str) {
        flow.response().header("x-request-id", id);
    }
    flow.next();
    Ok(())
}

/// Rejects events that do not carry a header, matched case-insensitively.
#[derive(Debug, Clone)]
pub struct RequireHeader {
    name: String,
}

impl RequireHeader {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl HttpHandler<Value, Value, JsonResponse> for RequireHeader {
    fn handle(
        self,
        event: &Value,
        _context: &Value,
        flow: &mut InvokeContext<'_, '_>,
    ) -> HandlerResult {
        let present = event
            .get("headers")
            .and_then(Value::as_object)
            .is_some_and(|headers| headers.keys().any(|key| key.eq_ignore_ascii_case(&self.name)));

        if present {
            flow.next();
        } else {
            debug!(header = %self.name, "required header missing");
            flow.response()
                .status(401)
                .body(json!({ "message": "Authorization failure" }));
            flow.fail(None);
        }
        Ok(())
    }
}

fn parse_body(event: &Value, _context: &Value, flow: &mut InvokeContext<'_, '_>) -> HandlerResult {
    let payload = match event.get("body") {
        Some(Value::String(text)) if !text.is_empty() => serde_json::from_str(text)?,
        Some(Value::String(_)) | Some(Value::Null) | None => Value::Null,
        Some(structured) => structured.clone(),
    };
    flow.state_mut().insert(PAYLOAD_KEY, payload);
    flow.next();
    Ok(())
}

fn echo(event: &Value, _context: &Value, flow: &mut InvokeContext<'_, '_>) -> HandlerResult {
    let payload = flow
        .state()
        .get::<Value>(PAYLOAD_KEY)
        .cloned()
        .unwrap_or(Value::Null);
    flow.response().body(json!({
        "path": event.get("path"),
        "method": event.get("httpMethod"),
        "payload": payload,
    }));
    flow.succeed();
    Ok(())
}
