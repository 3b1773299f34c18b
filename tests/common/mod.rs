#![allow(dead_code)]

use lambda_flow::{
    FlowContext, Handler, HandlerResult, HttpFlowContext, HttpHandler, JsonResponse,
    ResponseBuilder, WireResponse,
};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;

pub type HttpContext<'f, 'a> = HttpFlowContext<'f, 'a, Value, Value, JsonResponse>;

/// Callback that records every value it is invoked with.
pub fn recorder<T: 'static>() -> (impl FnOnce(T) + 'static, Rc<RefCell<Vec<T>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&calls);
    (move |value| sink.borrow_mut().push(value), calls)
}

/// Records the single wire response an HTTP flow produced.
pub fn single_response(calls: &Rc<RefCell<Vec<WireResponse>>>) -> WireResponse {
    let calls = calls.borrow();
    assert_eq!(calls.len(), 1, "expected exactly one callback invocation");
    calls[0].clone()
}

/// Increments the shared counter `v` and continues.
pub struct CountingHandler;

impl<Ev, Cx, R, E> Handler<Ev, Cx, R, E> for CountingHandler {
    fn handle(
        self: Box<Self>,
        _event: &Ev,
        _context: &Cx,
        flow: &mut FlowContext<'_, Ev, Cx, R, E>,
    ) -> HandlerResult<E> {
        *flow.state_mut().get_or_insert_with("v", || 0u32) += 1;
        flow.next();
        Ok(())
    }
}

/// Increments `v`, sets header `v<n>` to `true` and continues.
pub struct HeaderCountingHandler;

impl<Ev, Cx, B: ResponseBuilder, E> HttpHandler<Ev, Cx, B, E> for HeaderCountingHandler {
    fn handle(
        self,
        _event: &Ev,
        _context: &Cx,
        flow: &mut HttpFlowContext<'_, '_, Ev, Cx, B, E>,
    ) -> HandlerResult<E> {
        let v = flow.state_mut().get_or_insert_with("v", || 0u32);
        *v += 1;
        let name = format!("v{}", v);
        flow.response().header(name, true);
        flow.next();
        Ok(())
    }
}
