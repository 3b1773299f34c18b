use super::flow::{FlowContext, FlowEngine, FlowStatus, Handler, HandlerResult};
use crate::domain::ports::ResponseBuilder;
use crate::domain::response::WireResponse;
use crate::domain::state::SharedState;
use crate::error::{Fault, FlowError};
use serde_json::json;
use std::cell::{Ref, RefCell};
use std::fmt::Display;
use std::rc::Rc;
use tracing::{debug, warn};

/// Status forced onto the response when a chain ends in an unexpected fault.
pub const FAULT_STATUS: u16 = 500;

/// One step of an HTTP handler chain. Any
/// `FnOnce(&Ev, &Cx, &mut HttpFlowContext)` closure is an HTTP handler.
pub trait HttpHandler<Ev, Cx, B, E = Fault> {
    fn handle(
        self,
        event: &Ev,
        context: &Cx,
        flow: &mut HttpFlowContext<'_, '_, Ev, Cx, B, E>,
    ) -> HandlerResult<E>;
}

impl<F, Ev, Cx, B, E> HttpHandler<Ev, Cx, B, E> for F
where
    F: FnOnce(&Ev, &Cx, &mut HttpFlowContext<'_, '_, Ev, Cx, B, E>) -> HandlerResult<E>,
{
    fn handle(
        self,
        event: &Ev,
        context: &Cx,
        flow: &mut HttpFlowContext<'_, '_, Ev, Cx, B, E>,
    ) -> HandlerResult<E> {
        self(event, context, flow)
    }
}

/// Flow context of the HTTP engine: the generic controls plus the response
/// builder of the invocation.
///
/// `fail(None)` ends the chain with the response as configured so far;
/// `fail(Some(error))` is treated as an unexpected fault and answered with a
/// 500.
pub struct HttpFlowContext<'f, 'a, Ev, Cx, B, E = Fault> {
    flow: &'f mut FlowContext<'a, Ev, Cx, (), Option<E>>,
    response: &'f mut B,
    builder: &'f Rc<RefCell<B>>,
}

impl<Ev, Cx, B, E> HttpFlowContext<'_, '_, Ev, Cx, B, E> {
    pub fn response(&mut self) -> &mut B {
        self.response
    }

    pub fn next(&mut self) {
        self.flow.next();
    }

    /// Terminates the chain; the callback receives the current response.
    pub fn succeed(&mut self) {
        self.flow.succeed(());
    }

    pub fn fail(&mut self, error: Option<E>) {
        self.flow.fail(error);
    }

    pub fn state(&self) -> &SharedState {
        self.flow.state()
    }

    pub fn state_mut(&mut self) -> &mut SharedState {
        self.flow.state_mut()
    }

    pub fn status(&self) -> FlowStatus {
        self.flow.status()
    }

    pub fn is_terminated(&self) -> bool {
        self.flow.is_terminated()
    }
}

impl<Ev, Cx, B, E> HttpFlowContext<'_, '_, Ev, Cx, B, E>
where
    Ev: 'static,
    Cx: 'static,
    B: ResponseBuilder + 'static,
    E: 'static,
{
    /// Enqueues a follow-up handler at the tail of the chain.
    pub fn add<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnOnce(&Ev, &Cx, &mut HttpFlowContext<'_, '_, Ev, Cx, B, E>) -> HandlerResult<E>
            + 'static,
    {
        self.add_handler(handler)
    }

    pub fn add_handler<H>(&mut self, handler: H) -> &mut Self
    where
        H: HttpHandler<Ev, Cx, B, E> + 'static,
    {
        self.flow.add_handler(Bound {
            handler,
            builder: Rc::clone(self.builder),
        });
        self
    }
}

/// An HTTP handler bound to the response builder of its invocation, so it can
/// run as a step of the underlying generic flow.
struct Bound<H, B> {
    handler: H,
    builder: Rc<RefCell<B>>,
}

impl<H, Ev, Cx, B, E> Handler<Ev, Cx, (), Option<E>> for Bound<H, B>
where
    H: HttpHandler<Ev, Cx, B, E>,
{
    fn handle(
        self: Box<Self>,
        event: &Ev,
        context: &Cx,
        flow: &mut FlowContext<'_, Ev, Cx, (), Option<E>>,
    ) -> HandlerResult<Option<E>> {
        let Bound { handler, builder } = *self;
        let mut response = builder.borrow_mut();
        let mut http = HttpFlowContext {
            flow,
            response: &mut *response,
            builder: &builder,
        };
        handler.handle(event, context, &mut http).map_err(Some)
    }
}

/// HTTP specialization of [`FlowEngine`].
///
/// Wraps a generic engine and a single response builder. Its callback always
/// receives a [`WireResponse`], on success and on failure alike.
pub struct HttpFlowEngine<Ev, Cx, B, E = Fault> {
    flow: FlowEngine<Ev, Cx, (), Option<E>>,
    builder: Rc<RefCell<B>>,
}

impl<Ev, Cx, B, E> HttpFlowEngine<Ev, Cx, B, E>
where
    Ev: 'static,
    Cx: 'static,
    B: ResponseBuilder + 'static,
    E: Display + 'static,
{
    pub fn new(event: Ev, context: Cx, callback: impl FnOnce(WireResponse) + 'static) -> Self {
        let builder = Rc::new(RefCell::new(B::default()));
        let shared = Rc::clone(&builder);
        let flow = FlowEngine::new(event, context, move |outcome| {
            let wire = {
                let mut response = shared.borrow_mut();
                apply_outcome(&mut *response, outcome);
                response.to_wire_format()
            };
            debug!(status_code = wire.status_code, "http flow completed");
            callback(wire);
        });
        Self { flow, builder }
    }

    pub fn add<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnOnce(&Ev, &Cx, &mut HttpFlowContext<'_, '_, Ev, Cx, B, E>) -> HandlerResult<E>
            + 'static,
    {
        self.add_handler(handler)
    }

    pub fn add_handler<H>(&mut self, handler: H) -> &mut Self
    where
        H: HttpHandler<Ev, Cx, B, E> + 'static,
    {
        self.flow.add_handler(Bound {
            handler,
            builder: Rc::clone(&self.builder),
        });
        self
    }

    pub fn execute(&mut self) -> FlowStatus {
        self.flow.execute()
    }

    pub fn next(&mut self) -> FlowStatus {
        self.flow.next()
    }

    pub fn status(&self) -> FlowStatus {
        self.flow.status()
    }

    /// Current state of the response builder.
    pub fn response(&self) -> Ref<'_, B> {
        self.builder.borrow()
    }

    pub fn pending(&self) -> usize {
        self.flow.pending()
    }

    pub fn ignored_calls(&self) -> usize {
        self.flow.ignored_calls()
    }
}

/// Folds the outcome of the generic flow into the response.
///
/// `fail(None)` keeps the handler-built response; every other failure is an
/// unexpected fault and overwrites status and body.
fn apply_outcome<B, E>(response: &mut B, outcome: std::result::Result<(), FlowError<Option<E>>>)
where
    B: ResponseBuilder,
    E: Display,
{
    let message = match outcome {
        Ok(()) | Err(FlowError::Handler(None)) => return,
        Err(FlowError::Handler(Some(error))) => error.to_string(),
        Err(FlowError::Panicked(message)) => message,
        Err(FlowError::EndOfHandlers) => FlowError::<E>::EndOfHandlers.to_string(),
    };
    warn!(%message, "http flow faulted; responding with {}", FAULT_STATUS);
    response
        .status(FAULT_STATUS)
        .body(json!({ "message": message }));
}
