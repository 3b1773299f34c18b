use crate::domain::state::SharedState;
use crate::error::{Fault, FlowError};
use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, warn};

/// Value a handler returns; `Err` is routed to `fail` by the engine.
pub type HandlerResult<E = Fault> = std::result::Result<(), E>;

/// Callback receiving the single outcome of an invocation.
pub type Completion<R, E> = Box<dyn FnOnce(std::result::Result<R, FlowError<E>>)>;

type BoxedHandler<Ev, Cx, R, E> = Box<dyn Handler<Ev, Cx, R, E>>;

/// One step of a handler chain.
///
/// A handler must call exactly one of [`FlowContext::next`],
/// [`FlowContext::succeed`] or [`FlowContext::fail`]. Returning `Err` fails
/// the chain with that error. Any `FnOnce(&Ev, &Cx, &mut FlowContext)`
/// closure is a handler.
pub trait Handler<Ev, Cx, R, E = Fault> {
    fn handle(
        self: Box<Self>,
        event: &Ev,
        context: &Cx,
        flow: &mut FlowContext<'_, Ev, Cx, R, E>,
    ) -> HandlerResult<E>;
}

impl<F, Ev, Cx, R, E> Handler<Ev, Cx, R, E> for F
where
    F: FnOnce(&Ev, &Cx, &mut FlowContext<'_, Ev, Cx, R, E>) -> HandlerResult<E>,
{
    fn handle(
        self: Box<Self>,
        event: &Ev,
        context: &Cx,
        flow: &mut FlowContext<'_, Ev, Cx, R, E>,
    ) -> HandlerResult<E> {
        (*self)(event, context, flow)
    }
}

/// Lifecycle of a single invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStatus {
    /// Constructed, `execute` not called yet.
    Idle,
    /// At least one handler dispatched and no terminal call made.
    Running,
    Succeeded,
    Failed,
}

impl FlowStatus {
    pub fn is_terminated(self) -> bool {
        matches!(self, FlowStatus::Succeeded | FlowStatus::Failed)
    }
}

/// Mutable state of one invocation, reachable from handlers only through
/// [`FlowContext`].
struct Invocation<Ev, Cx, R, E> {
    handlers: VecDeque<BoxedHandler<Ev, Cx, R, E>>,
    state: SharedState,
    status: FlowStatus,
    outcome: Option<std::result::Result<R, FlowError<E>>>,
    callback: Option<Completion<R, E>>,
    ignored_calls: usize,
}

impl<Ev, Cx, R, E> Invocation<Ev, Cx, R, E> {
    fn enqueue(&mut self, handler: BoxedHandler<Ev, Cx, R, E>) {
        if self.status.is_terminated() {
            self.ignore("add");
            return;
        }
        self.handlers.push_back(handler);
    }

    /// Records the outcome of the chain. Only the first call has any effect.
    fn terminate(&mut self, operation: &'static str, outcome: std::result::Result<R, FlowError<E>>) {
        if self.status.is_terminated() {
            self.ignore(operation);
            return;
        }
        self.status = if outcome.is_ok() {
            FlowStatus::Succeeded
        } else {
            FlowStatus::Failed
        };
        debug!(operation, status = ?self.status, dropped = self.handlers.len(), "flow terminated");
        self.handlers.clear();
        self.outcome = Some(outcome);
    }

    /// Hands the recorded outcome to the callback and releases invocation state.
    fn complete(&mut self) {
        if let Some(outcome) = self.outcome.take()
            && let Some(callback) = self.callback.take()
        {
            self.state.clear();
            callback(outcome);
        }
    }

    fn ignore(&mut self, operation: &'static str) {
        self.ignored_calls += 1;
        warn!(operation, status = ?self.status, "ignoring call on terminated flow");
    }
}

/// Capability surface handed to each handler.
///
/// Control operations act on the invocation owned by the engine; a handler
/// can neither replace them nor reach the completion callback directly.
pub struct FlowContext<'a, Ev, Cx, R, E = Fault> {
    invocation: &'a mut Invocation<Ev, Cx, R, E>,
    advance: bool,
}

impl<Ev, Cx, R, E> FlowContext<'_, Ev, Cx, R, E> {
    /// Passes control to the next handler once the current one returns.
    ///
    /// Calling it several times from one handler advances once.
    pub fn next(&mut self) {
        if self.invocation.status.is_terminated() {
            self.invocation.ignore("next");
            return;
        }
        self.advance = true;
    }

    /// Terminates the chain successfully with `result`.
    pub fn succeed(&mut self, result: R) {
        self.advance = false;
        self.invocation.terminate("succeed", Ok(result));
    }

    /// Terminates the chain with `error`.
    pub fn fail(&mut self, error: E) {
        self.advance = false;
        self.invocation
            .terminate("fail", Err(FlowError::Handler(error)));
    }

    pub fn state(&self) -> &SharedState {
        &self.invocation.state
    }

    pub fn state_mut(&mut self) -> &mut SharedState {
        &mut self.invocation.state
    }

    pub fn status(&self) -> FlowStatus {
        self.invocation.status
    }

    pub fn is_terminated(&self) -> bool {
        self.invocation.status.is_terminated()
    }

    /// Number of handlers still queued behind the current one.
    pub fn pending(&self) -> usize {
        self.invocation.handlers.len()
    }

    /// Enqueues a follow-up handler at the tail of the chain.
    pub fn add<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnOnce(&Ev, &Cx, &mut FlowContext<'_, Ev, Cx, R, E>) -> HandlerResult<E> + 'static,
    {
        self.add_handler(handler)
    }

    pub fn add_handler<H>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<Ev, Cx, R, E> + 'static,
    {
        self.invocation.enqueue(Box::new(handler));
        self
    }
}

/// Drives an ordered chain of handlers over one event.
///
/// The completion callback is invoked exactly once, after the handler that
/// terminated the chain has returned. Running out of handlers without a
/// terminal call fails the chain with [`FlowError::EndOfHandlers`].
///
/// # Example
///
/// ```
/// use lambda_flow::{FlowEngine, FlowError};
///
/// let mut flow = FlowEngine::<(), (), u32, String>::new((), (), |outcome| {
///     assert_eq!(outcome, Ok::<u32, FlowError<String>>(2));
/// });
/// flow.add(|_, _, flow| {
///     *flow.state_mut().get_or_insert_with("v", || 0u32) += 1;
///     flow.next();
///     Ok(())
/// })
/// .add(|_, _, flow| {
///     let v = flow.state().get::<u32>("v").copied().unwrap_or_default();
///     flow.succeed(v + 1);
///     Ok(())
/// });
/// flow.execute();
/// ```
pub struct FlowEngine<Ev, Cx, R, E = Fault> {
    event: Ev,
    context: Cx,
    invocation: Invocation<Ev, Cx, R, E>,
    dispatched: usize,
}

impl<Ev, Cx, R, E> FlowEngine<Ev, Cx, R, E> {
    pub fn new(
        event: Ev,
        context: Cx,
        callback: impl FnOnce(std::result::Result<R, FlowError<E>>) + 'static,
    ) -> Self {
        Self {
            event,
            context,
            invocation: Invocation {
                handlers: VecDeque::new(),
                state: SharedState::new(),
                status: FlowStatus::Idle,
                outcome: None,
                callback: Some(Box::new(callback)),
                ignored_calls: 0,
            },
            dispatched: 0,
        }
    }

    /// Appends a handler. Ignored once the chain has terminated.
    pub fn add<F>(&mut self, handler: F) -> &mut Self
    where
        F: FnOnce(&Ev, &Cx, &mut FlowContext<'_, Ev, Cx, R, E>) -> HandlerResult<E> + 'static,
    {
        self.add_handler(handler)
    }

    pub fn add_handler<H>(&mut self, handler: H) -> &mut Self
    where
        H: Handler<Ev, Cx, R, E> + 'static,
    {
        self.invocation.enqueue(Box::new(handler));
        self
    }

    /// Starts the chain. Only the first call dispatches anything.
    pub fn execute(&mut self) -> FlowStatus {
        if self.invocation.status != FlowStatus::Idle {
            self.invocation.ignored_calls += 1;
            warn!(status = ?self.invocation.status, "execute called more than once");
            return self.invocation.status;
        }
        self.next()
    }

    /// Dispatches queued handlers until one terminates the chain or returns
    /// without asking to continue.
    ///
    /// Returns [`FlowStatus::Running`] when the chain is waiting on a handler
    /// that did not call any control operation; calling `next` again resumes
    /// it with the following handler.
    pub fn next(&mut self) -> FlowStatus {
        if self.invocation.status.is_terminated() {
            self.invocation.ignore("next");
            return self.invocation.status;
        }
        self.invocation.status = FlowStatus::Running;

        loop {
            let Some(handler) = self.invocation.handlers.pop_front() else {
                self.invocation
                    .terminate("next", Err(FlowError::EndOfHandlers));
                break;
            };
            let position = self.dispatched;
            self.dispatched += 1;

            let advance = self.dispatch(handler, position);
            if self.invocation.status.is_terminated() {
                break;
            }
            if !advance {
                warn!(position, "handler returned without a control call; chain is waiting");
                return self.invocation.status;
            }
        }

        self.invocation.complete();
        self.invocation.status
    }

    /// Runs one handler behind the fault boundary. Returns whether it asked
    /// to continue.
    fn dispatch(&mut self, handler: BoxedHandler<Ev, Cx, R, E>, position: usize) -> bool {
        debug!(position, pending = self.invocation.handlers.len(), "dispatching handler");

        let mut flow = FlowContext {
            invocation: &mut self.invocation,
            advance: false,
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            handler.handle(&self.event, &self.context, &mut flow)
        }));
        let advance = flow.advance;

        match result {
            Ok(Ok(())) => advance,
            Ok(Err(error)) => {
                debug!(position, "handler returned an error");
                self.invocation
                    .terminate("handler error", Err(FlowError::Handler(error)));
                false
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(position, %message, "handler panicked");
                self.invocation
                    .terminate("handler panic", Err(FlowError::Panicked(message)));
                false
            }
        }
    }

    pub fn status(&self) -> FlowStatus {
        self.invocation.status
    }

    pub fn state(&self) -> &SharedState {
        &self.invocation.state
    }

    pub fn pending(&self) -> usize {
        self.invocation.handlers.len()
    }

    /// Control calls rejected because the chain had already terminated (or,
    /// for `execute`, had already started).
    pub fn ignored_calls(&self) -> usize {
        self.invocation.ignored_calls
    }
}

impl<Ev, Cx, R, E> Drop for FlowEngine<Ev, Cx, R, E> {
    fn drop(&mut self) {
        if self.invocation.callback.is_some() {
            warn!(status = ?self.invocation.status, "flow dropped before completion");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
