pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;

pub use application::flow::{FlowContext, FlowEngine, FlowStatus, Handler, HandlerResult};
pub use application::http_flow::{HttpFlowContext, HttpFlowEngine, HttpHandler};
pub use domain::ports::ResponseBuilder;
pub use domain::response::WireResponse;
pub use domain::state::SharedState;
pub use error::{Fault, FlowError};
pub use infrastructure::json_response::JsonResponse;

/// HTTP flow answering through [`JsonResponse`].
pub type HttpFlow<Ev, Cx, E = Fault> = HttpFlowEngine<Ev, Cx, JsonResponse, E>;
