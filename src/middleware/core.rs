use std::time::Duration;

use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Hook pair applied around handler execution.
///
/// `before` may short-circuit with an early response (e.g. a CORS
/// preflight); `after` sees and may amend every dispatched response.
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}
