//! Dispatcher core module - hot path for request dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Method;
use may::sync::mpsc;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::{debug, error, info, warn};

use crate::background::BackgroundTasks;
use crate::errors::{map_handler_error, HandlerError};
use crate::ids::RequestId;
use crate::middleware::Middleware;
use crate::router::RouteMatch;
use crate::runtime_config::RuntimeConfig;
use crate::validator::ParamMap;

/// Maximum inline headers before heap allocation.
/// Most requests carry well under 16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage for the hot path.
///
/// Header names use `Arc<str>` because they repeat across requests
/// (Content-Type, Origin, ...); values are per-request data.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// What a handler returns: a response, or a failure for the error mapper.
pub type HandlerResult = Result<HandlerResponse, HandlerError>;

/// Request data passed to a handler coroutine.
///
/// Parameters arrive already validated and typed per the route's declared
/// `ParamSpec`s; handlers never see raw wire strings.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation.
    pub request_id: RequestId,
    /// HTTP method (GET, POST, ...).
    pub method: Method,
    /// Matched path pattern.
    pub path: String,
    /// Name of the handler processing this request.
    pub handler_name: String,
    /// Validated, typed parameters keyed by declared name.
    pub params: ParamMap,
    /// HTTP request headers, lowercase names (stack-allocated for ≤16).
    pub headers: HeaderVec,
    /// Deferred work to run after the response is sent.
    pub tasks: BackgroundTasks,
    /// Channel the dispatch loop answers on; handlers return their result
    /// instead of using this directly.
    pub reply_tx: mpsc::Sender<HandlerResult>,
}

impl HandlerRequest {
    /// Get a validated parameter by name.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Get a string parameter; `None` when absent or JSON null.
    #[must_use]
    pub fn param_str(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(Value::as_str)
    }

    #[must_use]
    pub fn param_i64(&self, name: &str) -> Option<i64> {
        self.param(name).and_then(Value::as_i64)
    }

    #[must_use]
    pub fn param_f64(&self, name: &str) -> Option<f64> {
        self.param(name).and_then(Value::as_f64)
    }

    /// Get a list parameter as owned strings, preserving request order.
    #[must_use]
    pub fn param_list(&self, name: &str) -> Option<Vec<String>> {
        self.param(name).and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
    }

    /// Get a header by name (case-insensitive per RFC 7230).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response data sent back from a handler coroutine.
#[derive(Debug, Clone)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, ...).
    pub status: u16,
    /// HTTP response headers (stack-allocated for ≤16).
    pub headers: HeaderVec,
    /// Response body. `Value::String` is written as plain text unless an
    /// explicit Content-Type header says otherwise; everything else as JSON.
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// JSON response with default headers.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self::new(status, HeaderVec::new(), body)
    }

    /// 200 response with a plain-text body.
    #[must_use]
    pub fn text(body: &str) -> Self {
        Self::new(200, HeaderVec::new(), Value::String(body.to_string()))
    }

    /// 200 response carrying rendered HTML.
    #[must_use]
    pub fn html(body: String) -> Self {
        let mut resp = Self::new(200, HeaderVec::new(), Value::String(body));
        resp.set_header("Content-Type", "text/html; charset=utf-8".to_string());
        resp
    }

    /// Error response with a JSON `{"error": ...}` body.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header (case-insensitive on the name).
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }
}

/// Channel sender that feeds requests to one handler coroutine.
pub type HandlerSender = mpsc::Sender<HandlerRequest>;

/// Dispatcher that routes matched requests to registered handler coroutines.
///
/// Built at startup, read-only afterwards; shared across request-handling
/// coroutines behind an `Arc`.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, HandlerSender>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add middleware to the processing pipeline. Middleware runs in the
    /// order added: `before` hooks may short-circuit with an early response,
    /// `after` hooks see and may amend every response.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    #[must_use]
    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Register a handler function under the given name.
    ///
    /// Spawns a coroutine that processes requests from a channel. Panics
    /// inside the handler are caught and converted to 500 responses;
    /// `HandlerError` returns are mapped by the central error mapper at
    /// dispatch time.
    ///
    /// # Safety
    ///
    /// Calls `may::coroutine::Builder::spawn()`, which is unsafe in the
    /// `may` runtime. The caller must ensure the May runtime is initialized
    /// before registration and that the handler is safe to run concurrently
    /// with other coroutines.
    #[allow(unsafe_code)]
    pub unsafe fn register_handler<F>(&mut self, name: &str, handler_fn: F)
    where
        F: Fn(HandlerRequest) -> HandlerResult + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<HandlerRequest>();
        let name = name.to_string();
        let loop_name = name.clone();
        let stack_size = RuntimeConfig::from_env().stack_size;

        // SAFETY: the handler is Send + 'static and all error signalling
        // goes through the reply channel, never across the unwind boundary.
        let spawn_result = unsafe {
            may::coroutine::Builder::new()
                .stack_size(stack_size)
                .spawn(move || {
                    debug!(handler = %loop_name, stack_size, "handler coroutine start");
                    for req in rx.iter() {
                        let reply_tx = req.reply_tx.clone();
                        let handler_name = req.handler_name.clone();
                        let request_id = req.request_id;
                        let start = Instant::now();

                        let outcome = std::panic::catch_unwind(
                            std::panic::AssertUnwindSafe(|| handler_fn(req)),
                        );
                        match outcome {
                            Ok(result) => {
                                debug!(
                                    request_id = %request_id,
                                    handler = %handler_name,
                                    execution_time_ms = start.elapsed().as_millis() as u64,
                                    ok = result.is_ok(),
                                    "handler execution complete"
                                );
                                let _ = reply_tx.send(result);
                            }
                            Err(panic) => {
                                error!(
                                    request_id = %request_id,
                                    handler = %handler_name,
                                    panic = ?panic,
                                    "handler panicked"
                                );
                                // Routed through the error mapper so fixed
                                // status overrides never rewrite a 500.
                                let _ = reply_tx
                                    .send(Err(HandlerError::http(500, "internal server error")));
                            }
                        }
                    }
                })
        };

        if let Err(e) = spawn_result {
            error!(handler = %name, error = %e, "failed to spawn handler coroutine");
            return;
        }
        self.handlers.insert(name, tx);
    }

    /// Dispatch a validated request to its handler and wait for the reply.
    ///
    /// Applies middleware `before`/`after` hooks, maps `HandlerError`
    /// returns through the error mapper, and applies the route's fixed
    /// status override to successful responses.
    ///
    /// Returns `None` when no handler is registered for the matched route.
    #[must_use]
    pub fn dispatch(
        &self,
        route_match: &RouteMatch,
        params: ParamMap,
        headers: HeaderVec,
        request_id: RequestId,
        tasks: BackgroundTasks,
    ) -> Option<HandlerResponse> {
        let (reply_tx, reply_rx) = mpsc::channel();

        let tx = match self.handlers.get(&route_match.route.handler_name) {
            Some(tx) => tx,
            None => {
                error!(
                    handler = %route_match.route.handler_name,
                    available_handlers = self.handlers.len(),
                    "handler not found"
                );
                return None;
            }
        };

        let request = HandlerRequest {
            request_id,
            method: route_match.route.method.clone(),
            path: route_match.route.path_pattern.clone(),
            handler_name: route_match.route.handler_name.clone(),
            params,
            headers,
            tasks,
            reply_tx,
        };

        let mut early_resp: Option<HandlerResponse> = None;
        for mw in &self.middlewares {
            if early_resp.is_none() {
                early_resp = mw.before(&request);
            }
        }

        let (mut resp, latency) = if let Some(r) = early_resp {
            (r, Duration::from_millis(0))
        } else {
            info!(
                request_id = %request.request_id,
                handler = %request.handler_name,
                method = %request.method,
                path = %request.path,
                "request dispatched to handler"
            );
            let start = Instant::now();
            if let Err(e) = tx.send(request.clone()) {
                error!(
                    request_id = %request.request_id,
                    handler = %request.handler_name,
                    error = %e,
                    "failed to send request to handler"
                );
                return None;
            }

            let result = match reply_rx.recv() {
                Ok(result) => result,
                Err(e) => {
                    warn!(
                        request_id = %request.request_id,
                        handler = %request.handler_name,
                        error = %e,
                        "handler channel closed before replying"
                    );
                    return Some(HandlerResponse::error(503, "handler is not responding"));
                }
            };

            let resp = match result {
                Ok(mut resp) => {
                    // Route-declared fixed status applies to the success
                    // path only; mapped errors keep their own codes.
                    if let Some(status) = route_match.route.status {
                        resp.status = status;
                    }
                    resp
                }
                Err(err) => map_handler_error(err),
            };
            (resp, start.elapsed())
        };

        for mw in &self.middlewares {
            mw.after(&request, &mut resp, latency);
        }

        Some(resp)
    }
}
