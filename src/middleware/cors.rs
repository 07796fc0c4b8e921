use std::time::Duration;

use http::Method;
use tracing::debug;

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse, HeaderVec};

/// Origin validation strategy.
#[derive(Debug, Clone)]
pub enum OriginValidation {
    /// Exact string matching.
    Exact(Vec<String>),
    /// Allow all origins.
    Wildcard,
}

impl OriginValidation {
    fn is_allowed(&self, origin: &str) -> bool {
        match self {
            OriginValidation::Exact(origins) => origins.iter().any(|o| o == origin),
            OriginValidation::Wildcard => true,
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) policy.
///
/// Handles preflight OPTIONS requests and adds CORS headers to responses.
/// Runs as dispatcher middleware for routed requests; the service applies
/// [`response_headers`](Self::response_headers) directly to responses that
/// never reach the dispatcher (redirects, static files, validation errors).
///
/// # Credentials
///
/// The CORS specification forbids the literal `*` origin together with
/// credentials. When credentials are enabled this policy echoes the request
/// `Origin` back instead of emitting `*`, so the permissive default stays
/// spec-conformant on the wire.
pub struct CorsPolicy {
    origin_validation: OriginValidation,
    allowed_headers: Vec<String>,
    allowed_methods: Vec<Method>,
    allow_credentials: bool,
}

impl CorsPolicy {
    pub fn new(
        allowed_origins: Vec<String>,
        allowed_headers: Vec<String>,
        allowed_methods: Vec<Method>,
        allow_credentials: bool,
    ) -> Self {
        let origin_validation = if allowed_origins.iter().any(|o| o == "*") {
            OriginValidation::Wildcard
        } else {
            OriginValidation::Exact(allowed_origins)
        };
        Self {
            origin_validation,
            allowed_headers,
            allowed_methods,
            allow_credentials,
        }
    }

    /// All origins, methods and headers permitted, credentials allowed.
    ///
    /// A permissive development default, not a hardened posture.
    #[must_use]
    pub fn permissive() -> Self {
        Self::new(
            vec!["*".to_string()],
            vec!["*".to_string()],
            vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::OPTIONS,
                Method::HEAD,
            ],
            true,
        )
    }

    /// The `Access-Control-Allow-Origin` value for a request origin, or
    /// `None` when the origin is absent or not allowed.
    fn allow_origin_value(&self, origin: Option<&str>) -> Option<String> {
        let origin = origin?;
        if !self.origin_validation.is_allowed(origin) {
            return None;
        }
        if matches!(self.origin_validation, OriginValidation::Wildcard) && !self.allow_credentials {
            return Some("*".to_string());
        }
        // Credentials (or exact origins): reflect the request origin.
        Some(origin.to_string())
    }

    /// Answer a preflight request. Returns `None` unless the request is an
    /// OPTIONS carrying both `Origin` and `Access-Control-Request-Method`.
    #[must_use]
    pub fn preflight(
        &self,
        method: &str,
        origin: Option<&str>,
        request_method: Option<&str>,
    ) -> Option<HandlerResponse> {
        if !method.eq_ignore_ascii_case("OPTIONS") {
            return None;
        }
        let allow_origin = self.allow_origin_value(origin)?;
        request_method?;

        debug!(origin = ?origin, "answering CORS preflight");
        let mut resp = HandlerResponse::new(
            200,
            HeaderVec::new(),
            serde_json::Value::String(String::new()),
        );
        resp.set_header("Access-Control-Allow-Origin", allow_origin);
        resp.set_header("Access-Control-Allow-Methods", self.methods_header());
        resp.set_header("Access-Control-Allow-Headers", self.allowed_headers.join(", "));
        if self.allow_credentials {
            resp.set_header("Access-Control-Allow-Credentials", "true".to_string());
        }
        Some(resp)
    }

    /// CORS headers to attach to a non-preflight response.
    #[must_use]
    pub fn response_headers(&self, origin: Option<&str>) -> Vec<(String, String)> {
        let Some(allow_origin) = self.allow_origin_value(origin) else {
            return Vec::new();
        };
        let mut headers = vec![("Access-Control-Allow-Origin".to_string(), allow_origin)];
        if self.allow_credentials {
            headers.push((
                "Access-Control-Allow-Credentials".to_string(),
                "true".to_string(),
            ));
        }
        headers
    }

    fn methods_header(&self) -> String {
        self.allowed_methods
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Middleware for CorsPolicy {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        self.preflight(
            req.method.as_str(),
            req.get_header("origin"),
            req.get_header("access-control-request-method"),
        )
    }

    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, _latency: Duration) {
        for (name, value) in self.response_headers(req.get_header("origin")) {
            if res.get_header(&name).is_none() {
                res.set_header(&name, value);
            }
        }
    }
}
