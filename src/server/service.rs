use std::io;
use std::sync::Arc;

use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use tracing::{info, warn};

use super::request::{parse_request, ParsedRequest};
use super::response::{write_handler_response, write_json_error, write_redirect};
use crate::background::BackgroundTasks;
use crate::dispatcher::{Dispatcher, HandlerResponse, HeaderVec};
use crate::errors::validation_response;
use crate::ids::RequestId;
use crate::middleware::CorsPolicy;
use crate::router::RouteTable;
use crate::runtime_config::RuntimeConfig;
use crate::static_files::StaticFiles;
use crate::validator::{validate_request, RequestInput};

/// The request-handling service: resolve → validate → dispatch → map errors,
/// then run any background tasks the handler registered.
///
/// Everything it holds is immutable after startup, so clones are cheap and
/// concurrent request flows never contend.
pub struct AppService {
    pub table: Arc<RouteTable>,
    pub dispatcher: Arc<Dispatcher>,
    pub cors: Option<Arc<CorsPolicy>>,
    pub static_files: Option<Arc<StaticFiles>>,
    /// URL prefix the static directory is mounted under.
    pub static_mount: String,
    /// Where unmatched routes are redirected instead of a bare 404.
    pub not_found_location: String,
    stack_size: usize,
}

impl Clone for AppService {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            dispatcher: Arc::clone(&self.dispatcher),
            cors: self.cors.clone(),
            static_files: self.static_files.clone(),
            static_mount: self.static_mount.clone(),
            not_found_location: self.not_found_location.clone(),
            stack_size: self.stack_size,
        }
    }
}

impl AppService {
    pub fn new(table: Arc<RouteTable>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            table,
            dispatcher,
            cors: None,
            static_files: None,
            static_mount: "/static".to_string(),
            not_found_location: "/Not_found".to_string(),
            stack_size: RuntimeConfig::from_env().stack_size,
        }
    }

    pub fn with_cors(mut self, cors: Arc<CorsPolicy>) -> Self {
        self.cors = Some(cors);
        self
    }

    pub fn with_static_dir<P: Into<std::path::PathBuf>>(mut self, dir: P) -> Self {
        self.static_files = Some(Arc::new(StaticFiles::new(dir)));
        self
    }

    /// CORS headers for responses that never reach the dispatcher
    /// (redirects, static files, validation errors).
    fn cors_headers(&self, parsed: &ParsedRequest) -> HeaderVec {
        let mut headers = HeaderVec::new();
        if let Some(cors) = &self.cors {
            let origin = parsed.headers.get("origin").map(String::as_str);
            for (name, value) in cors.response_headers(origin) {
                headers.push((Arc::from(name.as_str()), value));
            }
        }
        headers
    }

    fn serve_static(&self, parsed: &ParsedRequest, res: &mut Response) -> bool {
        let Some(static_files) = &self.static_files else {
            return false;
        };
        let Some(rest) = parsed.path.strip_prefix(self.static_mount.as_str()) else {
            return false;
        };
        if !rest.starts_with('/') {
            return false;
        }
        match static_files.load(rest.trim_start_matches('/')) {
            Ok((bytes, ct)) => {
                res.status_code(200, "OK");
                let header = format!("Content-Type: {ct}").into_boxed_str();
                res.header(Box::leak(header));
                res.body_vec(bytes);
                true
            }
            // A miss under the mount falls through to routing and from
            // there to the not-found redirect.
            Err(_) => false,
        }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = parse_request(req);
        let request_id =
            RequestId::from_header_or_new(parsed.headers.get("x-request-id").map(String::as_str));

        if parsed.method == "GET" && self.serve_static(&parsed, res) {
            return Ok(());
        }

        // Preflight requests are answered before routing; the demo
        // registers no OPTIONS routes of its own.
        if let Some(cors) = &self.cors {
            let preflight = cors.preflight(
                &parsed.method,
                parsed.headers.get("origin").map(String::as_str),
                parsed
                    .headers
                    .get("access-control-request-method")
                    .map(String::as_str),
            );
            if let Some(resp) = preflight {
                write_handler_response(res, resp.status, &resp.headers, resp.body);
                return Ok(());
            }
        }

        let method = match parsed.method.parse::<http::Method>() {
            Ok(m) => m,
            Err(_) => {
                write_json_error(res, 400, json!({ "detail": "unsupported HTTP method" }));
                return Ok(());
            }
        };

        let Some(route_match) = self.table.resolve(&method, &parsed.path) else {
            // Unmatched routes are rewritten to the fixed not-found page,
            // never surfaced as a bare 404.
            info!(
                request_id = %request_id,
                method = %method,
                path = %parsed.path,
                location = %self.not_found_location,
                "redirecting unmatched route"
            );
            write_redirect(res, &self.not_found_location, &self.cors_headers(&parsed));
            return Ok(());
        };

        let input = RequestInput {
            path_params: &route_match.path_params,
            query_params: &parsed.query_params,
            headers: &parsed.headers,
            form_params: &parsed.form_params,
            body: parsed.body.as_ref(),
        };
        let params = match validate_request(&route_match.route, &input) {
            Ok(params) => params,
            Err(errors) => {
                let mut resp = validation_response(&errors);
                for (name, value) in self.cors_headers(&parsed) {
                    resp.set_header(&name, value);
                }
                write_handler_response(res, resp.status, &resp.headers, resp.body);
                return Ok(());
            }
        };

        let headers: HeaderVec = parsed
            .headers
            .iter()
            .map(|(k, v)| (Arc::from(k.as_str()), v.clone()))
            .collect();
        let tasks = BackgroundTasks::new();

        let handler_response = self.dispatcher.dispatch(
            &route_match,
            params,
            headers,
            request_id,
            tasks.clone(),
        );

        match handler_response {
            Some(mut hr) => {
                if let Some(response_meta) = &route_match.route.response {
                    if !response_meta.exclude_unset {
                        if let Some(schema) = &response_meta.schema {
                            schema.apply_defaults(&mut hr.body);
                        }
                    }
                }
                write_handler_response(res, hr.status, &hr.headers, hr.body);
            }
            None => {
                warn!(
                    request_id = %request_id,
                    handler = %route_match.route.handler_name,
                    "handler failed or not registered"
                );
                let mut resp = HandlerResponse::error(500, "handler failed or not registered");
                for (name, value) in self.cors_headers(&parsed) {
                    resp.set_header(&name, value);
                }
                write_handler_response(res, resp.status, &resp.headers, resp.body);
            }
        }

        // The response is fully constructed; deferred work must not block
        // the client, so it drains on its own coroutine.
        tasks.drain_detached(self.stack_size);
        Ok(())
    }
}
