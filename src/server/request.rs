use std::collections::HashMap;
use std::io::Read;

use may_minihttp::Request;
use tracing::debug;

/// Parsed HTTP request data used by `AppService`.
///
/// Query and form parameters are kept as ordered name/value pairs so
/// repeated names survive in request order (the validator turns them into
/// lists).
#[derive(Debug, PartialEq)]
pub struct ParsedRequest {
    /// HTTP method (GET, POST, ...).
    pub method: String,
    /// Request path without the query string.
    pub path: String,
    /// HTTP headers (lowercase names).
    pub headers: HashMap<String, String>,
    /// Query string parameters, in request order, repeats preserved.
    pub query_params: Vec<(String, String)>,
    /// Form fields when the body was `application/x-www-form-urlencoded`.
    pub form_params: Vec<(String, String)>,
    /// Parsed JSON body, when the body parsed as JSON.
    pub body: Option<serde_json::Value>,
}

/// Parse query string parameters from a URL path.
///
/// Extracts everything after the `?` and URL-decodes names and values,
/// preserving request order and duplicate names.
pub fn parse_query_params(path: &str) -> Vec<(String, String)> {
    match path.find('?') {
        Some(pos) => url::form_urlencoded::parse(path[pos + 1..].as_bytes())
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        None => Vec::new(),
    }
}

/// Parse an `application/x-www-form-urlencoded` body.
pub fn parse_form(body: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(body.as_bytes())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Extract method, path, headers, query/form parameters and body from a raw
/// `may_minihttp` request.
pub fn parse_request(req: Request) -> ParsedRequest {
    let method = req.method().to_string();
    let raw_path = req.path().to_string();
    let path = raw_path.split('?').next().unwrap_or("/").to_string();

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    let query_params = parse_query_params(&raw_path);

    let mut body_str = String::new();
    let body_len = req.body().read_to_string(&mut body_str).unwrap_or(0);

    let mut form_params = Vec::new();
    let mut body = None;
    if body_len > 0 {
        let content_type = headers.get("content-type").map(String::as_str).unwrap_or("");
        if content_type.starts_with("application/x-www-form-urlencoded") {
            form_params = parse_form(&body_str);
        } else {
            body = serde_json::from_str(&body_str).ok();
        }
    }

    debug!(
        method = %method,
        path = %path,
        header_count = headers.len(),
        query_count = query_params.len(),
        form_count = form_params.len(),
        body_bytes = body_len,
        "HTTP request parsed"
    );

    ParsedRequest {
        method,
        path,
        headers,
        query_params,
        form_params,
        body,
    }
}
