use may_minihttp::Response;
use serde_json::Value;

use crate::dispatcher::HeaderVec;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        307 => "Temporary Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Emit a header line. `may_minihttp` keeps `&'static str` header lines, so
/// dynamic values are leaked; headers are few and short-lived per response.
fn push_header(res: &mut Response, name: &str, value: &str) {
    let line = format!("{name}: {value}").into_boxed_str();
    res.header(Box::leak(line));
}

/// Write a handler response: status line, explicit headers, then the body.
///
/// A `Value::String` body is written as plain text; anything else is
/// serialized as JSON. An explicit Content-Type header from the handler
/// wins over both.
pub fn write_handler_response(res: &mut Response, status: u16, headers: &HeaderVec, body: Value) {
    res.status_code(status as usize, status_reason(status));

    let mut has_content_type = false;
    for (name, value) in headers {
        if name.eq_ignore_ascii_case("content-type") {
            has_content_type = true;
        }
        push_header(res, name, value);
    }

    match body {
        Value::String(s) => {
            if !has_content_type {
                res.header("Content-Type: text/plain; charset=utf-8");
            }
            res.body_vec(s.into_bytes());
        }
        other => {
            if !has_content_type {
                res.header("Content-Type: application/json");
            }
            res.body_vec(serde_json::to_vec(&other).unwrap_or_default());
        }
    }
}

/// Write a JSON error body with the given status.
pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}

/// Write a 307 redirect to `location` with an empty body.
pub fn write_redirect(res: &mut Response, location: &str, extra_headers: &HeaderVec) {
    res.status_code(307, status_reason(307));
    push_header(res, "Location", location);
    for (name, value) in extra_headers {
        push_header(res, name, value);
    }
    res.body_vec(Vec::new());
}
