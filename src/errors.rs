//! Central error mapping.
//!
//! Handlers signal failure through [`HandlerError`] values instead of
//! unwinding; the dispatcher routes every error through [`map_handler_error`]
//! so status codes and bodies are decided in exactly one place. Startup-time
//! misconfiguration is a separate [`ConfigError`], never surfaced to clients.

use std::fmt;

use http::Method;
use serde_json::json;

use crate::dispatcher::HandlerResponse;
use crate::validator::ValidationErrors;

/// Route table construction error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The same (method, path pattern) pair was registered twice.
    DuplicateRoute {
        method: Method,
        path_pattern: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DuplicateRoute {
                method,
                path_pattern,
            } => {
                write!(
                    f,
                    "route {method} {path_pattern} is already registered; \
                    each (method, path pattern) pair may be registered once"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failure raised by a handler, mapped centrally to an HTTP response.
#[derive(Debug, Clone)]
pub enum HandlerError {
    /// Domain failure with caller-chosen status, detail and extra headers.
    Http {
        status: u16,
        detail: String,
        headers: Vec<(String, String)>,
    },
    /// Application fault keyed by the offending name; always answered with
    /// a fixed 401 message template.
    Denied { name: String },
}

impl HandlerError {
    pub fn http(status: u16, detail: &str) -> Self {
        HandlerError::Http {
            status,
            detail: detail.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn http_with_headers(status: u16, detail: &str, headers: Vec<(String, String)>) -> Self {
        HandlerError::Http {
            status,
            detail: detail.to_string(),
            headers,
        }
    }

    pub fn denied(name: &str) -> Self {
        HandlerError::Denied {
            name: name.to_string(),
        }
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Http { status, detail, .. } => {
                write!(f, "http error {status}: {detail}")
            }
            HandlerError::Denied { name } => write!(f, "denied: {name}"),
        }
    }
}

impl std::error::Error for HandlerError {}

/// Convert a handler failure into the response sent to the client.
pub fn map_handler_error(err: HandlerError) -> HandlerResponse {
    match err {
        HandlerError::Http {
            status,
            detail,
            headers,
        } => {
            let mut resp = HandlerResponse::json(status, json!({ "detail": detail }));
            for (name, value) in headers {
                resp.set_header(&name, value);
            }
            resp
        }
        HandlerError::Denied { name } => HandlerResponse::json(
            401,
            json!({ "message": format!("you are wrong {name}, please go back") }),
        ),
    }
}

/// Build the 422 response for aggregated validation failures.
pub fn validation_response(errors: &ValidationErrors) -> HandlerResponse {
    let detail: Vec<_> = errors
        .0
        .iter()
        .map(|e| {
            json!({
                "field": e.field,
                "in": e.location.to_string(),
                "reason": e.reason,
            })
        })
        .collect();
    HandlerResponse::json(422, json!({ "detail": detail }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::ParamLocation;
    use crate::validator::ValidationError;

    #[test]
    fn http_errors_keep_status_detail_and_headers() {
        let resp = map_handler_error(HandlerError::http_with_headers(
            404,
            "you are wrong",
            vec![("X-Error".to_string(), "Error".to_string())],
        ));
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body, json!({ "detail": "you are wrong" }));
        assert_eq!(resp.get_header("X-Error"), Some("Error"));
    }

    #[test]
    fn denied_uses_the_fixed_message_template() {
        let resp = map_handler_error(HandlerError::denied("guest"));
        assert_eq!(resp.status, 401);
        assert_eq!(
            resp.body,
            json!({ "message": "you are wrong guest, please go back" })
        );
    }

    #[test]
    fn validation_response_lists_every_failure() {
        let errors = ValidationErrors(vec![
            ValidationError {
                field: "id".to_string(),
                location: ParamLocation::Path,
                reason: "value is not a valid integer: \"abc\"".to_string(),
            },
            ValidationError {
                field: "q".to_string(),
                location: ParamLocation::Query,
                reason: "field required".to_string(),
            },
        ]);
        let resp = validation_response(&errors);
        assert_eq!(resp.status, 422);
        assert_eq!(resp.body["detail"].as_array().map(Vec::len), Some(2));
        assert_eq!(resp.body["detail"][0]["in"], "path");
    }
}
