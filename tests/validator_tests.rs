//! Parameter validation against declared route contracts.

use std::collections::HashMap;

use http::Method;
use rapido::meta::{ParamSpec, ParamType, RouteMeta};
use rapido::router::ParamVec;
use rapido::validator::{validate_request, RequestInput};
use serde_json::json;
use std::sync::Arc;

struct RawRequest {
    path_params: ParamVec,
    query_params: Vec<(String, String)>,
    headers: HashMap<String, String>,
    form_params: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl Default for RawRequest {
    fn default() -> Self {
        Self {
            path_params: ParamVec::new(),
            query_params: Vec::new(),
            headers: HashMap::new(),
            form_params: Vec::new(),
            body: None,
        }
    }
}

impl RawRequest {
    fn input(&self) -> RequestInput<'_> {
        RequestInput {
            path_params: &self.path_params,
            query_params: &self.query_params,
            headers: &self.headers,
            form_params: &self.form_params,
            body: self.body.as_ref(),
        }
    }
}

fn query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn integer_path_param_rejects_non_numeric() {
    let route = RouteMeta::new(Method::GET, "/b/{id}", "echo_number")
        .param(ParamSpec::path("id", ParamType::Integer));

    let mut raw = RawRequest::default();
    raw.path_params.push((Arc::from("id"), "abc".to_string()));
    let err = validate_request(&route, &raw.input()).unwrap_err();
    assert_eq!(err.0.len(), 1);
    assert_eq!(err.0[0].field, "id");

    raw.path_params.clear();
    raw.path_params.push((Arc::from("id"), "42".to_string()));
    let params = validate_request(&route, &raw.input()).unwrap();
    assert_eq!(params["id"], json!(42));
}

#[test]
fn missing_required_query_param_is_reported() {
    let route = RouteMeta::new(Method::GET, "/email", "schedule_notification")
        .param(ParamSpec::query("email", ParamType::String));
    let raw = RawRequest::default();
    let err = validate_request(&route, &raw.input()).unwrap_err();
    assert_eq!(err.0[0].field, "email");
    assert_eq!(err.0[0].reason, "field required");
}

#[test]
fn absent_param_takes_default_without_constraint_checks() {
    // The declared default neither matches the pattern nor the minimum
    // length for caller input; defaults are taken as-is.
    let route = RouteMeta::new(Method::GET, "/f", "constrained_query").param(
        ParamSpec::query("q", ParamType::String)
            .default_value(json!("默认值"))
            .min_length(3)
            .max_length(8)
            .pattern("^haha"),
    );
    let raw = RawRequest::default();
    let params = validate_request(&route, &raw.input()).unwrap();
    assert_eq!(params["q"], json!("默认值"));
}

#[test]
fn string_constraints_apply_to_caller_input() {
    let route = RouteMeta::new(Method::GET, "/f", "constrained_query").param(
        ParamSpec::query("q", ParamType::String)
            .default_value(json!("默认值"))
            .min_length(3)
            .max_length(8)
            .pattern("^haha"),
    );

    let mut raw = RawRequest::default();
    raw.query_params = query(&[("q", "hahaXYZ")]);
    assert!(validate_request(&route, &raw.input()).is_ok());

    raw.query_params = query(&[("q", "nope")]);
    assert!(validate_request(&route, &raw.input()).is_err());

    raw.query_params = query(&[("q", "hahahahaha")]);
    assert!(validate_request(&route, &raw.input()).is_err());
}

#[test]
fn repeated_query_params_collect_in_request_order() {
    let route = RouteMeta::new(Method::GET, "/g", "repeated_query")
        .param(ParamSpec::query("q", ParamType::StringList).optional());

    let mut raw = RawRequest::default();
    raw.query_params = query(&[("q", "a"), ("x", "noise"), ("q", "b")]);
    let params = validate_request(&route, &raw.input()).unwrap();
    assert_eq!(params["q"], json!(["a", "b"]));

    raw.query_params.clear();
    let params = validate_request(&route, &raw.input()).unwrap();
    assert_eq!(params["q"], json!(null));
}

#[test]
fn header_params_are_looked_up_lowercase() {
    let route = RouteMeta::new(Method::GET, "/h", "echo_user_agent")
        .param(ParamSpec::header("user-agent").optional());

    let mut raw = RawRequest::default();
    raw.headers
        .insert("user-agent".to_string(), "curl/8.0".to_string());
    let params = validate_request(&route, &raw.input()).unwrap();
    assert_eq!(params["user-agent"], json!("curl/8.0"));
}

#[test]
fn form_params_validate_like_queries() {
    let route = RouteMeta::new(Method::POST, "/d", "echo_form")
        .param(ParamSpec::form("q", ParamType::String).optional());

    let mut raw = RawRequest::default();
    raw.form_params = query(&[("q", "hello")]);
    let params = validate_request(&route, &raw.input()).unwrap();
    assert_eq!(params["q"], json!("hello"));

    raw.form_params.clear();
    let params = validate_request(&route, &raw.input()).unwrap();
    assert_eq!(params["q"], json!(null));
}

#[test]
fn failures_aggregate_across_parameters() {
    let route = RouteMeta::new(Method::GET, "/multi", "multi")
        .param(ParamSpec::query("count", ParamType::Integer))
        .param(ParamSpec::query("flag", ParamType::Boolean))
        .param(ParamSpec::query("name", ParamType::String));

    let mut raw = RawRequest::default();
    raw.query_params = query(&[("count", "NaN"), ("flag", "maybe")]);
    let err = validate_request(&route, &raw.input()).unwrap_err();
    let fields: Vec<_> = err.0.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["count", "flag", "name"]);
}

#[test]
fn enum_query_param_checks_membership() {
    let route = RouteMeta::new(Method::GET, "/pick", "pick").param(ParamSpec::query(
        "city",
        ParamType::enumeration(["beijing", "nanjing"]),
    ));

    let mut raw = RawRequest::default();
    raw.query_params = query(&[("city", "beijing")]);
    assert!(validate_request(&route, &raw.input()).is_ok());

    raw.query_params = query(&[("city", "tokyo")]);
    assert!(validate_request(&route, &raw.input()).is_err());
}
