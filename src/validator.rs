//! Request parameter and schema validation.
//!
//! Every declared [`ParamSpec`] is checked before a handler runs: presence
//! and defaults, type coercion from the raw wire strings, and string
//! constraints. Failures across all parameters of a request are aggregated
//! into one [`ValidationErrors`] report rather than stopping at the first.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::meta::{ObjectSchema, ParamLocation, ParamSpec, ParamType, RouteMeta};
use crate::router::ParamVec;

/// Validated, typed parameter values keyed by name.
pub type ParamMap = HashMap<String, Value>;

/// One rejected parameter or field.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub location: ParamLocation,
    pub reason: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} parameter {:?}: {}", self.location, self.field, self.reason)
    }
}

impl std::error::Error for ValidationError {}

/// Aggregated validation report; never empty when returned as an `Err`.
#[derive(Debug, Clone, Default)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    fn push(&mut self, field: &str, location: ParamLocation, reason: String) {
        self.0.push(ValidationError {
            field: field.to_string(),
            location,
            reason,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} validation error(s)", self.0.len())?;
        for err in &self.0 {
            write!(f, "; {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Raw request inputs the validator draws from, exactly as parsed off the
/// wire. Query and form pairs keep request order so repeated names form an
/// ordered list.
pub struct RequestInput<'a> {
    pub path_params: &'a ParamVec,
    pub query_params: &'a [(String, String)],
    pub headers: &'a HashMap<String, String>,
    pub form_params: &'a [(String, String)],
    pub body: Option<&'a Value>,
}

/// Validate every declared parameter of `route` against the raw request.
///
/// Returns the fully-typed parameter map the handler receives, or the
/// aggregated report of everything that failed.
pub fn validate_request(
    route: &RouteMeta,
    input: &RequestInput<'_>,
) -> Result<ParamMap, ValidationErrors> {
    let mut params = ParamMap::with_capacity(route.params.len());
    let mut errors = ValidationErrors::default();

    for spec in &route.params {
        match validate_param(spec, input) {
            Ok(value) => {
                params.insert(spec.name.clone(), value);
            }
            Err(reason) => errors.push(&spec.name, spec.location, reason),
        }
    }

    if errors.is_empty() {
        Ok(params)
    } else {
        debug!(
            handler = %route.handler_name,
            error_count = errors.0.len(),
            "request validation failed"
        );
        Err(errors)
    }
}

/// Validate one parameter; `Err` carries the human-readable reason.
pub fn validate_param(spec: &ParamSpec, input: &RequestInput<'_>) -> Result<Value, String> {
    // List parameters collect every same-named occurrence in request order.
    if let ParamType::StringList = spec.ty {
        let occurrences: Vec<&str> = match spec.location {
            ParamLocation::Query => collect(input.query_params, &spec.name),
            ParamLocation::Form => collect(input.form_params, &spec.name),
            other => {
                return Err(format!("list parameters are not supported in {other}"));
            }
        };
        if occurrences.is_empty() {
            return absent(spec);
        }
        return Ok(Value::Array(
            occurrences
                .into_iter()
                .map(|v| Value::String(v.to_string()))
                .collect(),
        ));
    }

    let raw: Option<String> = match spec.location {
        ParamLocation::Path => spec_path_value(input.path_params, &spec.name),
        ParamLocation::Query => last(input.query_params, &spec.name),
        ParamLocation::Header => input.headers.get(&spec.name.to_ascii_lowercase()).cloned(),
        ParamLocation::Form => last(input.form_params, &spec.name),
        ParamLocation::Body => return validate_body(spec, input.body),
    };

    match raw {
        Some(raw) => coerce(spec, &raw),
        None => absent(spec),
    }
}

/// Validate a JSON object against a declared schema.
///
/// Required fields must be present and well-typed; unknown extra fields are
/// ignored, not an error. The output is the fully-typed record: declared
/// fields that were present, plus defaults for those that were not.
pub fn validate_object(
    schema: &ObjectSchema,
    value: &Value,
) -> Result<Value, ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let Some(map) = value.as_object() else {
        errors.push("body", ParamLocation::Body, "expected a JSON object".to_string());
        return Err(errors);
    };

    let mut out = serde_json::Map::with_capacity(schema.fields.len());
    for field in &schema.fields {
        match map.get(&field.name) {
            Some(v) => {
                if let Err(reason) = check_json_type(&field.ty, v) {
                    errors.push(&field.name, ParamLocation::Body, reason);
                } else {
                    out.insert(field.name.clone(), v.clone());
                }
            }
            None if field.required => {
                errors.push(&field.name, ParamLocation::Body, "field required".to_string());
            }
            None => {
                if let Some(default) = &field.default {
                    out.insert(field.name.clone(), default.clone());
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(Value::Object(out))
    } else {
        Err(errors)
    }
}

fn validate_body(spec: &ParamSpec, body: Option<&Value>) -> Result<Value, String> {
    match body {
        Some(value) => Ok(value.clone()),
        None => absent(spec),
    }
}

/// Resolution for an absent parameter: default, then required check.
///
/// Declared defaults are taken as-is; constraints apply to caller input only.
fn absent(spec: &ParamSpec) -> Result<Value, String> {
    if let Some(default) = &spec.default {
        return Ok(default.clone());
    }
    if spec.required {
        return Err("field required".to_string());
    }
    Ok(Value::Null)
}

/// Coerce a raw string into the declared type, then apply constraints.
fn coerce(spec: &ParamSpec, raw: &str) -> Result<Value, String> {
    match &spec.ty {
        ParamType::String => {
            check_string(&spec.constraints, raw)?;
            Ok(Value::String(raw.to_string()))
        }
        ParamType::Integer => raw
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("value is not a valid integer: {raw:?}")),
        ParamType::Float => raw
            .parse::<f64>()
            .map(Value::from)
            .map_err(|_| format!("value is not a valid number: {raw:?}")),
        ParamType::Boolean => parse_bool(raw)
            .map(Value::from)
            .ok_or_else(|| format!("value is not a valid boolean: {raw:?}")),
        ParamType::Enum(allowed) => {
            if allowed.iter().any(|a| a == raw) {
                Ok(Value::String(raw.to_string()))
            } else {
                Err(format!(
                    "value is not one of the permitted values: {raw:?} (expected one of {allowed:?})"
                ))
            }
        }
        // Handled by the occurrence-collecting branch in validate_param.
        ParamType::StringList => Ok(Value::Array(vec![Value::String(raw.to_string())])),
    }
}

fn check_string(constraints: &crate::meta::Constraints, raw: &str) -> Result<(), String> {
    let len = raw.chars().count();
    if let Some(min) = constraints.min_length {
        if len < min {
            return Err(format!("string is shorter than {min} characters"));
        }
    }
    if let Some(max) = constraints.max_length {
        if len > max {
            return Err(format!("string is longer than {max} characters"));
        }
    }
    if let Some(pattern) = &constraints.pattern {
        if !pattern.is_match(raw) {
            return Err(format!("string does not match pattern {:?}", pattern.as_str()));
        }
    }
    Ok(())
}

/// Fixed truthy/falsy token set, ASCII case-insensitive.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn check_json_type(ty: &ParamType, value: &Value) -> Result<(), String> {
    let ok = match ty {
        ParamType::String => value.is_string(),
        ParamType::Integer => value.is_i64() || value.is_u64(),
        ParamType::Float => value.is_number(),
        ParamType::Boolean => value.is_boolean(),
        ParamType::Enum(allowed) => value
            .as_str()
            .map(|s| allowed.iter().any(|a| a == s))
            .unwrap_or(false),
        ParamType::StringList => value
            .as_array()
            .map(|items| items.iter().all(Value::is_string))
            .unwrap_or(false),
    };
    if ok {
        Ok(())
    } else {
        Err(format!("unexpected type for declared {ty:?}"))
    }
}

fn collect<'a>(pairs: &'a [(String, String)], name: &str) -> Vec<&'a str> {
    pairs
        .iter()
        .filter(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
        .collect()
}

fn last(pairs: &[(String, String)], name: &str) -> Option<String> {
    pairs
        .iter()
        .rfind(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
}

/// Last-write-wins lookup matching the route table's capture order.
fn spec_path_value(params: &ParamVec, name: &str) -> Option<String> {
    params
        .iter()
        .rfind(|(k, _)| k.as_ref() == name)
        .map(|(_, v)| v.clone())
}
