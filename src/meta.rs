//! Declarative route and parameter contracts.
//!
//! A [`RouteMeta`] binds an HTTP method and path pattern to a handler name
//! plus the parameter and response contracts the dispatcher enforces. Route
//! metadata is built once at startup, registered with the route table, and
//! never mutated afterwards.

use http::Method;
use regex::Regex;
use serde_json::Value;

/// Where a request parameter is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Form,
    Body,
}

impl std::fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamLocation::Path => write!(f, "path"),
            ParamLocation::Query => write!(f, "query"),
            ParamLocation::Header => write!(f, "header"),
            ParamLocation::Form => write!(f, "form"),
            ParamLocation::Body => write!(f, "body"),
        }
    }
}

/// Declared type of a request parameter or schema field.
///
/// `Enum` carries the closed set of accepted string values. For path
/// parameters the route table also uses it as a routing filter: a captured
/// segment outside the set means the route does not match at all.
#[derive(Debug, Clone)]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
    Enum(Vec<String>),
    StringList,
}

impl ParamType {
    pub fn enumeration<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        ParamType::Enum(values.into_iter().map(Into::into).collect())
    }
}

/// String constraints checked by the validator.
///
/// `pattern` is applied as written; callers anchor it themselves (the demo
/// uses an anchored prefix such as `^haha`).
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
}

/// Declarative constraint set for one request parameter.
///
/// A required parameter with no default must be present and valid or the
/// request is rejected before the handler runs; an absent optional parameter
/// resolves to its default (or JSON null).
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub location: ParamLocation,
    pub ty: ParamType,
    pub required: bool,
    pub default: Option<Value>,
    pub constraints: Constraints,
}

impl ParamSpec {
    pub fn new(name: &str, location: ParamLocation, ty: ParamType) -> Self {
        Self {
            name: name.to_string(),
            location,
            ty,
            required: true,
            default: None,
            constraints: Constraints::default(),
        }
    }

    pub fn path(name: &str, ty: ParamType) -> Self {
        Self::new(name, ParamLocation::Path, ty)
    }

    pub fn query(name: &str, ty: ParamType) -> Self {
        Self::new(name, ParamLocation::Query, ty)
    }

    pub fn header(name: &str) -> Self {
        Self::new(name, ParamLocation::Header, ParamType::String)
    }

    pub fn form(name: &str, ty: ParamType) -> Self {
        Self::new(name, ParamLocation::Form, ty)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set a default value; a defaulted parameter is implicitly optional.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self.required = false;
        self
    }

    pub fn min_length(mut self, len: usize) -> Self {
        self.constraints.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.constraints.max_length = Some(len);
        self
    }

    /// Attach a regex constraint. Panics on an invalid pattern, which is a
    /// startup-time programming error, never reachable from request data.
    #[allow(clippy::panic)]
    pub fn pattern(mut self, pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(re) => self.constraints.pattern = Some(re),
            Err(e) => panic!("invalid parameter pattern {pattern:?}: {e}"),
        }
        self
    }
}

/// One field of an [`ObjectSchema`].
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub ty: ParamType,
    pub required: bool,
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn required(name: &str, ty: ParamType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, ty: ParamType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: false,
            default: None,
        }
    }

    pub fn defaulted(name: &str, ty: ParamType, default: Value) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: false,
            default: Some(default),
        }
    }
}

/// A named record type with typed, possibly-defaulted fields.
///
/// Used both for form/body input validation and as the response schema
/// driving exclude-unset serialization.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    pub fields: Vec<FieldSpec>,
}

impl ObjectSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// Fill declared defaults into fields the producer never set.
    ///
    /// This is the non-exclude-unset serialization path: a sparse record
    /// gains its defaulted fields; explicitly set fields are left alone.
    /// Non-object values pass through untouched.
    pub fn apply_defaults(&self, body: &mut Value) {
        let Some(map) = body.as_object_mut() else {
            return;
        };
        for field in &self.fields {
            if map.contains_key(&field.name) {
                continue;
            }
            if let Some(default) = &field.default {
                map.insert(field.name.clone(), default.clone());
            }
        }
    }
}

/// Response contract for a route.
#[derive(Debug, Clone)]
pub struct ResponseMeta {
    pub schema: Option<ObjectSchema>,
    /// Omit fields the handler's data source never set, even where the
    /// schema declares a default.
    pub exclude_unset: bool,
}

/// A (method, path pattern) binding to a handler and its contracts.
#[derive(Debug, Clone)]
pub struct RouteMeta {
    pub method: Method,
    /// Ordered literal/variable segments, e.g. `/b/{id}`.
    pub path_pattern: String,
    pub handler_name: String,
    pub params: Vec<ParamSpec>,
    pub response: Option<ResponseMeta>,
    /// Fixed status applied to successful handler responses, for routes that
    /// declare a non-200 status while still returning a body.
    pub status: Option<u16>,
}

impl RouteMeta {
    pub fn new(method: Method, path_pattern: &str, handler_name: &str) -> Self {
        Self {
            method,
            path_pattern: path_pattern.to_string(),
            handler_name: handler_name.to_string(),
            params: Vec::new(),
            response: None,
            status: None,
        }
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn response(mut self, meta: ResponseMeta) -> Self {
        self.response = Some(meta);
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Path parameter specs, in declaration order.
    pub fn path_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params
            .iter()
            .filter(|p| p.location == ParamLocation::Path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn apply_defaults_fills_only_unset_fields() {
        let schema = ObjectSchema::new(vec![
            FieldSpec::required("name", ParamType::String),
            FieldSpec::defaulted("tax", ParamType::Float, json!(10.1)),
            FieldSpec::defaulted("tags", ParamType::StringList, json!([])),
        ]);
        let mut body = json!({ "name": "sp2", "tax": 9.8 });
        schema.apply_defaults(&mut body);
        assert_eq!(body, json!({ "name": "sp2", "tax": 9.8, "tags": [] }));
    }

    #[test]
    fn apply_defaults_ignores_non_objects() {
        let schema = ObjectSchema::new(vec![FieldSpec::defaulted(
            "tax",
            ParamType::Float,
            json!(10.1),
        )]);
        let mut body = json!("plain string");
        schema.apply_defaults(&mut body);
        assert_eq!(body, json!("plain string"));
    }

    #[test]
    fn defaulted_params_are_optional() {
        let spec = ParamSpec::query("q", ParamType::String).default_value(json!("fallback"));
        assert!(!spec.required);
        assert_eq!(spec.default, Some(json!("fallback")));
    }
}
