//! Route table core - hot path for request routing.

use std::sync::Arc;

use http::Method;
use regex::Regex;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::errors::ConfigError;
use crate::meta::{ParamType, RouteMeta};

/// Maximum number of path parameters before heap allocation.
/// The demo routes carry at most one; real APIs rarely exceed four.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from the static route table
/// (known at startup); values are per-request data from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of successfully matching a request path to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route metadata (Arc to avoid expensive clones).
    pub route: Arc<RouteMeta>,
    /// Raw path parameters extracted from the URL (e.g. `{id}` → `("id", "123")`).
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a raw path parameter by name.
    ///
    /// Uses "last write wins" semantics: if duplicate parameter names exist
    /// at different path depths, the deepest occurrence is returned.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

struct CompiledRoute {
    method: Method,
    regex: Regex,
    param_names: Vec<Arc<str>>,
    meta: Arc<RouteMeta>,
}

/// Immutable-after-startup table mapping (method, path pattern) to routes.
///
/// Literal segments match exactly; a `{name}` segment matches any non-empty
/// single path component. A path variable declared as an enumeration also
/// acts as a routing filter: a captured value outside the declared set means
/// the route does not match, and resolution falls through to the next
/// candidate (ultimately to the not-found outcome).
#[derive(Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Register a route.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateRoute`] if the same (method, path
    /// pattern) pair was already registered.
    pub fn register(&mut self, meta: RouteMeta) -> Result<(), ConfigError> {
        if self
            .routes
            .iter()
            .any(|r| r.method == meta.method && r.meta.path_pattern == meta.path_pattern)
        {
            return Err(ConfigError::DuplicateRoute {
                method: meta.method.clone(),
                path_pattern: meta.path_pattern.clone(),
            });
        }

        let (regex, param_names) = Self::path_to_regex(&meta.path_pattern);
        debug!(
            method = %meta.method,
            pattern = %meta.path_pattern,
            handler = %meta.handler_name,
            "route registered"
        );
        self.routes.push(CompiledRoute {
            method: meta.method.clone(),
            regex,
            param_names,
            meta: Arc::new(meta),
        });
        Ok(())
    }

    /// Log a summary of the loaded table. Called once after startup.
    pub fn log_summary(&self) {
        let routes_summary: Vec<String> = self
            .routes
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.method, r.meta.path_pattern))
            .collect();
        info!(
            routes_count = self.routes.len(),
            routes_summary = ?routes_summary,
            "routing table loaded"
        );
    }

    /// Match an HTTP request to a route.
    ///
    /// Routes are tried in registration order; the first whose pattern and
    /// enum filters accept the path wins. The exact tie-break on overlapping
    /// patterns is an implementation choice; nothing registered by the demo
    /// depends on it.
    ///
    /// # Returns
    ///
    /// * `Some(RouteMatch)` - if a matching route is found
    /// * `None` - if no route matches (the not-found outcome)
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        debug!(method = %method, path = %path, "route match attempt");

        for route in &self.routes {
            if route.method != *method {
                continue;
            }
            let Some(caps) = route.regex.captures(path) else {
                continue;
            };

            let mut path_params = ParamVec::new();
            for (idx, name) in route.param_names.iter().enumerate() {
                if let Some(m) = caps.get(idx + 1) {
                    path_params.push((Arc::clone(name), m.as_str().to_string()));
                }
            }

            if !Self::enum_filters_accept(&route.meta, &path_params) {
                continue;
            }

            info!(
                method = %method,
                path = %path,
                handler = %route.meta.handler_name,
                pattern = %route.meta.path_pattern,
                path_params = ?path_params,
                "route matched"
            );
            return Some(RouteMatch {
                route: Arc::clone(&route.meta),
                path_params,
            });
        }

        warn!(method = %method, path = %path, "no route matched");
        None
    }

    fn enum_filters_accept(meta: &RouteMeta, path_params: &ParamVec) -> bool {
        for spec in meta.path_params() {
            let ParamType::Enum(allowed) = &spec.ty else {
                continue;
            };
            let captured = path_params
                .iter()
                .rfind(|(k, _)| k.as_ref() == spec.name.as_str())
                .map(|(_, v)| v.as_str());
            match captured {
                Some(value) if allowed.iter().any(|a| a == value) => {}
                _ => return false,
            }
        }
        true
    }

    /// Convert a path pattern to a regex and extract parameter names.
    ///
    /// Transforms patterns like `/b/{id}` into `^/b/([^/]+)$` with parameter
    /// names `["id"]`.
    pub(crate) fn path_to_regex(path: &str) -> (Regex, Vec<Arc<str>>) {
        if path == "/" {
            #[allow(clippy::expect_used)]
            return (
                Regex::new(r"^/$").expect("failed to compile path regex"),
                Vec::new(),
            );
        }

        let mut pattern = String::with_capacity(path.len() + 5);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(path.matches('{').count());

        for segment in path.split('/') {
            if segment.starts_with('{') && segment.ends_with('}') {
                let name = segment.trim_start_matches('{').trim_end_matches('}');
                pattern.push_str("/([^/]+)");
                param_names.push(Arc::from(name));
            } else if !segment.is_empty() {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }

        pattern.push('$');
        #[allow(clippy::expect_used)]
        let regex = Regex::new(&pattern).expect("failed to compile path regex");

        (regex, param_names)
    }
}
