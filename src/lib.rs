//! # rapido
//!
//! **rapido** is a small, coroutine-powered HTTP request-dispatch and
//! validation core for Rust, built on the `may` runtime and `may_minihttp`.
//!
//! Routes are declared in code as [`meta::RouteMeta`] records: a method and
//! path pattern bound to a handler name plus the parameter and response
//! contracts the dispatcher enforces. The route table is built once at
//! startup and read-only afterwards.
//!
//! ## Architecture
//!
//! - **[`meta`]** - declarative route, parameter and schema metadata
//! - **[`router`]** - path matching and route resolution
//! - **[`validator`]** - parameter coercion and constraint checking
//! - **[`dispatcher`]** - coroutine-based handler dispatch with panic recovery
//! - **[`errors`]** - central mapping of handler failures to responses
//! - **[`background`]** - fire-and-forget task queue drained after responses
//! - **[`middleware`]** - CORS and request tracing hooks
//! - **[`server`]** - HTTP plumbing on `may_minihttp` and server lifecycle
//! - **[`static_files`]** - static serving and minijinja HTML templates
//! - **[`app`]** - the demo service wiring the whole surface together
//!
//! ## Request flow
//!
//! The service parses the raw request, resolves it against the route table,
//! validates every declared parameter, and only then invokes the handler in
//! its coroutine. Handler failures return through `Result` and are mapped
//! centrally; unmatched routes are rewritten to a fixed not-found page via
//! redirect rather than surfaced as bare 404s. Background tasks registered
//! during handling run after the response is finalized, in FIFO order, with
//! failures logged and swallowed.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use rapido::app;
//! use rapido::background::NotificationLog;
//! use rapido::dispatcher::Dispatcher;
//! use rapido::middleware::{CorsPolicy, TracingMiddleware};
//! use rapido::server::{AppService, HttpServer};
//! use rapido::static_files::Templates;
//!
//! let table = Arc::new(app::routes::build_table().unwrap());
//! let ctx = Arc::new(app::AppContext::new(
//!     Templates::new("templates"),
//!     Arc::new(NotificationLog::open("log.txt").unwrap()),
//! ));
//! let mut dispatcher = Dispatcher::new();
//! unsafe { app::registry::register_all(&mut dispatcher, ctx) };
//! let cors = Arc::new(CorsPolicy::permissive());
//! dispatcher.add_middleware(Arc::new(TracingMiddleware));
//! dispatcher.add_middleware(Arc::clone(&cors) as Arc<dyn rapido::middleware::Middleware>);
//!
//! let service = AppService::new(table, Arc::new(dispatcher))
//!     .with_cors(cors)
//!     .with_static_dir("static");
//! let server = HttpServer(service).start("0.0.0.0:8000").unwrap();
//! server.join().unwrap();
//! ```

pub mod app;
pub mod background;
pub mod dispatcher;
pub mod errors;
pub mod ids;
pub mod meta;
pub mod middleware;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod static_files;
pub mod validator;

pub use errors::{ConfigError, HandlerError};
pub use meta::{
    Constraints, FieldSpec, ObjectSchema, ParamLocation, ParamSpec, ParamType, ResponseMeta,
    RouteMeta,
};
pub use router::{RouteMatch, RouteTable};
