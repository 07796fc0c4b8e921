pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_form, parse_query_params, parse_request, ParsedRequest};
pub use service::AppService;
