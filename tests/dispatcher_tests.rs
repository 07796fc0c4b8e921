//! Dispatcher behavior: channel roundtrips, central error mapping, panic
//! recovery, middleware hooks and fixed status overrides.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http::Method;
use rapido::background::BackgroundTasks;
use rapido::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse, HeaderVec};
use rapido::errors::HandlerError;
use rapido::ids::RequestId;
use rapido::meta::{ParamSpec, ParamType, RouteMeta};
use rapido::middleware::Middleware;
use rapido::router::RouteTable;
use rapido::validator::ParamMap;
use serde_json::json;

mod common;
use common::test_server::setup_may_runtime;

fn dispatch(
    dispatcher: &Dispatcher,
    table: &RouteTable,
    method: Method,
    path: &str,
    params: ParamMap,
) -> HandlerResponse {
    let route_match = table.resolve(&method, path).expect("route match");
    dispatcher
        .dispatch(
            &route_match,
            params,
            HeaderVec::new(),
            RequestId::new(),
            BackgroundTasks::new(),
        )
        .expect("dispatch")
}

#[test]
fn dispatches_to_registered_handler() {
    setup_may_runtime();
    let mut table = RouteTable::new();
    table
        .register(
            RouteMeta::new(Method::GET, "/square/{n}", "square")
                .param(ParamSpec::path("n", ParamType::Integer)),
        )
        .unwrap();

    let mut dispatcher = Dispatcher::new();
    unsafe {
        dispatcher.register_handler("square", |req: HandlerRequest| {
            let n = req.param_i64("n").unwrap_or(0);
            Ok(HandlerResponse::json(200, json!({ "result": n * n })))
        });
    }

    let mut params = ParamMap::new();
    params.insert("n".to_string(), json!(7));
    let resp = dispatch(&dispatcher, &table, Method::GET, "/square/7", params);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, json!({ "result": 49 }));
}

#[test]
fn http_errors_pass_status_detail_and_headers_through() {
    setup_may_runtime();
    let mut table = RouteTable::new();
    table
        .register(RouteMeta::new(Method::GET, "/fail", "fail"))
        .unwrap();

    let mut dispatcher = Dispatcher::new();
    unsafe {
        dispatcher.register_handler("fail", |_req| {
            Err(HandlerError::http_with_headers(
                404,
                "you are wrong",
                vec![("X-Error".to_string(), "Error".to_string())],
            ))
        });
    }

    let resp = dispatch(&dispatcher, &table, Method::GET, "/fail", ParamMap::new());
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body, json!({ "detail": "you are wrong" }));
    assert_eq!(resp.get_header("X-Error"), Some("Error"));
}

#[test]
fn denied_errors_map_to_the_fixed_401_template() {
    setup_may_runtime();
    let mut table = RouteTable::new();
    table
        .register(RouteMeta::new(Method::GET, "/deny", "deny"))
        .unwrap();

    let mut dispatcher = Dispatcher::new();
    unsafe {
        dispatcher.register_handler("deny", |_req| Err(HandlerError::denied("intruder")));
    }

    let resp = dispatch(&dispatcher, &table, Method::GET, "/deny", ParamMap::new());
    assert_eq!(resp.status, 401);
    assert_eq!(
        resp.body,
        json!({ "message": "you are wrong intruder, please go back" })
    );
}

#[test]
fn panicking_handler_returns_500_and_keeps_serving() {
    setup_may_runtime();
    let mut table = RouteTable::new();
    table
        .register(RouteMeta::new(Method::GET, "/boom", "boom"))
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let mut dispatcher = Dispatcher::new();
    let calls2 = Arc::clone(&calls);
    unsafe {
        dispatcher.register_handler("boom", move |_req| {
            if calls2.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("boom");
            }
            Ok(HandlerResponse::json(200, json!({ "ok": true })))
        });
    }

    let resp = dispatch(&dispatcher, &table, Method::GET, "/boom", ParamMap::new());
    assert_eq!(resp.status, 500);

    // The coroutine survives the panic and answers the next request.
    let resp = dispatch(&dispatcher, &table, Method::GET, "/boom", ParamMap::new());
    assert_eq!(resp.status, 200);
}

#[test]
fn fixed_status_override_applies_to_success_only() {
    setup_may_runtime();
    let mut table = RouteTable::new();
    table
        .register(RouteMeta::new(Method::GET, "/i", "forced").status(404))
        .unwrap();
    table
        .register(RouteMeta::new(Method::GET, "/i2", "forced_err").status(404))
        .unwrap();

    let mut dispatcher = Dispatcher::new();
    unsafe {
        dispatcher.register_handler("forced", |_req| {
            Ok(HandlerResponse::json(200, json!({ "status": 200 })))
        });
        dispatcher.register_handler("forced_err", |_req| {
            Err(HandlerError::http(401, "no"))
        });
    }

    let resp = dispatch(&dispatcher, &table, Method::GET, "/i", ParamMap::new());
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body, json!({ "status": 200 }));

    let resp = dispatch(&dispatcher, &table, Method::GET, "/i2", ParamMap::new());
    assert_eq!(resp.status, 401);
}

struct CountingMiddleware {
    before_calls: AtomicUsize,
    after_calls: AtomicUsize,
}

impl Middleware for CountingMiddleware {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        self.before_calls.fetch_add(1, Ordering::SeqCst);
        None
    }

    fn after(&self, _req: &HandlerRequest, res: &mut HandlerResponse, _latency: Duration) {
        self.after_calls.fetch_add(1, Ordering::SeqCst);
        res.set_header("X-Seen", "1".to_string());
    }
}

#[test]
fn middleware_hooks_wrap_dispatch() {
    setup_may_runtime();
    let mut table = RouteTable::new();
    table
        .register(RouteMeta::new(Method::GET, "/mw", "mw"))
        .unwrap();

    let counting = Arc::new(CountingMiddleware {
        before_calls: AtomicUsize::new(0),
        after_calls: AtomicUsize::new(0),
    });
    let mut dispatcher = Dispatcher::new();
    unsafe {
        dispatcher.register_handler("mw", |_req| {
            Ok(HandlerResponse::json(200, json!({ "ok": true })))
        });
    }
    dispatcher.add_middleware(Arc::clone(&counting) as Arc<dyn Middleware>);

    let resp = dispatch(&dispatcher, &table, Method::GET, "/mw", ParamMap::new());
    assert_eq!(resp.get_header("X-Seen"), Some("1"));
    assert_eq!(counting.before_calls.load(Ordering::SeqCst), 1);
    assert_eq!(counting.after_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn unregistered_handler_yields_none() {
    setup_may_runtime();
    let mut table = RouteTable::new();
    table
        .register(RouteMeta::new(Method::GET, "/ghost", "ghost"))
        .unwrap();
    let dispatcher = Dispatcher::new();
    let route_match = table.resolve(&Method::GET, "/ghost").unwrap();
    assert!(dispatcher
        .dispatch(
            &route_match,
            ParamMap::new(),
            HeaderVec::new(),
            RequestId::new(),
            BackgroundTasks::new(),
        )
        .is_none());
}
