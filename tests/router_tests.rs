//! Route table resolution over the full demo surface.

use http::Method;
use rapido::app::routes::build_table;
use rapido::router::RouteTable;

fn assert_route_match(table: &RouteTable, method: Method, path: &str, expected_handler: &str) {
    match table.resolve(&method, path) {
        Some(m) => assert_eq!(
            m.route.handler_name, expected_handler,
            "handler mismatch for {method} {path}"
        ),
        None => assert_eq!(
            expected_handler, "<none>",
            "expected a match for {method} {path}"
        ),
    }
}

#[test]
fn demo_surface_resolves() {
    let table = build_table().unwrap();
    let cases = [
        (Method::GET, "/", "root"),
        (Method::GET, "/a", "fixed_message"),
        (Method::GET, "/b", "number_prompt"),
        (Method::GET, "/b/7", "echo_number"),
        (Method::GET, "/c", "echo_query"),
        (Method::GET, "/c/abc", "echo_query_with_id"),
        (Method::POST, "/d", "echo_form"),
        (Method::GET, "/e/shanghai", "choose_city"),
        (Method::GET, "/f", "constrained_query"),
        (Method::GET, "/g", "repeated_query"),
        (Method::GET, "/h", "echo_user_agent"),
        (Method::GET, "/buy/sp2", "buy_item"),
        (Method::GET, "/i", "forced_not_found"),
        (Method::POST, "/j/xing", "welcome_strict"),
        (Method::POST, "/k/other", "welcome_custom"),
        (Method::GET, "/email", "schedule_notification"),
        (Method::GET, "/moban", "render_index"),
        (Method::GET, "/health", "health"),
        (Method::GET, "/Not_found", "not_found_page"),
        // Misses: wrong method, unknown paths, enum filters.
        (Method::POST, "/b/7", "<none>"),
        (Method::GET, "/does/not/exist", "<none>"),
        (Method::GET, "/e/tokyo", "<none>"),
        (Method::GET, "/buy/sp9", "<none>"),
    ];
    for (method, path, expected) in cases {
        assert_route_match(&table, method, path, expected);
    }
}

#[test]
fn path_params_are_captured_raw() {
    let table = build_table().unwrap();
    let m = table.resolve(&Method::GET, "/b/123").unwrap();
    assert_eq!(m.get_path_param("id"), Some("123"));

    // Routing captures the raw string even when the declared type is
    // integer; rejection happens in validation, not resolution.
    let m = table.resolve(&Method::GET, "/b/abc").unwrap();
    assert_eq!(m.get_path_param("id"), Some("abc"));
}
