//! Route declarations for the demo service.

use http::Method;
use serde_json::json;

use super::model::item_schema;
use crate::errors::ConfigError;
use crate::meta::{ParamSpec, ParamType, ResponseMeta, RouteMeta};
use crate::router::RouteTable;

/// Build the full route table. Called once at startup.
pub fn build_table() -> Result<RouteTable, ConfigError> {
    let mut table = RouteTable::new();

    table.register(RouteMeta::new(Method::GET, "/", "root"))?;
    table.register(RouteMeta::new(Method::GET, "/Not_found", "not_found_page"))?;
    table.register(RouteMeta::new(Method::GET, "/a", "fixed_message"))?;
    table.register(RouteMeta::new(Method::GET, "/b", "number_prompt"))?;
    table.register(
        RouteMeta::new(Method::GET, "/b/{id}", "echo_number")
            .param(ParamSpec::path("id", ParamType::Integer)),
    )?;
    table.register(
        RouteMeta::new(Method::GET, "/c", "echo_query")
            .param(ParamSpec::query("q", ParamType::String).optional()),
    )?;
    table.register(
        RouteMeta::new(Method::GET, "/c/{id}", "echo_query_with_id")
            .param(ParamSpec::path("id", ParamType::String))
            .param(ParamSpec::query("q", ParamType::String).optional()),
    )?;
    table.register(
        RouteMeta::new(Method::POST, "/d", "echo_form")
            .param(ParamSpec::form("q", ParamType::String).optional()),
    )?;
    table.register(
        RouteMeta::new(Method::GET, "/e/{id}", "choose_city").param(ParamSpec::path(
            "id",
            ParamType::enumeration(["beijing", "nanjing", "shanghai"]),
        )),
    )?;
    table.register(
        RouteMeta::new(Method::GET, "/f", "constrained_query").param(
            ParamSpec::query("q", ParamType::String)
                .default_value(json!("默认值"))
                .min_length(3)
                .max_length(8)
                .pattern("^haha"),
        ),
    )?;
    table.register(
        RouteMeta::new(Method::GET, "/g", "repeated_query")
            .param(ParamSpec::query("q", ParamType::StringList).optional()),
    )?;
    table.register(
        RouteMeta::new(Method::GET, "/h", "echo_user_agent")
            .param(ParamSpec::header("user-agent").optional()),
    )?;
    table.register(
        RouteMeta::new(Method::GET, "/buy/{item_id}", "buy_item")
            .param(ParamSpec::path(
                "item_id",
                ParamType::enumeration(["sp1", "sp2", "sp3"]),
            ))
            .response(ResponseMeta {
                schema: Some(item_schema()),
                exclude_unset: true,
            }),
    )?;
    table.register(
        RouteMeta::new(Method::GET, "/i", "forced_not_found")
            .param(ParamSpec::header("user-agent").optional())
            .status(404),
    )?;
    table.register(
        RouteMeta::new(Method::POST, "/j/{id}", "welcome_strict")
            .param(ParamSpec::path("id", ParamType::String)),
    )?;
    table.register(
        RouteMeta::new(Method::POST, "/k/{id}", "welcome_custom")
            .param(ParamSpec::path("id", ParamType::String)),
    )?;
    table.register(
        RouteMeta::new(Method::GET, "/email", "schedule_notification")
            .param(ParamSpec::query("email", ParamType::String)),
    )?;
    table.register(
        RouteMeta::new(Method::GET, "/moban", "render_index")
            .param(ParamSpec::query("email", ParamType::String)),
    )?;
    table.register(RouteMeta::new(Method::GET, "/health", "health"))?;

    table.log_summary();
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_builds_and_covers_the_surface() {
        let table = build_table().unwrap();
        assert_eq!(table.len(), 18);
        assert!(table.resolve(&Method::GET, "/health").is_some());
        assert!(table.resolve(&Method::POST, "/j/xing").is_some());
        assert!(table.resolve(&Method::GET, "/buy/sp1").is_some());
        assert!(table.resolve(&Method::GET, "/buy/sp9").is_none());
    }
}
