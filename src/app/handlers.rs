//! Endpoint handlers for the demo service.
//!
//! Handlers receive already-validated, typed parameters and return either a
//! response or a [`HandlerError`] for the central error mapper. A validated
//! parameter that is somehow missing from the map is a wiring bug, surfaced
//! as a mapped 500 rather than a panic.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;

use super::AppContext;
use crate::dispatcher::{HandlerRequest, HandlerResponse, HandlerResult};
use crate::errors::HandlerError;

const QUERY_PROMPT: &str = "Please input q by Get method";

fn required_str(req: &HandlerRequest, name: &str) -> Result<String, HandlerError> {
    req.param_str(name)
        .map(str::to_string)
        .ok_or_else(|| HandlerError::http(500, "missing validated parameter"))
}

pub fn root(_req: HandlerRequest) -> HandlerResult {
    Ok(HandlerResponse::json(
        200,
        json!({ "message": "good", "status": 200 }),
    ))
}

pub fn not_found_page(_req: HandlerRequest) -> HandlerResult {
    Ok(HandlerResponse::json(200, json!({ "Not found": "路由错误" })))
}

pub fn fixed_message(_req: HandlerRequest) -> HandlerResult {
    Ok(HandlerResponse::json(
        200,
        json!({ "message": "haha", "status": 200 }),
    ))
}

pub fn number_prompt(_req: HandlerRequest) -> HandlerResult {
    Ok(HandlerResponse::json(
        200,
        json!({ "message": "you should input a number", "status": 200 }),
    ))
}

pub fn echo_number(req: HandlerRequest) -> HandlerResult {
    let id = req
        .param_i64("id")
        .ok_or_else(|| HandlerError::http(500, "missing validated parameter"))?;
    Ok(HandlerResponse::json(
        200,
        json!({ "message": id, "status": 200 }),
    ))
}

pub fn echo_query(req: HandlerRequest) -> HandlerResult {
    match req.param_str("q") {
        None => Ok(HandlerResponse::text(QUERY_PROMPT)),
        Some(q) => Ok(HandlerResponse::json(
            200,
            json!({ "message": q, "status": 200 }),
        )),
    }
}

pub fn echo_query_with_id(req: HandlerRequest) -> HandlerResult {
    let id = required_str(&req, "id")?;
    match req.param_str("q") {
        None => Ok(HandlerResponse::text(QUERY_PROMPT)),
        Some(q) => Ok(HandlerResponse::json(
            200,
            json!({ "message": q, "id": id, "status": 200 }),
        )),
    }
}

pub fn echo_form(req: HandlerRequest) -> HandlerResult {
    match req.param_str("q") {
        None => Ok(HandlerResponse::text(QUERY_PROMPT)),
        Some(q) => Ok(HandlerResponse::json(
            200,
            json!({ "message": q, "status": 200 }),
        )),
    }
}

pub fn choose_city(req: HandlerRequest) -> HandlerResult {
    let id = required_str(&req, "id")?;
    if id == "beijing" {
        Ok(HandlerResponse::text("your choose is beijing"))
    } else {
        Ok(HandlerResponse::text("other"))
    }
}

fn user_listing() -> Value {
    json!({ "item": [ { "user1": "Admiewang" }, { "user2": "dzy" } ] })
}

pub fn constrained_query(req: HandlerRequest) -> HandlerResult {
    let mut result = user_listing();
    if let Some(q) = req.param_str("q").filter(|q| !q.is_empty()) {
        result["q"] = json!(q);
    }
    Ok(HandlerResponse::json(200, result))
}

pub fn repeated_query(req: HandlerRequest) -> HandlerResult {
    let mut result = user_listing();
    if let Some(values) = req.param_list("q").filter(|v| !v.is_empty()) {
        result["q"] = json!(values);
    }
    Ok(HandlerResponse::json(200, result))
}

pub fn echo_user_agent(req: HandlerRequest) -> HandlerResult {
    let user_agent = req.param("user-agent").cloned().unwrap_or(Value::Null);
    Ok(HandlerResponse::json(
        200,
        json!({ "message": user_agent, "status": 200 }),
    ))
}

pub fn buy_item(ctx: &AppContext, req: HandlerRequest) -> HandlerResult {
    let item_id = required_str(&req, "item_id")?;
    // The enum routing filter guarantees membership; a miss here means the
    // store and the route declaration drifted apart.
    let item = ctx
        .items
        .get(&item_id)
        .ok_or_else(|| HandlerError::http(500, "item missing from store"))?;
    let body = serde_json::to_value(item)
        .map_err(|_| HandlerError::http(500, "failed to serialize item"))?;
    Ok(HandlerResponse::json(200, body))
}

pub fn welcome_strict(req: HandlerRequest) -> HandlerResult {
    let id = required_str(&req, "id")?;
    if id == "xing" {
        Ok(HandlerResponse::json(
            200,
            json!({ "message": "welcome", "status": 200 }),
        ))
    } else {
        Err(HandlerError::http_with_headers(
            404,
            "you are wrong",
            vec![("X-Error".to_string(), "Error".to_string())],
        ))
    }
}

pub fn welcome_custom(req: HandlerRequest) -> HandlerResult {
    let id = required_str(&req, "id")?;
    if id == "xing" {
        Ok(HandlerResponse::json(
            200,
            json!({ "message": "welcome", "status": 200 }),
        ))
    } else {
        Err(HandlerError::denied(&id))
    }
}

pub fn schedule_notification(ctx: &AppContext, req: HandlerRequest) -> HandlerResult {
    let email = required_str(&req, "email")?;
    let log = Arc::clone(&ctx.notify_log);
    req.tasks.add(move || {
        if let Err(e) = log.notify(&email, "haha") {
            warn!(error = %e, "notification write failed");
        }
    });
    Ok(HandlerResponse::json(
        200,
        json!({ "message": "over", "status": 200 }),
    ))
}

pub fn render_index(ctx: &AppContext, req: HandlerRequest) -> HandlerResult {
    // `email` is required by the route contract but the page itself is
    // static, matching the original template endpoint.
    required_str(&req, "email")?;
    let html = ctx
        .templates
        .render("item/index.html", &json!({}))
        .map_err(|e| {
            warn!(error = %e, "template rendering failed");
            HandlerError::http(500, "template rendering failed")
        })?;
    Ok(HandlerResponse::html(html))
}

pub fn health(_req: HandlerRequest) -> HandlerResult {
    Ok(HandlerResponse::json(200, json!({ "status": "OK" })))
}
