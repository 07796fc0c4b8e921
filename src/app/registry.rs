//! Handler registration for the demo service.

use std::sync::Arc;

use super::{handlers, AppContext};
use crate::dispatcher::Dispatcher;

/// Register every demo handler with the dispatcher.
///
/// # Safety
///
/// Spawns handler coroutines via `Dispatcher::register_handler`; the May
/// runtime must be initialized before calling this.
#[allow(unsafe_code)]
pub unsafe fn register_all(dispatcher: &mut Dispatcher, ctx: Arc<AppContext>) {
    unsafe {
        dispatcher.register_handler("root", handlers::root);
        dispatcher.register_handler("not_found_page", handlers::not_found_page);
        dispatcher.register_handler("fixed_message", handlers::fixed_message);
        dispatcher.register_handler("number_prompt", handlers::number_prompt);
        dispatcher.register_handler("echo_number", handlers::echo_number);
        dispatcher.register_handler("echo_query", handlers::echo_query);
        dispatcher.register_handler("echo_query_with_id", handlers::echo_query_with_id);
        dispatcher.register_handler("echo_form", handlers::echo_form);
        dispatcher.register_handler("choose_city", handlers::choose_city);
        dispatcher.register_handler("constrained_query", handlers::constrained_query);
        dispatcher.register_handler("repeated_query", handlers::repeated_query);
        dispatcher.register_handler("echo_user_agent", handlers::echo_user_agent);
        dispatcher.register_handler("forced_not_found", handlers::echo_user_agent);
        dispatcher.register_handler("welcome_strict", handlers::welcome_strict);
        dispatcher.register_handler("welcome_custom", handlers::welcome_custom);
        dispatcher.register_handler("health", handlers::health);

        let c = Arc::clone(&ctx);
        dispatcher.register_handler("buy_item", move |req| handlers::buy_item(&c, req));
        let c = Arc::clone(&ctx);
        dispatcher.register_handler("schedule_notification", move |req| {
            handlers::schedule_notification(&c, req)
        });
        let c = Arc::clone(&ctx);
        dispatcher.register_handler("render_index", move |req| handlers::render_index(&c, req));
    }
}
