//! The demo service: a fixed set of endpoints exercising routing, parameter
//! validation, error mapping, background tasks, CORS, static files and
//! templated HTML.

pub mod handlers;
pub mod model;
pub mod registry;
pub mod routes;

use std::collections::HashMap;
use std::sync::Arc;

use crate::background::NotificationLog;
use crate::static_files::Templates;

/// Shared, read-only state handed to stateful handlers at registration.
pub struct AppContext {
    pub items: HashMap<String, model::Item>,
    pub templates: Templates,
    pub notify_log: Arc<NotificationLog>,
}

impl AppContext {
    pub fn new(templates: Templates, notify_log: Arc<NotificationLog>) -> Self {
        Self {
            items: model::item_store(),
            templates,
            notify_log,
        }
    }
}
