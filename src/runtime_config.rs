//! Environment variable-based runtime configuration.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `RAPIDO_ADDR` | listen address | `0.0.0.0:8000` |
//! | `RAPIDO_STACK_SIZE` | coroutine stack size, decimal or `0x`-hex | `0x10000` |
//! | `RAPIDO_STATIC_DIR` | static file directory | `static` |
//! | `RAPIDO_TEMPLATE_DIR` | HTML template directory | `templates` |
//! | `RAPIDO_NOTIFY_LOG` | notification log file | `log.txt` |
//!
//! Stack size trades memory against call depth: many concurrent coroutines
//! each reserve the full amount, so tune it to handler complexity.

use std::env;

/// Runtime configuration loaded once at startup.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Listen address for the demo server.
    pub addr: String,
    /// Stack size for coroutines in bytes (default 64 KB / `0x10000`).
    pub stack_size: usize,
    /// Directory served under the `/static` mount.
    pub static_dir: String,
    /// Directory HTML templates render from.
    pub template_dir: String,
    /// Append-only notification log path.
    pub notify_log: String,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = match env::var("RAPIDO_STACK_SIZE") {
            Ok(val) => parse_stack_size(&val).unwrap_or(0x10000),
            Err(_) => 0x10000,
        };
        RuntimeConfig {
            addr: env::var("RAPIDO_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            stack_size,
            static_dir: env::var("RAPIDO_STATIC_DIR").unwrap_or_else(|_| "static".to_string()),
            template_dir: env::var("RAPIDO_TEMPLATE_DIR")
                .unwrap_or_else(|_| "templates".to_string()),
            notify_log: env::var("RAPIDO_NOTIFY_LOG").unwrap_or_else(|_| "log.txt".to_string()),
        }
    }
}

fn parse_stack_size(val: &str) -> Option<usize> {
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}
