//! Coroutine-based request handler dispatch.
//!
//! Each handler runs in its own `may` coroutine and receives requests over
//! an MPSC channel. Handlers return `Result<HandlerResponse, HandlerError>`;
//! errors are mapped centrally by [`crate::errors::map_handler_error`] and
//! panics are caught and converted to 500 responses, so one failing handler
//! never takes the server down.

mod core;

pub use core::{
    Dispatcher, HandlerRequest, HandlerResponse, HandlerResult, HandlerSender, HeaderVec,
    MAX_INLINE_HEADERS,
};
