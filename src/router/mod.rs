//! Path matching and route resolution.
//!
//! The route table is built once at startup from [`RouteMeta`](crate::meta::RouteMeta)
//! registrations and is read-only afterwards. Path patterns are compiled to
//! regexes at registration time; resolution is a linear scan in registration
//! order, so the first registered route wins on overlapping patterns.

mod core;

pub use core::{ParamVec, RouteMatch, RouteTable, MAX_INLINE_PARAMS};
