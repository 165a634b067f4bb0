//! Core application primitives (worker runtime, ops endpoint)

pub mod http;
pub mod runtime;

pub use http::*;
pub use runtime::*;
