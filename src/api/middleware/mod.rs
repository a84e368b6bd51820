//! HTTP middleware for request processing and observability.

pub mod tracing;
