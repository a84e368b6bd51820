//! Shared helpers: code derivation and user-agent classification.

pub mod code_generator;
pub mod user_agent;
