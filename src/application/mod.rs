//! Application layer: use-case services built on the domain traits.

pub mod services;
