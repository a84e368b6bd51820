//! Infrastructure layer: storage, caching, and external lookups.

pub mod cache;
pub mod geo;
pub mod persistence;
