//! Caching layer: redirect mappings, metrics counters, and analytics entries.
//!
//! Provides a [`CacheService`] trait with three implementations:
//! - [`RedisCache`] - Production Redis-backed cache
//! - [`MemoryCache`] - in-process cache for tests and cache-less development
//! - [`NullCache`] - No-op implementation for disabled caching

mod memory_cache;
mod null_cache;
mod redis_cache;
mod service;

pub use memory_cache::MemoryCache;
pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{
    ActivityCounters, CacheError, CacheResult, CacheService, CachedAggregates,
};
