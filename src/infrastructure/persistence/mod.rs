//! Storage backends for the repository traits.

mod memory;
mod pg_event_repository;
mod pg_link_repository;

pub use memory::{MemoryEventRepository, MemoryLinkRepository};
pub use pg_event_repository::PgEventRepository;
pub use pg_link_repository::PgLinkRepository;
