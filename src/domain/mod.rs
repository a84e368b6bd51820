//! Domain layer: entities, repository traits, and the visit queue.

pub mod entities;
pub mod repositories;
pub mod visit_event;
pub mod visit_worker;
