//! Repository traits decoupling the domain from storage backends.

mod event_repository;
mod link_repository;

pub use event_repository::{
    EventRepository, LocationCount, Overview, ReferrerCount, TimelineBucket,
};
pub use link_repository::LinkRepository;

#[cfg(test)]
pub use event_repository::MockEventRepository;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
