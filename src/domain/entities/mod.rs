//! Core business entities.

mod event;
mod link;

pub use event::{EventKind, NewEvent};
pub use link::{Link, LinkPreview, NewLink};
