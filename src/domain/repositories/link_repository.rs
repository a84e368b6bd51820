//! Repository trait for short link data access.

use crate::domain::entities::{Link, LinkPreview, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for the durable link store.
///
/// The store enforces a unique index on `short_code`; the short code is
/// immutable after creation.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryLinkRepository`] - in-memory implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new short link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code already exists.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link by its short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Link))` if found
    /// - `Ok(None)` if not found
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_code(&self, short_code: &str) -> Result<Option<Link>, AppError>;

    /// Checks whether a short code is already taken.
    ///
    /// Used by the collision check during code generation; cheaper than a
    /// full row fetch.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn exists(&self, short_code: &str) -> Result<bool, AppError>;

    /// Attaches preview metadata to an existing link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link matches `short_code`.
    /// Returns [`AppError::Internal`] on database errors.
    async fn set_preview(&self, short_code: &str, preview: LinkPreview) -> Result<(), AppError>;
}
