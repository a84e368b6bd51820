//! Link creation and cache-aside resolution service.

use std::sync::Arc;

use crate::domain::entities::{Link, LinkPreview, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::{derive_code, random_salt, validate_custom_alias};
use serde_json::json;
use url::Url;

/// Service for creating and resolving shortened links.
///
/// Owns the redirect cache entries: the resolve path populates them
/// (cache-aside) and every mutation path invalidates them synchronously
/// before it is acknowledged.
pub struct LinkService {
    link_repository: Arc<dyn LinkRepository>,
    cache: Arc<dyn CacheService>,
    code_length: usize,
    max_attempts: usize,
}

impl LinkService {
    /// Creates a new link service.
    ///
    /// `code_length` and `max_attempts` bound generated codes and the
    /// collision-retry loop respectively.
    pub fn new(
        link_repository: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        code_length: usize,
        max_attempts: usize,
    ) -> Self {
        Self {
            link_repository,
            cache,
            code_length,
            max_attempts,
        }
    }

    /// Creates a short link.
    ///
    /// # Code Selection
    ///
    /// - With `custom_alias`: the alias is validated and checked once for
    ///   collision; an occupied alias is a [`AppError::Conflict`] with no
    ///   retry and no auto-suffixing.
    /// - Without: a salted-hash code is generated with bounded collision
    ///   retries (see [`Self::generate_unique_code`]).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for malformed URLs or aliases,
    /// [`AppError::Conflict`] for taken aliases, and
    /// [`AppError::ExhaustedRetries`] when generation runs out of attempts.
    pub async fn create_short_link(
        &self,
        destination_url: String,
        custom_alias: Option<String>,
        owner_id: Option<String>,
    ) -> Result<Link, AppError> {
        let destination_url = validate_destination(&destination_url)?;

        let short_code = if let Some(alias) = custom_alias {
            validate_custom_alias(&alias)?;

            if self.link_repository.exists(&alias).await? {
                return Err(AppError::conflict(
                    "Custom alias is not available",
                    json!({ "alias": alias }),
                ));
            }

            alias
        } else {
            self.generate_unique_code(&destination_url).await?
        };

        let new_link = NewLink {
            short_code,
            destination_url,
            owner_id,
            has_qr: false,
        };

        self.link_repository.create(new_link).await
    }

    /// Resolves a short code to its destination URL (cache-aside).
    ///
    /// Cache hit returns immediately with no store touch. Cache miss reads
    /// the durable store and repopulates the cache in a detached task, so
    /// the redirect is never blocked on the cache write; the repopulation
    /// is idempotent and safe to race. Negative results are not cached.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is absent from both cache
    /// and store. Cache failures degrade to a store read.
    pub async fn resolve(&self, short_code: &str) -> Result<String, AppError> {
        match self.cache.get_url(short_code).await {
            Ok(Some(destination_url)) => return Ok(destination_url),
            Ok(None) => {}
            Err(e) => {
                tracing::error!(short_code, error = %e, "cache read failed, falling back to store");
            }
        }

        let link = self.get_link(short_code).await?;

        let cache = self.cache.clone();
        let code = short_code.to_string();
        let destination = link.destination_url.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.set_url(&code, &destination, None).await {
                tracing::error!(short_code = %code, error = %e, "failed to cache URL");
            }
        });

        Ok(link.destination_url)
    }

    /// Retrieves the full link record for a short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link matches the code.
    pub async fn get_link(&self, short_code: &str) -> Result<Link, AppError> {
        self.link_repository
            .find_by_code(short_code)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    "Short link not found",
                    json!({ "short_code": short_code }),
                )
            })
    }

    /// Attaches preview metadata to a link and invalidates its cache entry
    /// before returning, keeping the mutation rule uniform across edits.
    pub async fn attach_preview(
        &self,
        short_code: &str,
        preview: LinkPreview,
    ) -> Result<(), AppError> {
        self.link_repository.set_preview(short_code, preview).await?;

        if let Err(e) = self.cache.invalidate(short_code).await {
            tracing::warn!(short_code, error = %e, "cache invalidation failed");
        }

        Ok(())
    }

    /// Generates a unique short code with bounded collision retry.
    ///
    /// Each attempt hashes the destination URL with a fresh salt; a
    /// collision redraws the salt. The loop is explicitly bounded so
    /// pathological inputs surface [`AppError::ExhaustedRetries`] instead
    /// of recursing forever.
    async fn generate_unique_code(&self, destination_url: &str) -> Result<String, AppError> {
        for _ in 0..self.max_attempts {
            let code = derive_code(destination_url, &random_salt(), self.code_length);

            if !self.link_repository.exists(&code).await? {
                return Ok(code);
            }

            tracing::debug!(code, "short-code collision, redrawing salt");
        }

        Err(AppError::exhausted_retries(
            "Failed to generate unique code",
            json!({ "attempts": self.max_attempts }),
        ))
    }
}

/// Validates and normalizes a destination URL.
///
/// Only absolute http/https URLs are accepted.
fn validate_destination(raw: &str) -> Result<String, AppError> {
    let parsed = Url::parse(raw).map_err(|e| {
        AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::bad_request(
            "Destination URL must be http or https",
            json!({ "scheme": parsed.scheme() }),
        ));
    }

    Ok(parsed.to_string())
}
