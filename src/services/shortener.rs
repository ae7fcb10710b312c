use crate::error::{AppError, AppResult};
use crate::models::UrlMapping;
use crate::services::SlugGenerator;
use crate::store::{Store, StoreError};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Insert attempts per shorten call: the first insert plus one regeneration
/// after losing a check-then-insert race.
const INSERT_ATTEMPTS: u32 = 2;

/// Creates and resolves slug mappings.
#[derive(Clone)]
pub struct Shortener {
    store: Arc<dyn Store>,
    generator: SlugGenerator,
    max_url_length: usize,
}

impl Shortener {
    pub fn new(store: Arc<dyn Store>, generator: SlugGenerator, max_url_length: usize) -> Self {
        Self {
            store,
            generator,
            max_url_length,
        }
    }

    pub fn generator(&self) -> &SlugGenerator {
        &self.generator
    }

    /// Reject anything that is not a non-empty absolute http(s) URL with a host.
    pub fn validate_url(&self, raw: &str) -> AppResult<()> {
        if raw.is_empty() {
            return Err(AppError::InvalidInput("URL is required".to_string()));
        }

        if raw.len() > self.max_url_length {
            return Err(AppError::InvalidInput(format!(
                "URL exceeds {} characters",
                self.max_url_length
            )));
        }

        // The url parser silently drops tabs and newlines, but the raw string is
        // what gets stored and later sent as a Location header
        if raw.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(AppError::InvalidInput(
                "URL must not contain whitespace or control characters".to_string(),
            ));
        }

        let parsed =
            Url::parse(raw).map_err(|_| AppError::InvalidInput("Invalid URL format".to_string()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::InvalidInput(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(AppError::InvalidInput("URL must include a host".to_string()));
        }

        Ok(())
    }

    /// Shorten `url` into a fresh mapping.
    ///
    /// The source is stored exactly as given so that resolving the slug
    /// returns the caller's string unchanged.
    pub async fn shorten(&self, url: &str) -> AppResult<UrlMapping> {
        self.validate_url(url)?;

        for attempt in 1..=INSERT_ATTEMPTS {
            let slug = self.generator.generate(self.store.as_ref()).await?;

            match self.store.insert_mapping(&slug, url).await {
                Ok(()) => {
                    info!(slug = %slug, "Created short link");
                    return Ok(UrlMapping {
                        slug,
                        source: url.to_string(),
                    });
                }
                Err(StoreError::DuplicateKey) => {
                    warn!(slug = %slug, attempt, "Slug claimed concurrently, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::DuplicateSlugExhausted(INSERT_ATTEMPTS))
    }

    /// Look up the source URL for a slug
    pub async fn resolve(&self, slug: &str) -> AppResult<String> {
        self.store
            .lookup_source(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(slug.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn shortener(store: MockStore) -> Shortener {
        Shortener::new(Arc::new(store), SlugGenerator::default(), 2048)
    }

    #[test]
    fn test_validate_url() {
        let shortener = shortener(MockStore::new());

        assert!(shortener.validate_url("https://www.google.com").is_ok());
        assert!(shortener.validate_url("http://localhost:3000/a?b=c").is_ok());

        for bad in ["", "asdf", "example.com", "ftp://example.com", "javascript:alert(1)"] {
            assert!(
                matches!(shortener.validate_url(bad), Err(AppError::InvalidInput(_))),
                "{bad:?} should be rejected"
            );
        }

        let long = format!("https://example.com/{}", "a".repeat(2048));
        assert!(shortener.validate_url(&long).is_err());
    }

    #[test]
    fn test_whitespace_and_control_characters_are_rejected() {
        let shortener = shortener(MockStore::new());

        for bad in [
            "https://example.com/a\nb",
            "https://example.com/a\tb",
            "https://exa\rmple.com",
            "https://example.com/a b",
            " https://example.com",
            "https://example.com/\u{7f}",
        ] {
            assert!(
                matches!(shortener.validate_url(bad), Err(AppError::InvalidInput(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_newline_url_is_not_stored() {
        // No expectations: any store call panics the mock
        let err = shortener(MockStore::new())
            .shorten("https://example.com/a\nb")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_invalid_url_never_reaches_store() {
        // No expectations: any store call panics the mock
        let err = shortener(MockStore::new()).shorten("not a url").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_duplicate_insert_triggers_one_regeneration() {
        let inserts = Arc::new(AtomicUsize::new(0));

        let mut store = MockStore::new();
        store.expect_exists_slug().times(2).returning(|_| Ok(false));
        {
            let inserts = Arc::clone(&inserts);
            store
                .expect_insert_mapping()
                .times(2)
                .returning(move |_, _| {
                    if inserts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(StoreError::DuplicateKey)
                    } else {
                        Ok(())
                    }
                });
        }

        let mapping = shortener(store).shorten("https://example.com").await.unwrap();
        assert_eq!(mapping.source, "https://example.com");
        assert_eq!(inserts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_duplicate_insert_is_exhaustion() {
        let mut store = MockStore::new();
        store.expect_exists_slug().times(2).returning(|_| Ok(false));
        store
            .expect_insert_mapping()
            .times(2)
            .returning(|_, _| Err(StoreError::DuplicateKey));

        let err = shortener(store).shorten("https://example.com").await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateSlugExhausted(_)));
    }

    #[tokio::test]
    async fn test_storage_failure_is_surfaced_without_retry() {
        let mut store = MockStore::new();
        store.expect_exists_slug().times(1).returning(|_| Ok(false));
        store
            .expect_insert_mapping()
            .times(1)
            .returning(|_, _| Err(StoreError::Unavailable("connection reset".to_string())));

        let err = shortener(store).shorten("https://example.com").await.unwrap_err();
        assert!(matches!(err, AppError::Storage(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_resolve_unknown_slug() {
        let mut store = MockStore::new();
        store.expect_lookup_source().times(1).returning(|_| Ok(None));

        let err = shortener(store).resolve("zzzzzzzz").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(slug) if slug == "zzzzzzzz"));
    }
}
