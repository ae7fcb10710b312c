use crate::error::{AppError, AppResult};
use crate::store::Store;
use tracing::debug;

/// Character set for generating slugs: digits and lowercase ASCII letters.
pub const SLUG_ALPHABET: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

pub const DEFAULT_SLUG_LENGTH: usize = 8;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Draws random slugs and checks them against the store.
///
/// The generator holds no state between calls. A slug it returns was free at
/// the moment of the existence check only; callers must still handle a
/// duplicate-key failure from the subsequent insert.
#[derive(Debug, Clone, Copy)]
pub struct SlugGenerator {
    length: usize,
    max_attempts: u32,
}

impl Default for SlugGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SLUG_LENGTH, DEFAULT_MAX_ATTEMPTS)
    }
}

impl SlugGenerator {
    pub fn new(length: usize, max_attempts: u32) -> Self {
        Self {
            length,
            max_attempts,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draw one candidate uniformly from the slug alphabet
    pub fn candidate(&self) -> String {
        let length = self.length;
        nanoid::nanoid!(length, SLUG_ALPHABET)
    }

    /// Generate a slug that is not present in the store.
    ///
    /// # Errors
    ///
    /// Returns `AppError::DuplicateSlugExhausted` if every one of the
    /// `max_attempts` candidates already exists, and `AppError::Storage` if
    /// the existence check itself fails.
    pub async fn generate(&self, store: &dyn Store) -> AppResult<String> {
        for attempt in 1..=self.max_attempts {
            let slug = self.candidate();

            if !store.exists_slug(&slug).await? {
                return Ok(slug);
            }

            debug!(slug = %slug, attempt, "Slug already taken, drawing another");
        }

        Err(AppError::DuplicateSlugExhausted(self.max_attempts))
    }
}

/// Whether `slug` could have been produced by a generator of `length`
pub fn is_well_formed(slug: &str, length: usize) -> bool {
    slug.len() == length && slug.chars().all(|c| SLUG_ALPHABET.contains(&c))
}
