use serde::Deserialize;

/// URL shortening configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UrlConfig {
    /// Base URL for constructing short URLs (e.g., "http://localhost:3000")
    pub base_url: String,

    /// Length of randomly generated slugs
    pub slug_length: usize,

    /// Maximum number of candidates drawn before giving up on a free slug
    pub slug_max_attempts: u32,

    /// Longest source URL accepted
    pub max_url_length: usize,
}

impl UrlConfig {
    /// Validate URL configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.slug_length < 4 || self.slug_length > 16 {
            return Err("SLUG_LENGTH must be between 4 and 16".to_string());
        }

        if self.slug_max_attempts < 1 || self.slug_max_attempts > 100 {
            return Err("SLUG_MAX_ATTEMPTS must be between 1 and 100".to_string());
        }

        if self.max_url_length == 0 {
            return Err("MAX_URL_LENGTH must be greater than 0".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("BASE_URL must start with http:// or https://".to_string());
        }

        Ok(())
    }
}
