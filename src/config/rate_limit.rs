use serde::Deserialize;

/// Per-client request quotas
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained requests per minute allowed on link creation
    pub requests_per_minute: u64,

    /// Requests allowed back to back before the quota applies
    pub burst_size: u32,
}

impl RateLimitConfig {
    /// Replenish interval for link creation
    pub fn strict_period_ms(&self) -> u64 {
        (60_000 / self.requests_per_minute.max(1)).max(1)
    }

    /// Redirects and stats get twice the quota
    pub fn lenient_period_ms(&self) -> u64 {
        (self.strict_period_ms() / 2).max(1)
    }

    pub fn lenient_burst_size(&self) -> u32 {
        self.burst_size.saturating_mul(2)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.requests_per_minute == 0 || self.requests_per_minute > 60_000 {
            return Err("RATE_LIMIT_PER_MINUTE must be between 1 and 60000".to_string());
        }

        if self.burst_size == 0 {
            return Err("RATE_LIMIT_BURST must be greater than 0".to_string());
        }

        Ok(())
    }
}
