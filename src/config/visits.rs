use serde::Deserialize;

/// Background visit recording
#[derive(Debug, Clone, Deserialize)]
pub struct VisitConfig {
    /// Capacity of the queue between redirect handlers and the visit worker
    pub queue_capacity: usize,

    /// Retries for a visit that failed to persist
    pub max_retries: u32,

    /// Delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl VisitConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("VISIT_QUEUE_CAPACITY must be greater than 0".to_string());
        }

        Ok(())
    }
}
