use serde::Deserialize;

/// Listener address for the HTTP server
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// `host:port`, with either part overridden
    pub fn bind_addr(&self, host: Option<String>, port: Option<u16>) -> String {
        format!(
            "{}:{}",
            host.as_deref().unwrap_or(&self.host),
            port.unwrap_or(self.port)
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.host.trim().is_empty() {
            return Err("SERVER_HOST must not be empty".to_string());
        }

        Ok(())
    }
}

/// Origins allowed by the CORS layer
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// `["*"]` allows any origin
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// Parse a comma-separated `ALLOWED_ORIGINS` value
    pub fn from_list(raw: &str) -> Self {
        let allowed_origins = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self { allowed_origins }
    }

    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.allowed_origins.is_empty() {
            return Err("ALLOWED_ORIGINS must list at least one origin or '*'".to_string());
        }

        if let Some(bad) = self
            .allowed_origins
            .iter()
            .find(|o| *o != "*" && !(o.starts_with("http://") || o.starts_with("https://")))
        {
            return Err(format!("ALLOWED_ORIGINS entry '{}' must be '*' or an http(s) origin", bad));
        }

        Ok(())
    }
}
