use serde::{Deserialize, Serialize};
use validator::Validate;

/// Persisted association between a slug and its source URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlMapping {
    pub slug: String,
    pub source: String,
}

/// Rolling visit counts for one slug, computed at read time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub lifetime: i64,
    pub last_24h: i64,
    pub last_7d: i64,
}

/// Request to create a short URL
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUrlRequest {
    // A missing field deserializes to "" so it is reported as a validation error
    #[serde(default)]
    #[validate(length(min = 1, message = "URL is required"))]
    pub url: String,
}

/// Response after creating a short URL
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUrlResponse {
    pub shortened_url: String,
    pub slug: String,
}

/// Query string for the stats endpoint
#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VisitCounts {
    pub last_twenty_four: i64,
    pub last_week: i64,
    pub lifetime: i64,
}

impl From<StatsSnapshot> for VisitCounts {
    fn from(snapshot: StatsSnapshot) -> Self {
        VisitCounts {
            last_twenty_four: snapshot.last_24h,
            last_week: snapshot.last_7d,
            lifetime: snapshot.lifetime,
        }
    }
}

/// Response for the stats endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub slug: String,
    pub source: String,
    pub visits: VisitCounts,
}
