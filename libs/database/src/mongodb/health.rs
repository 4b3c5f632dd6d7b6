use mongodb::{bson::doc, Client};
use std::time::Instant;
use tracing::{debug, warn};

/// Health status for a MongoDB connection
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Whether the database responded to the ping
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// How long the ping took in milliseconds
    pub response_time_ms: u64,
}

/// Check if MongoDB is reachable
///
/// Issues a `ping` command against the `admin` database. Returns `true`
/// when the server responds, `false` otherwise. Never fails.
pub async fn check_health(client: &Client) -> bool {
    match client.database("admin").run_command(doc! { "ping": 1 }).await {
        Ok(_) => {
            debug!("MongoDB health check passed");
            true
        }
        Err(e) => {
            warn!("MongoDB health check failed: {}", e);
            false
        }
    }
}

/// Check MongoDB health with timing details
///
/// Like [`check_health`] but also reports how long the ping took,
/// suitable for readiness endpoints that expose latency.
pub async fn check_health_detailed(client: &Client) -> HealthStatus {
    let start = Instant::now();

    match client.database("admin").run_command(doc! { "ping": 1 }).await {
        Ok(_) => {
            let response_time_ms = start.elapsed().as_millis() as u64;
            debug!("MongoDB health check passed in {}ms", response_time_ms);
            HealthStatus {
                healthy: true,
                message: "MongoDB is reachable".to_string(),
                response_time_ms,
            }
        }
        Err(e) => {
            let response_time_ms = start.elapsed().as_millis() as u64;
            warn!("MongoDB health check failed: {}", e);
            HealthStatus {
                healthy: false,
                message: format!("MongoDB ping failed: {}", e),
                response_time_ms,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mongodb::connect;

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_check_health() {
        let mongo_url = std::env::var("MONGODB_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let client = connect(&mongo_url).await.unwrap();
        assert!(check_health(&client).await);
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_check_health_detailed() {
        let mongo_url = std::env::var("MONGODB_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let client = connect(&mongo_url).await.unwrap();
        let status = check_health_detailed(&client).await;
        assert!(status.healthy);
        assert!(!status.message.is_empty());
    }
}
