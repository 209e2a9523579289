use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::warn;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MonitorConfig {
    /// Endpoint websocket qui fournit le snapshot de la flotte.
    pub upstream_url: String,
    pub http_host: String,
    pub http_port: u16,
    /// Âge maximal du rapport en cache avant re-fetch (secondes).
    pub cache_ttl_secs: u64,
    /// Fenêtre au-delà de laquelle un serveur compte hors ligne (heures).
    pub online_window_hours: i64,
    /// Délai maximal accordé au fetch upstream (secondes).
    pub fetch_timeout_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            upstream_url: "ws://localhost:8008/api/v1/ws/server".into(),
            http_host: "0.0.0.0".into(),
            http_port: 8080,
            cache_ttl_secs: 30,
            online_window_hours: 24,
            fetch_timeout_secs: 10,
        }
    }
}

pub async fn load_config() -> MonitorConfig {
    let path = std::env::var("FLEETWATCH_CONFIG").unwrap_or_else(|_| "fleetwatch.yaml".into());
    if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        if txt.trim().is_empty() {
            return MonitorConfig::default();
        }
        serde_yaml::from_str(&txt).unwrap_or_else(|e| {
            warn!("config invalide: {e}");
            MonitorConfig::default()
        })
    } else {
        warn!("pas de fleetwatch.yaml, usage config par défaut");
        MonitorConfig::default()
    }
}
