use serde::{Deserialize, Serialize};

/// Snapshot brut tel que reçu de l'upstream. Consommé immédiatement par le
/// normaliseur, jamais conservé.
///
/// `servers` reste optionnel : un payload JSON valide mais sans liste de
/// serveurs est détecté par le normaliseur, pas par la désérialisation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSnapshot {
    #[serde(default)]
    pub servers: Option<Vec<RawServerEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawServerEntry {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub last_active: Option<String>,
    #[serde(default)]
    pub host: RawHostInfo,
    #[serde(default)]
    pub state: RawStateInfo,
}

/// Capacités de la machine. `disk_used` peut se trouver ici ou dans
/// [`RawStateInfo`] selon la version de l'upstream, voir le normaliseur.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHostInfo {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub mem_total: u64,
    #[serde(default)]
    pub disk_total: u64,
    #[serde(default)]
    pub disk_used: Option<u64>,
}

/// Métriques instantanées (dernier heartbeat reçu par l'upstream).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStateInfo {
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub mem_used: u64,
    #[serde(default)]
    pub disk_used: Option<u64>,
    #[serde(default)]
    pub net_in_speed: u64,
    #[serde(default)]
    pub net_out_speed: u64,
}

/// Vue dérivée d'un serveur en ligne, figée à la génération du rapport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerReport {
    pub id: u64,
    pub name: String,
    pub platform: String,
    pub cpu_usage: f64,
    #[serde(rename = "memory_usage")]
    pub memory_usage_pct: f64,
    pub disk_total_gb: f64,
    #[serde(rename = "disk_usage")]
    pub disk_usage_pct: f64,
    pub upload_speed_kb: f64,
    pub download_speed_kb: f64,
}

/// Rapport de flotte complet, remplacé en bloc à chaque refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetReport {
    pub timestamp: String, // RFC3339 pour l'API
    pub total_servers: usize,
    pub online_servers: usize,
    pub offline_servers: usize,
    pub servers: Vec<ServerReport>,
}
