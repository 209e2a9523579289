/**
 * CACHE MANAGER - Dernier rapport de flotte + décision de refresh
 *
 * RÔLE : Servir le rapport courant sans marteler l'upstream. Un rapport de
 * moins de 30s (configurable) est servi tel quel ; sinon un refresh est
 * tenté, et en cas d'échec on dégrade vers le dernier rapport connu.
 *
 * FONCTIONNEMENT : Tout le chemin vérification + refresh tient sous un seul
 * Mutex tokio. Les requêtes concurrentes pendant un refresh attendent sur le
 * verrou et retrouvent un cache frais : un seul fetch upstream par fenêtre
 * de staleness, quel que soit le burst de requêtes.
 */

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::fetch::SnapshotSource;
use crate::models::FleetReport;
use crate::normalize::normalize;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("no data available")]
    NoDataAvailable,
}

/// Dernier rapport généré + date du dernier fetch réussi. Remplacé en bloc,
/// jamais muté champ par champ.
#[derive(Default)]
struct CacheState {
    report: Option<FleetReport>,
    fetched_at: Option<OffsetDateTime>,
}

pub struct ReportCache {
    state: Mutex<CacheState>,
    source: Arc<dyn SnapshotSource + Send + Sync>,
    ttl: Duration,
    online_window: Duration,
}

impl ReportCache {
    pub fn new(
        source: Arc<dyn SnapshotSource + Send + Sync>,
        ttl: Duration,
        online_window: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            source,
            ttl,
            online_window,
        }
    }

    /// Rapport courant : le cache s'il est frais (borne incluse), sinon un
    /// refresh. En cas d'échec du refresh, le rapport précédent est servi
    /// tel quel ; s'il n'y en a jamais eu, NoDataAvailable.
    pub async fn get_report(&self, now: OffsetDateTime) -> Result<FleetReport, CacheError> {
        let mut state = self.state.lock().await;

        if let (Some(report), Some(fetched_at)) = (&state.report, state.fetched_at) {
            if now - fetched_at <= self.ttl {
                return Ok(report.clone());
            }
        }

        match self.refresh(now).await {
            Ok(report) => {
                // remplacement atomique : rapport + horodatage ensemble,
                // uniquement sur succès complet
                state.report = Some(report.clone());
                state.fetched_at = Some(now);
                info!(
                    "rapport rafraîchi: {}/{} serveurs en ligne",
                    report.online_servers, report.total_servers
                );
                Ok(report)
            }
            Err(e) => match &state.report {
                Some(previous) => {
                    warn!("refresh raté ({e}), on sert le rapport précédent");
                    Ok(previous.clone())
                }
                None => {
                    warn!("refresh raté ({e}) et aucun rapport en cache");
                    Err(CacheError::NoDataAvailable)
                }
            },
        }
    }

    async fn refresh(&self, now: OffsetDateTime) -> anyhow::Result<FleetReport> {
        let raw = self.source.fetch().await?;
        Ok(normalize(&raw, now, self.online_window)?)
    }
}
