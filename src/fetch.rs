/**
 * FETCHER UPSTREAM - Récupération d'un snapshot via websocket éphémère
 *
 * RÔLE : Ouvrir une connexion vers l'endpoint distant, lire exactement un
 * message, le parser en RawSnapshot, refermer la connexion. Aucun retry ici :
 * un fetch raté est le problème du cache (qui sert alors du stale).
 *
 * FONCTIONNEMENT : Le cache dépend du trait SnapshotSource, pas du
 * transport ; les tests injectent leurs propres sources.
 */

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::debug;

use crate::models::RawSnapshot;

/// Erreurs de fetch, toutes absorbées au niveau du cache. Les erreurs du
/// transport sont converties en variantes typées, jamais re-exposées.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("upstream connect failed: {0}")]
    Connect(String),
    #[error("upstream read failed: {0}")]
    Read(String),
    #[error("upstream read timed out after {0:?}")]
    Timeout(Duration),
    #[error("upstream closed before sending a snapshot")]
    ClosedEarly,
    #[error("malformed snapshot payload: {0}")]
    Parse(#[from] serde_json::Error),
}

#[async_trait]
pub trait SnapshotSource {
    /// Récupère exactement un snapshot brut.
    async fn fetch(&self) -> Result<RawSnapshot, FetchError>;
}

/// Source réelle : une connexion websocket transiente par fetch.
pub struct WsFetcher {
    url: String,
    timeout: Duration,
}

impl WsFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    async fn read_one(&self) -> Result<RawSnapshot, FetchError> {
        let (ws, _resp) = connect_async(self.url.as_str())
            .await
            .map_err(|e| FetchError::Connect(e.to_string()))?;
        debug!("connecté à {}", self.url);

        // la connexion (sink + stream) est refermée au drop, succès ou non
        let (_sink, mut stream) = ws.split();
        while let Some(frame) = stream.next().await {
            match frame.map_err(|e| FetchError::Read(e.to_string()))? {
                Message::Text(text) => return parse_snapshot(text.as_str()),
                Message::Binary(bytes) => return Ok(serde_json::from_slice(&bytes)?),
                Message::Close(_) => break,
                // ping/pong : on attend la première trame de données
                _ => {}
            }
        }
        Err(FetchError::ClosedEarly)
    }
}

#[async_trait]
impl SnapshotSource for WsFetcher {
    async fn fetch(&self) -> Result<RawSnapshot, FetchError> {
        match tokio::time::timeout(self.timeout, self.read_one()).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }
}

fn parse_snapshot(text: &str) -> Result<RawSnapshot, FetchError> {
    Ok(serde_json::from_str(text)?)
}
