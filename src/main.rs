/**
 * FLEETWATCH - Moniteur d'état de flotte
 *
 * RÔLE : Orchestration des modules : config, fetcher upstream, cache, API.
 * Tire un snapshot de la flotte depuis un endpoint websocket distant, le
 * normalise, le met en cache et le re-sert en JSON.
 *
 * ARCHITECTURE : fetch websocket transient -> normalisation pure -> cache
 * 30s single-flight -> API REST. Aucune erreur aval n'est fatale, seule
 * l'ouverture du port d'écoute peut arrêter le process.
 */

mod cache;
mod config;
mod fetch;
mod freshness;
mod http;
mod models;
mod normalize;

use std::net::SocketAddr;
use std::sync::Arc;

use time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::cache::ReportCache;
use crate::config::load_config;
use crate::fetch::WsFetcher;
use crate::http::AppState;

#[tokio::main]
async fn main() {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok(); // Ok si .env n'existe pas
    tracing_subscriber::fmt().init();

    let cfg = load_config().await;

    let fetcher = Arc::new(WsFetcher::new(
        cfg.upstream_url.clone(),
        std::time::Duration::from_secs(cfg.fetch_timeout_secs),
    ));
    let cache = Arc::new(ReportCache::new(
        fetcher,
        Duration::seconds(cfg.cache_ttl_secs as i64),
        Duration::hours(cfg.online_window_hours),
    ));

    let app = http::build_router(AppState { cache });

    let addr: SocketAddr = match format!("{}:{}", cfg.http_host, cfg.http_port).parse() {
        Ok(a) => a,
        Err(e) => {
            error!("adresse d'écoute invalide {}:{}: {e}", cfg.http_host, cfg.http_port);
            std::process::exit(1);
        }
    };

    // seule condition fatale : impossible d'ouvrir le port d'écoute
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("bind {addr} failed: {e}");
            std::process::exit(1);
        }
    };

    info!("fleetwatch listening on http://{addr}");
    info!("GET / ou /api pour le rapport, upstream: {}", cfg.upstream_url);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server error: {e}");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("écoute de ctrl-c impossible: {e}");
        return;
    }
    info!("arrêt demandé");
}
