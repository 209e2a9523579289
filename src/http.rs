/**
 * API REST FLEETWATCH - Exposition du rapport de flotte
 *
 * RÔLE : Servir le rapport courant (frais ou en cache) en JSON, consommable
 * depuis n'importe quelle origine navigateur. Lecture seule : pas de body,
 * pas de mutation, pas d'authentification.
 *
 * FONCTIONNEMENT :
 * - Serveur Axum, routes / et /api équivalentes + /health
 * - Le cache injecté via AppState décide seul s'il re-fetch
 * - Erreur interne -> {"error": ...} avec statut 500
 */

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use time::OffsetDateTime;

use crate::cache::ReportCache;

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ReportCache>,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/", get(get_fleet_report))
        .route("/api", get(get_fleet_report))
        .with_state(app_state)
        .layer(middleware::from_fn(allow_any_origin))
}

/// Les rapports sont lus par des dashboards servis depuis d'autres origines.
async fn allow_any_origin(req: Request, next: Next) -> Response {
    let mut resp = next.run(req).await;
    resp.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    resp
}

// GET / et GET /api (rapport courant)
async fn get_fleet_report(State(app): State<AppState>) -> Response {
    match app.cache.get_report(OffsetDateTime::now_utc()).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
