/**
 * NORMALISEUR DE SNAPSHOT - Du snapshot brut upstream au rapport de flotte
 *
 * RÔLE : Transformer une capture brute (liste de serveurs + métriques) en
 * rapport synthétique : comptages online/offline + métriques dérivées par
 * serveur en ligne (pourcentages, Go, Ko/s).
 *
 * FONCTIONNEMENT : Fonction pure de (snapshot, horloge, fenêtre online).
 * Les serveurs hors ligne sont comptés puis écartés, l'ordre upstream est
 * conservé pour les autres. Aucune division par zéro ne peut sortir d'ici.
 */

use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::freshness::is_online;
use crate::models::{FleetReport, RawServerEntry, RawSnapshot, ServerReport};

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("snapshot without a server list")]
    MalformedSnapshot,
}

const GIB: f64 = (1u64 << 30) as f64;

pub fn normalize(
    raw: &RawSnapshot,
    now: OffsetDateTime,
    online_window: Duration,
) -> Result<FleetReport, NormalizeError> {
    let entries = raw
        .servers
        .as_ref()
        .ok_or(NormalizeError::MalformedSnapshot)?;

    let mut report = FleetReport {
        timestamp: now.format(&Rfc3339).unwrap_or_default(),
        total_servers: entries.len(),
        online_servers: 0,
        offline_servers: 0,
        servers: Vec::new(),
    };

    for entry in entries {
        if is_online(entry.last_active.as_deref(), now, online_window) {
            report.online_servers += 1;
            report.servers.push(to_server_report(entry));
        } else {
            report.offline_servers += 1;
        }
    }

    Ok(report)
}

fn to_server_report(entry: &RawServerEntry) -> ServerReport {
    let host = &entry.host;
    let state = &entry.state;

    // disk_used : la valeur host prime, celle du state sert de repli
    // quand host ne la fournit pas (ou la fournit à zéro)
    let disk_used = host
        .disk_used
        .filter(|v| *v > 0)
        .or(state.disk_used)
        .unwrap_or(0);

    let disk_total_gb = if host.disk_total > 0 {
        host.disk_total as f64 / GIB
    } else {
        0.0
    };

    ServerReport {
        id: entry.id,
        name: entry.name.clone(),
        platform: host
            .platform
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        cpu_usage: round2(state.cpu),
        memory_usage_pct: round2(percent(state.mem_used, host.mem_total)),
        disk_total_gb: round2(disk_total_gb),
        disk_usage_pct: round2(percent(disk_used, host.disk_total)),
        upload_speed_kb: round2(state.net_out_speed as f64 / 1024.0),
        download_speed_kb: round2(state.net_in_speed as f64 / 1024.0),
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    used as f64 / total as f64 * 100.0
}

/// Arrondi à 2 décimales, demi-valeurs arrondies loin de zéro
/// (sémantique de `f64::round`) : 12.345 -> 12.35.
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    const DAY: Duration = Duration::hours(24);

    fn snapshot(value: serde_json::Value) -> RawSnapshot {
        serde_json::from_value(value).unwrap()
    }

    fn now() -> OffsetDateTime {
        datetime!(2024-01-01 01:00:00 UTC)
    }

    #[test]
    fn reference_entry_end_to_end() {
        let raw = snapshot(json!({
            "servers": [{
                "id": 1,
                "name": "a",
                "last_active": "2024-01-01T00:00:00Z",
                "host": { "mem_total": 1000, "disk_total": 1073741824u64 },
                "state": { "mem_used": 500, "cpu": 12.345, "net_in_speed": 2048, "net_out_speed": 1024 }
            }]
        }));

        let report = normalize(&raw, now(), DAY).unwrap();
        assert_eq!(report.total_servers, 1);
        assert_eq!(report.online_servers, 1);
        assert_eq!(report.offline_servers, 0);

        let server = &report.servers[0];
        assert_eq!(server.id, 1);
        assert_eq!(server.name, "a");
        assert_eq!(server.platform, "unknown");
        assert_eq!(server.cpu_usage, 12.35); // demi-valeur, loin de zéro
        assert_eq!(server.memory_usage_pct, 50.0);
        assert_eq!(server.disk_total_gb, 1.0);
        assert_eq!(server.disk_usage_pct, 0.0);
        assert_eq!(server.download_speed_kb, 2.0);
        assert_eq!(server.upload_speed_kb, 1.0);
    }

    #[test]
    fn counts_add_up_and_offline_entries_are_dropped() {
        let raw = snapshot(json!({
            "servers": [
                { "id": 1, "name": "on-1", "last_active": "2024-01-01T00:30:00Z" },
                { "id": 2, "name": "off-sentinel", "last_active": "0001-01-01T00:00:00Z" },
                { "id": 3, "name": "on-2", "last_active": "2024-01-01T00:59:00Z" },
                { "id": 4, "name": "off-old", "last_active": "2023-11-01T00:00:00Z" },
                { "id": 5, "name": "off-missing" }
            ]
        }));

        let report = normalize(&raw, now(), DAY).unwrap();
        assert_eq!(report.total_servers, 5);
        assert_eq!(report.online_servers + report.offline_servers, report.total_servers);
        assert_eq!(report.servers.len(), report.online_servers);
        // l'ordre upstream est conservé
        let ids: Vec<u64> = report.servers.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn zero_totals_never_divide() {
        let raw = snapshot(json!({
            "servers": [{
                "id": 1,
                "name": "empty-host",
                "last_active": "2024-01-01T00:00:00Z",
                "host": { "mem_total": 0, "disk_total": 0 },
                "state": { "mem_used": 512, "disk_used": 512 }
            }]
        }));

        let server = &normalize(&raw, now(), DAY).unwrap().servers[0];
        assert_eq!(server.memory_usage_pct, 0.0);
        assert_eq!(server.disk_total_gb, 0.0);
        assert_eq!(server.disk_usage_pct, 0.0);
    }

    #[test]
    fn disk_used_prefers_host_then_state() {
        let both = snapshot(json!({
            "servers": [{
                "id": 1, "name": "a", "last_active": "2024-01-01T00:00:00Z",
                "host": { "disk_total": 1000, "disk_used": 250 },
                "state": { "disk_used": 900 }
            }]
        }));
        assert_eq!(normalize(&both, now(), DAY).unwrap().servers[0].disk_usage_pct, 25.0);

        let host_zero = snapshot(json!({
            "servers": [{
                "id": 1, "name": "a", "last_active": "2024-01-01T00:00:00Z",
                "host": { "disk_total": 1000, "disk_used": 0 },
                "state": { "disk_used": 900 }
            }]
        }));
        assert_eq!(normalize(&host_zero, now(), DAY).unwrap().servers[0].disk_usage_pct, 90.0);

        let state_only = snapshot(json!({
            "servers": [{
                "id": 1, "name": "a", "last_active": "2024-01-01T00:00:00Z",
                "host": { "disk_total": 1000 },
                "state": { "disk_used": 500 }
            }]
        }));
        assert_eq!(normalize(&state_only, now(), DAY).unwrap().servers[0].disk_usage_pct, 50.0);
    }

    #[test]
    fn rounding_is_two_decimals_half_away_from_zero() {
        let raw = snapshot(json!({
            "servers": [{
                "id": 1, "name": "a", "last_active": "2024-01-01T00:00:00Z",
                // 128 / 1024 = 0.125 -> 0.13
                "state": { "cpu": 0.125, "net_in_speed": 128, "net_out_speed": 128 }
            }]
        }));

        let server = &normalize(&raw, now(), DAY).unwrap().servers[0];
        assert_eq!(server.cpu_usage, 0.13);
        assert_eq!(server.download_speed_kb, 0.13);
        assert_eq!(server.upload_speed_kb, 0.13);
    }

    #[test]
    fn normalize_is_a_pure_function() {
        let raw = snapshot(json!({
            "servers": [
                { "id": 1, "name": "a", "last_active": "2024-01-01T00:00:00Z",
                  "host": { "mem_total": 4096, "disk_total": 2147483648u64 },
                  "state": { "mem_used": 1024, "cpu": 42.424242 } },
                { "id": 2, "name": "b", "last_active": "0001-01-01T00:00:00Z" }
            ]
        }));

        let first = normalize(&raw, now(), DAY).unwrap();
        let second = normalize(&raw, now(), DAY).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_server_list_is_malformed() {
        let raw = snapshot(json!({ "now": 1704067200 }));
        assert!(matches!(
            normalize(&raw, now(), DAY),
            Err(NormalizeError::MalformedSnapshot)
        ));
    }
}
