use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};
use tracing::warn;

/// Sentinelle upstream pour "jamais vu" (an 1, placeholder d'epoch).
const ZERO_TIME: &str = "0001-01-01T00:00:00Z";

/// Un serveur compte comme en ligne si son dernier signe de vie date de
/// moins de `window` (borne incluse).
///
/// Un timestamp absent, vide, sentinelle ou imparsable vaut "hors ligne" :
/// l'erreur de parsing est loguée mais jamais remontée à l'appelant.
pub fn is_online(last_active: Option<&str>, now: OffsetDateTime, window: Duration) -> bool {
    let Some(raw) = last_active else {
        return false;
    };
    if raw.is_empty() || raw == ZERO_TIME {
        return false;
    }

    match parse_last_active(raw) {
        Ok(seen) => now - seen <= window,
        Err(e) => {
            warn!("last_active imparsable {raw:?}: {e}");
            false
        }
    }
}

/// RFC3339 d'abord (l'offset éventuel est absorbé par l'arithmétique
/// d'instants), sinon forme naïve supposée déjà en UTC.
fn parse_last_active(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    if let Ok(seen) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(seen);
    }
    // forme naïve, avec ou sans fraction de seconde
    let with_frac =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
    if let Ok(naive) = PrimitiveDateTime::parse(raw, &with_frac) {
        return Ok(naive.assume_utc());
    }
    let plain = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    PrimitiveDateTime::parse(raw, &plain).map(|p| p.assume_utc())
}
