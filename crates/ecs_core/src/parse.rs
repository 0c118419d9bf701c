//! String-to-enum parsing for config-facing identifiers.

use crate::components::{Archetype, OrdnanceKind};

/// Parse an archetype key as used in config files. Returns `None` for
/// unknown keys; callers log and skip.
pub fn parse_archetype(s: &str) -> Option<Archetype> {
    match s {
        "player" => Some(Archetype::Player),
        "driller" => Some(Archetype::Driller),
        "hunter" => Some(Archetype::Hunter),
        "lancer" => Some(Archetype::Lancer),
        "mite" => Some(Archetype::Mite),
        "warden" => Some(Archetype::Warden),
        other => parse_ordnance(other).map(Archetype::Ordnance),
    }
}

pub fn parse_ordnance(s: &str) -> Option<OrdnanceKind> {
    match s {
        "bolt" => Some(OrdnanceKind::Bolt),
        "lance" => Some(OrdnanceKind::Lance),
        "torpedo" => Some(OrdnanceKind::Torpedo),
        _ => None,
    }
}
