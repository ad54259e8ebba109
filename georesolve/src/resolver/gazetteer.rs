//! Static service-region gazetteer.
//!
//! A local lookup table of place names in the platform's service region
//! (Batangas province and Metro Manila), guaranteeing that the address book
//! for the region always resolves even fully offline. This is the geocoding
//! tier of last resort; entries are locality centroids, not rooftops, and
//! report a correspondingly reduced confidence.

use crate::geo::{self, Location};
use crate::model::GeocodeResult;

/// Tier name reported to the observer when the gazetteer answers.
pub const TIER_NAME: &str = "gazetteer";

/// Confidence reported for gazetteer matches (locality centroids).
const GAZETTEER_CONFIDENCE: f64 = 0.6;

/// Reverse lookups only answer within this distance of a known locality.
const NEAREST_MAX_METERS: f64 = 25_000.0;

/// Known localities: normalized key, display name, latitude, longitude.
const PLACES: &[(&str, &str, f64, f64)] = &[
    ("lipa city", "Lipa City, Batangas", 13.9411, 121.1625),
    ("lipa", "Lipa City, Batangas", 13.9411, 121.1625),
    ("batangas city", "Batangas City, Batangas", 13.7565, 121.0583),
    ("tanauan city", "Tanauan City, Batangas", 14.0863, 121.1497),
    ("tanauan", "Tanauan City, Batangas", 14.0863, 121.1497),
    ("santo tomas", "Santo Tomas, Batangas", 14.1078, 121.1414),
    ("malvar", "Malvar, Batangas", 14.0416, 121.1581),
    ("san jose", "San Jose, Batangas", 13.8753, 121.1047),
    ("ibaan", "Ibaan, Batangas", 13.8196, 121.1330),
    ("rosario", "Rosario, Batangas", 13.8457, 121.2104),
    ("padre garcia", "Padre Garcia, Batangas", 13.8798, 121.2148),
    ("cuenca", "Cuenca, Batangas", 13.9006, 121.0503),
    ("mataas na kahoy", "Mataas na Kahoy, Batangas", 13.9639, 121.0896),
    ("balete", "Balete, Batangas", 14.0170, 121.0963),
    ("manila", "Manila, Metro Manila", 14.5995, 120.9842),
    ("makati", "Makati, Metro Manila", 14.5547, 121.0244),
    ("quezon city", "Quezon City, Metro Manila", 14.6760, 121.0437),
    ("taguig", "Taguig, Metro Manila", 14.5176, 121.0509),
];

/// Centroid of the service region (Lipa City), the platform's last-resort
/// default location.
pub fn region_centroid() -> Location {
    Location::new(13.9411, 121.1625).with_address("Lipa City, Batangas, Philippines")
}

/// Normalizes a place name for table lookup: lowercase, punctuation
/// stripped, whitespace collapsed.
fn normalize(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut last_was_space = true;
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            normalized.extend(ch.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            normalized.push(' ');
            last_was_space = true;
        }
    }
    normalized.trim_end().to_string()
}

/// Looks up a place name in the gazetteer.
///
/// Tries an exact normalized match first, then a prefix match so that
/// queries like "Lipa City, Batangas, Philippines" still resolve. Returns
/// `None` for places outside the table; the resolver surfaces that as an
/// explicit could-not-resolve outcome.
pub fn lookup(query: &str) -> Option<GeocodeResult> {
    let normalized = normalize(query);
    if normalized.is_empty() {
        return None;
    }

    let entry = PLACES
        .iter()
        .find(|(key, _, _, _)| *key == normalized)
        .or_else(|| {
            // Longest matching prefix wins ("lipa city ..." over "lipa ...")
            PLACES
                .iter()
                .filter(|(key, _, _, _)| normalized.starts_with(key))
                .max_by_key(|(key, _, _, _)| key.len())
        })?;

    let (_, display, lat, lon) = *entry;
    Some(GeocodeResult {
        location: Location::new(lat, lon).with_address(format!("{}, Philippines", display)),
        confidence: GAZETTEER_CONFIDENCE,
        place_type: "locality".to_string(),
    })
}

/// Finds the formatted name of the nearest known locality, if one lies
/// within the reverse-lookup radius.
pub fn nearest(location: &Location) -> Option<String> {
    let mut best: Option<(f64, &str)> = None;
    for (_, display, lat, lon) in PLACES {
        let d = geo::distance_meters(location, &Location::new(*lat, *lon));
        if d <= NEAREST_MAX_METERS && best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, display));
        }
    }
    best.map(|(_, display)| format!("{}, Philippines", display))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lipa_city_resolves_to_centroid() {
        let result = lookup("Lipa City").unwrap();
        assert_eq!(result.location.latitude, 13.9411);
        assert_eq!(result.location.longitude, 121.1625);
        assert_eq!(result.place_type, "locality");
    }

    #[test]
    fn test_lookup_is_case_and_punctuation_insensitive() {
        assert!(lookup("LIPA CITY").is_some());
        assert!(lookup("  lipa city  ").is_some());
        assert!(lookup("Lipa City,").is_some());
    }

    #[test]
    fn test_prefix_match_with_province_suffix() {
        let result = lookup("Lipa City, Batangas, Philippines").unwrap();
        assert_eq!(result.location.latitude, 13.9411);
    }

    #[test]
    fn test_prefix_prefers_longest_key() {
        // "batangas city ..." must match Batangas City, not any shorter key
        let result = lookup("Batangas City, Philippines").unwrap();
        assert_eq!(result.location.latitude, 13.7565);
    }

    #[test]
    fn test_unknown_place_is_none() {
        assert!(lookup("Reykjavik").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_nearest_within_radius() {
        // A point ~2 km east of the Lipa centroid
        let near_lipa = Location::new(13.9411, 121.181);
        let address = nearest(&near_lipa).unwrap();
        assert!(address.contains("Lipa City"));
    }

    #[test]
    fn test_nearest_outside_radius_is_none() {
        // Puerto Princesa is hundreds of km from the service region
        let far = Location::new(9.7392, 118.7353);
        assert!(nearest(&far).is_none());
    }

    #[test]
    fn test_region_centroid_is_lipa() {
        let centroid = region_centroid();
        assert_eq!(centroid.latitude, 13.9411);
        assert_eq!(centroid.longitude, 121.1625);
    }

    #[test]
    fn test_normalize_collapses_whitespace_and_punctuation() {
        assert_eq!(normalize("  Mataas   na  Kahoy. "), "mataas na kahoy");
        assert_eq!(normalize("Lipa-City"), "lipa city");
    }
}
