//! Vessel metadata and location extraction from Digitraffic payloads
//!
//! Neither payload is parsed against a fixed schema. Every object in the
//! payload is inspected and the ones that look like vessel records are kept.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::coerce::{identity_field, number_field, string_field, timestamp_field, to_real};
use crate::models::{Country, LocationObservation, Mmsi, VesselMetadata};
use crate::walker::walk;

const MMSI_KEYS: &[&str] = &["mmsi"];
const NAME_KEYS: &[&str] = &["name", "vesselName"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "time", "locUpdateTimestamp"];
const LATITUDE_KEYS: &[&str] = &["lat", "latitude"];
const LONGITUDE_KEYS: &[&str] = &["lon", "lng", "longitude", "long"];

/// Collect one metadata record per MMSI from a vessels payload.
///
/// Objects without an MMSI or a name are skipped. When the payload holds the
/// same MMSI twice, the last visited record wins.
pub fn extract_metadata(payload: &Value) -> HashMap<Mmsi, VesselMetadata> {
    let mut by_mmsi = HashMap::new();
    walk(payload, |item| {
        let Some(mmsi) = identity_field(item, MMSI_KEYS) else {
            return;
        };
        let Some(name) = string_field(item, NAME_KEYS) else {
            return;
        };

        let country = Country::from_mmsi(&mmsi);
        by_mmsi.insert(
            mmsi.clone(),
            VesselMetadata {
                mmsi,
                name: name.to_string(),
                country,
            },
        );
    });
    debug!(vessels = by_mmsi.len(), "extracted vessel metadata");
    by_mmsi
}

/// Collect every location report from a locations payload.
///
/// Both GeoJSON features and flat `lat`/`lon` records are recognized.
pub fn extract_locations(payload: &Value) -> Vec<LocationObservation> {
    let mut out = Vec::new();
    walk(payload, |item| {
        if let Some(location) = parse_feature(item).or_else(|| parse_flat(item)) {
            out.push(location);
        }
    });
    debug!(locations = out.len(), "extracted vessel locations");
    out
}

/// GeoJSON feature: `geometry.coordinates` is `[lon, lat, ...]`, the rest is
/// looked up in `properties` first and on the feature itself second.
fn parse_feature(item: &Map<String, Value>) -> Option<LocationObservation> {
    let coordinates = item
        .get("geometry")?
        .as_object()?
        .get("coordinates")?
        .as_array()?;
    if coordinates.len() < 2 {
        return None;
    }
    let longitude = to_real(&coordinates[0])?;
    let latitude = to_real(&coordinates[1])?;

    let properties = item.get("properties").and_then(Value::as_object);
    let mmsi = properties
        .and_then(|p| identity_field(p, MMSI_KEYS))
        .or_else(|| identity_field(item, MMSI_KEYS))?;
    let name = properties
        .and_then(|p| string_field(p, NAME_KEYS))
        .or_else(|| string_field(item, NAME_KEYS));
    let timestamp = match properties.map(|p| timestamp_field(p, TIMESTAMP_KEYS)) {
        Some(ts) if ts > 0 => ts,
        _ => timestamp_field(item, TIMESTAMP_KEYS),
    };

    Some(LocationObservation {
        mmsi,
        name: name.map(str::to_string),
        latitude,
        longitude,
        timestamp,
    })
}

/// Flat record with coordinates and MMSI side by side
fn parse_flat(item: &Map<String, Value>) -> Option<LocationObservation> {
    let latitude = number_field(item, LATITUDE_KEYS)?;
    let longitude = number_field(item, LONGITUDE_KEYS)?;
    let mmsi = identity_field(item, MMSI_KEYS)?;

    Some(LocationObservation {
        mmsi,
        name: string_field(item, NAME_KEYS).map(str::to_string),
        latitude,
        longitude,
        timestamp: timestamp_field(item, TIMESTAMP_KEYS),
    })
}
