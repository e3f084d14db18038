//! Merging vessel metadata with location reports

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::models::{AllowList, Country, LocationObservation, Mmsi, TrackedPosition, VesselMetadata};

/// Pick the latest position of every allow-listed vessel.
///
/// A vessel is tracked when its metadata name is allow-listed, or when it has
/// no usable metadata but the location report carries an allow-listed name.
/// Of all reports for one MMSI the one with the greatest timestamp is kept,
/// the first seen wins on equal timestamps. The result is sorted by name and
/// then MMSI. Two MMSIs sharing a name stay separate entries.
pub fn select_positions(
    metadata: &HashMap<Mmsi, VesselMetadata>,
    locations: &[LocationObservation],
    targets: &AllowList,
) -> Vec<TrackedPosition> {
    let mut selected: HashMap<&Mmsi, (String, Country)> = metadata
        .values()
        .filter(|vessel| targets.contains(&vessel.name))
        .map(|vessel| (&vessel.mmsi, (vessel.name.clone(), vessel.country)))
        .collect();

    let mut best: HashMap<&Mmsi, TrackedPosition> = HashMap::new();
    for location in locations {
        if !location.latitude.is_finite() || !location.longitude.is_finite() {
            continue;
        }

        let (name, country) = match selected.entry(&location.mmsi) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let Some(name) = location.name.as_deref().map(str::trim) else {
                    continue;
                };
                if !targets.contains(name) {
                    continue;
                }
                entry.insert((name.to_string(), Country::Unknown))
            }
        };

        let candidate = TrackedPosition {
            name: name.clone(),
            mmsi: location.mmsi.clone(),
            country: *country,
            latitude: location.latitude,
            longitude: location.longitude,
            timestamp: location.timestamp,
        };
        match best.entry(&location.mmsi) {
            Entry::Occupied(mut entry) => {
                if candidate.timestamp > entry.get().timestamp {
                    entry.insert(candidate);
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(candidate);
            }
        }
    }

    let mut out: Vec<TrackedPosition> = best.into_values().collect();
    out.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.mmsi.cmp(&b.mmsi)));
    out
}
