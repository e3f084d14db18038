//! Data models.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::errors::ExporterError;

/// Maritime Mobile Service Identity (MMSI)
///
/// Kept in its canonical digit-string form, whatever the payload encoding was.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Mmsi(String);

impl TryFrom<&str> for Mmsi {
    type Error = ExporterError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_string())
    }
}

impl TryFrom<String> for Mmsi {
    type Error = ExporterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ExporterError::InvalidMmsi(value));
        }
        Ok(Self(value))
    }
}

impl Mmsi {
    /// Get the digit string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Maritime Identification Digits, the first three digits of the MMSI
    pub fn mid(&self) -> Option<&str> {
        self.0.get(..3)
    }
}

impl fmt::Display for Mmsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flag state inferred from the MMSI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Country {
    Finland,
    Sweden,
    Norway,
    Denmark,
    Unknown,
}

impl Country {
    /// Look up the country by Maritime Identification Digits.
    ///
    /// Only Nordic MIDs are mapped, everything else is `Unknown`.
    pub fn from_mmsi(mmsi: &Mmsi) -> Self {
        match mmsi.mid() {
            Some("230") => Country::Finland,
            Some("265" | "266") => Country::Sweden,
            Some("257" | "258" | "259") => Country::Norway,
            Some("219" | "220") => Country::Denmark,
            _ => Country::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Finland => "FI",
            Country::Sweden => "SE",
            Country::Norway => "NO",
            Country::Denmark => "DK",
            Country::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a vessel display name for allow-list comparison
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Set of normalized vessel names to track
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList(HashSet<String>);

impl AllowList {
    /// Parse a comma separated list of names, skipping empty items
    pub fn parse(value: &str) -> Self {
        Self::from_names(value.split(','))
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            names
                .into_iter()
                .map(|name| normalize_name(name.as_ref()))
                .filter(|name| !name.is_empty())
                .collect(),
        )
    }

    /// Check whether a raw (unnormalized) name is tracked
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Vessel registry entry extracted from the metadata payload
#[derive(Debug, Clone, PartialEq)]
pub struct VesselMetadata {
    pub mmsi: Mmsi,
    /// Display name, trimmed
    pub name: String,
    pub country: Country,
}

/// A single position report extracted from the locations payload
#[derive(Debug, Clone, PartialEq)]
pub struct LocationObservation {
    pub mmsi: Mmsi,
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Report time in seconds from Unix epoch, 0 if unknown
    pub timestamp: i64,
}

/// Reconciled position of a tracked vessel
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedPosition {
    pub name: String,
    pub mmsi: Mmsi,
    pub country: Country,
    pub latitude: f64,
    pub longitude: f64,
    /// Report time in seconds from Unix epoch, 0 if unknown
    pub timestamp: i64,
}

/// Result of one refresh cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Positions ordered by (name, mmsi)
    pub positions: Vec<TrackedPosition>,
    /// None until the first refresh attempt completes
    pub last_refresh: Option<DateTime<Utc>>,
    pub refresh_duration: Duration,
    pub last_error: Option<String>,
}

impl Snapshot {
    /// Whether the latest refresh produced fresh positions
    pub fn is_up(&self) -> bool {
        self.last_error.is_none()
    }

    /// Ready once a refresh has run and it did not fail
    pub fn is_ready(&self) -> bool {
        self.last_refresh.is_some() && self.is_up()
    }
}
