//! Prometheus text exposition of the latest snapshot

use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::Snapshot;

/// Content type of the rendered exposition
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render the snapshot in Prometheus text format.
///
/// `scrapes` is the scrape count including the current one, `now` is used for
/// report age.
pub fn render(
    snapshot: &Snapshot,
    scrapes: u64,
    now: DateTime<Utc>,
) -> Result<String, std::fmt::Error> {
    let mut out = String::with_capacity(4096);
    write_metrics(&mut out, snapshot, scrapes, now)?;
    Ok(out)
}

/// Write the exposition of `snapshot` into `out`
pub fn write_metrics<W: Write>(
    out: &mut W,
    snapshot: &Snapshot,
    scrapes: u64,
    now: DateTime<Utc>,
) -> std::fmt::Result {
    let now = now.timestamp();
    let up = if snapshot.is_up() { 1 } else { 0 };
    let last_refresh = snapshot.last_refresh.map_or(0, |t| t.timestamp());

    gauge(out, "icebreaker_up", "Whether the latest Digitraffic refresh succeeded")?;
    writeln!(out, "icebreaker_up {}", up)?;

    gauge(out, "icebreaker_last_refresh_timestamp_seconds", "Unix timestamp of last refresh")?;
    writeln!(out, "icebreaker_last_refresh_timestamp_seconds {}", last_refresh)?;

    gauge(out, "icebreaker_refresh_duration_seconds", "Duration of latest refresh operation")?;
    writeln!(
        out,
        "icebreaker_refresh_duration_seconds {:.6}",
        snapshot.refresh_duration.as_secs_f64()
    )?;

    counter(out, "icebreaker_scrapes_total", "Total number of /metrics scrapes")?;
    writeln!(out, "icebreaker_scrapes_total {}", scrapes)?;

    gauge(out, "icebreaker_positions", "Number of exported icebreaker positions")?;
    writeln!(out, "icebreaker_positions {}", snapshot.positions.len())?;

    gauge(out, "icebreaker_latitude_degrees", "Current latitude of a Nordic icebreaker")?;
    gauge(out, "icebreaker_longitude_degrees", "Current longitude of a Nordic icebreaker")?;
    gauge(
        out,
        "icebreaker_last_report_timestamp_seconds",
        "Unix timestamp of the vessel position report",
    )?;
    gauge(
        out,
        "icebreaker_report_age_seconds",
        "Seconds since the latest vessel position report",
    )?;

    for pos in &snapshot.positions {
        let labels = format!(
            r#"vessel_name="{}",mmsi="{}",country="{}""#,
            escape_label(&pos.name),
            escape_label(pos.mmsi.as_str()),
            escape_label(pos.country.as_str())
        );
        writeln!(out, "icebreaker_latitude_degrees{{{}}} {:.6}", labels, pos.latitude)?;
        writeln!(out, "icebreaker_longitude_degrees{{{}}} {:.6}", labels, pos.longitude)?;
        if pos.timestamp > 0 {
            writeln!(
                out,
                "icebreaker_last_report_timestamp_seconds{{{}}} {}",
                labels, pos.timestamp
            )?;
            writeln!(
                out,
                "icebreaker_report_age_seconds{{{}}} {}",
                labels,
                (now - pos.timestamp).max(0)
            )?;
        }
    }
    Ok(())
}

fn gauge<W: Write>(out: &mut W, metric: &str, help: &str) -> std::fmt::Result {
    header(out, metric, help, "gauge")
}

fn counter<W: Write>(out: &mut W, metric: &str, help: &str) -> std::fmt::Result {
    header(out, metric, help, "counter")
}

fn header<W: Write>(out: &mut W, metric: &str, help: &str, kind: &str) -> std::fmt::Result {
    writeln!(out, "# HELP {} {}", metric, help)?;
    writeln!(out, "# TYPE {} {}", metric, kind)
}

/// Escape a label value: backslash, newline and double quote
pub fn escape_label(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '\n' => out.push_str(r"\n"),
            '"' => out.push_str(r#"\""#),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Country, Mmsi, TrackedPosition};
    use std::time::Duration;

    fn snapshot_with(timestamp: i64) -> Snapshot {
        Snapshot {
            positions: vec![TrackedPosition {
                name: "OTSO".to_string(),
                mmsi: Mmsi::try_from("230124000").unwrap(),
                country: Country::Finland,
                latitude: 60.1,
                longitude: 24.9,
                timestamp,
            }],
            last_refresh: DateTime::from_timestamp(1_700_000_100, 0),
            refresh_duration: Duration::from_millis(100),
            last_error: None,
        }
    }

    #[test]
    fn renders_positions_with_labels() {
        let now = DateTime::from_timestamp(1_700_000_130, 0).unwrap();
        let body = render(&snapshot_with(1_700_000_000), 3, now).unwrap();

        assert!(body.contains("icebreaker_up 1\n"));
        assert!(body.contains("icebreaker_last_refresh_timestamp_seconds 1700000100\n"));
        assert!(body.contains("icebreaker_refresh_duration_seconds 0.100000\n"));
        assert!(body.contains("icebreaker_scrapes_total 3\n"));
        assert!(body.contains("icebreaker_positions 1\n"));
        assert!(body.contains(
            r#"icebreaker_latitude_degrees{vessel_name="OTSO",mmsi="230124000",country="FI"} 60.100000"#
        ));
        assert!(body.contains(
            r#"icebreaker_longitude_degrees{vessel_name="OTSO",mmsi="230124000",country="FI"} 24.900000"#
        ));
        assert!(body.contains(
            r#"icebreaker_last_report_timestamp_seconds{vessel_name="OTSO",mmsi="230124000",country="FI"} 1700000000"#
        ));
        assert!(body.contains(
            r#"icebreaker_report_age_seconds{vessel_name="OTSO",mmsi="230124000",country="FI"} 130"#
        ));
        assert!(body.contains("# TYPE icebreaker_scrapes_total counter\n"));
    }

    #[test]
    fn omits_report_series_without_timestamp() {
        let now = Utc::now();
        let body = render(&snapshot_with(0), 1, now).unwrap();

        assert!(body.contains("icebreaker_latitude_degrees{"));
        assert!(!body.contains("icebreaker_last_report_timestamp_seconds{"));
        assert!(!body.contains("icebreaker_report_age_seconds{"));
    }

    #[test]
    fn report_age_is_never_negative() {
        let now = DateTime::from_timestamp(1_699_999_000, 0).unwrap();
        let body = render(&snapshot_with(1_700_000_000), 1, now).unwrap();
        assert!(body.contains(
            r#"icebreaker_report_age_seconds{vessel_name="OTSO",mmsi="230124000",country="FI"} 0"#
        ));
    }

    #[test]
    fn failed_refresh_reports_down() {
        let mut snapshot = snapshot_with(1_700_000_000);
        snapshot.last_error = Some("fetch vessels: timeout".to_string());
        let body = render(&snapshot, 1, Utc::now()).unwrap();

        assert!(body.contains("icebreaker_up 0\n"));
        assert!(body.contains("icebreaker_positions 1\n"));
    }

    #[test]
    fn never_refreshed_snapshot() {
        let body = render(&Snapshot::default(), 1, Utc::now()).unwrap();
        assert!(body.contains("icebreaker_last_refresh_timestamp_seconds 0\n"));
        assert!(body.contains("icebreaker_positions 0\n"));
    }

    #[test]
    fn escapes_label_values() {
        assert_eq!(escape_label(r#"a\b"#), r#"a\\b"#);
        assert_eq!(escape_label("line\nbreak"), r"line\nbreak");
        assert_eq!(escape_label(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_label("KRONPRINS HAAKON"), "KRONPRINS HAAKON");
    }

    /// Accepts `room` bytes, then fails
    struct Limited {
        room: usize,
    }

    impl Write for Limited {
        fn write_str(&mut self, s: &str) -> std::fmt::Result {
            self.room = self.room.checked_sub(s.len()).ok_or(std::fmt::Error)?;
            Ok(())
        }
    }

    #[test]
    fn writer_errors_are_propagated() {
        let snapshot = snapshot_with(1_700_000_000);
        let mut out = Limited { room: 200 };
        assert!(write_metrics(&mut out, &snapshot, 1, Utc::now()).is_err());

        let mut out = Limited { room: 1 << 20 };
        assert!(write_metrics(&mut out, &snapshot, 1, Utc::now()).is_ok());
    }
}
