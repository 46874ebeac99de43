//! GPX file generation from track points.
//!
//! Produces GPX 1.1 documents that `forecast::gpx_processor` reads back.

use forecast::{models::TrackPoint, scheduler::arrival_time};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Ride timing used to stamp `<time>` elements on generated points.
#[derive(Debug, Clone, Copy)]
pub struct RideTiming {
    pub start_time: OffsetDateTime,
    pub avg_speed_kmh: f64,
}

/// Generates a GPX 1.1 XML document from track points.
///
/// Points go into a single track segment. Timestamps are written only
/// when `timing` is given.
pub fn generate_gpx(points: &[TrackPoint], route_name: &str, timing: Option<RideTiming>) -> Vec<u8> {
    let mut gpx = String::new();

    gpx.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    gpx.push('\n');
    gpx.push_str(r#"<gpx version="1.1" creator="forecast-test-data""#);
    gpx.push_str(r#" xmlns="http://www.topografix.com/GPX/1/1""#);
    gpx.push_str(r#" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#);
    gpx.push_str(r#" xsi:schemaLocation="http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd">"#);
    gpx.push('\n');

    gpx.push_str("  <metadata>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(route_name)));
    gpx.push_str("  </metadata>\n");

    gpx.push_str("  <trk>\n");
    gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(route_name)));
    gpx.push_str("    <trkseg>\n");

    for point in points {
        gpx.push_str(&format!(
            r#"      <trkpt lat="{:.7}" lon="{:.7}">"#,
            point.lat, point.lon
        ));
        gpx.push('\n');
        gpx.push_str(&format!("        <ele>{:.2}</ele>\n", point.elevation));

        let stamp = timing
            .and_then(|t| arrival_time(t.start_time, point.cumulative_distance_km, t.avg_speed_kmh).ok())
            .and_then(|ts| ts.format(&Rfc3339).ok());
        if let Some(formatted) = stamp {
            gpx.push_str(&format!("        <time>{}</time>\n", formatted));
        }

        gpx.push_str("      </trkpt>\n");
    }

    gpx.push_str("    </trkseg>\n");
    gpx.push_str("  </trk>\n");
    gpx.push_str("</gpx>\n");

    gpx.into_bytes()
}

/// Escapes XML special characters in a string.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn points() -> Vec<TrackPoint> {
        vec![
            TrackPoint::new(45.0150, 7.2705, 650.0, 0.0),
            TrackPoint::new(45.0160, 7.2695, 660.0, 0.14),
        ]
    }

    #[test]
    fn test_generate_gpx_basic() {
        let gpx = generate_gpx(&points(), "Morning Ride", None);
        let gpx_str = String::from_utf8(gpx).unwrap();

        assert!(gpx_str.contains(r#"version="1.1""#));
        assert!(gpx_str.contains("<name>Morning Ride</name>"));
        assert!(gpx_str.contains(r#"lat="45.0150000""#));
        assert!(gpx_str.contains(r#"lon="7.2705000""#));
        assert!(gpx_str.contains("<ele>650.00</ele>"));
        assert!(!gpx_str.contains("<time>"));
    }

    #[test]
    fn test_generate_gpx_with_timing() {
        let timing = RideTiming {
            start_time: datetime!(2026-06-01 06:00 UTC),
            avg_speed_kmh: 20.0,
        };
        let gpx = generate_gpx(&points(), "Timed", Some(timing));
        let gpx_str = String::from_utf8(gpx).unwrap();

        assert!(gpx_str.contains("<time>2026-06-01T06:00:00Z</time>"));
        assert_eq!(gpx_str.matches("<time>").count(), 2);
    }

    #[test]
    fn test_generate_gpx_escapes_special_chars() {
        let gpx = generate_gpx(&points(), "Col & <Pass> \"Loop\"", None);
        let gpx_str = String::from_utf8(gpx).unwrap();

        assert!(gpx_str.contains("Col &amp; &lt;Pass&gt; &quot;Loop&quot;"));
    }
}
