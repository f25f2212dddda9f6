//! Line-based geolocation feed.
//!
//! Each input line is `latitude,longitude`. The daemon treats whatever
//! writes these lines (GPS bridge, replay file, test harness) as the
//! platform's location watch; closing the feed ends the session.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use courier::publisher::GeoSample;

/// Parse one feed line into a sample.
pub fn parse_sample_line(line: &str) -> Result<GeoSample> {
    let mut parts = line.split(',');

    let latitude: f64 = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .context("missing latitude")?
        .parse()
        .context("latitude is not a number")?;

    let longitude: f64 = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .context("missing longitude")?
        .parse()
        .context("longitude is not a number")?;

    if parts.next().is_some() {
        bail!("expected exactly 'latitude,longitude'");
    }

    if !latitude.is_finite() || !longitude.is_finite() {
        bail!("coordinates must be finite");
    }

    Ok(GeoSample {
        latitude,
        longitude,
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_plain_line() {
        let sample = parse_sample_line("22.50,88.30").unwrap();
        assert_eq!(sample.latitude, 22.50);
        assert_eq!(sample.longitude, 88.30);
    }

    #[test]
    fn test_parses_with_whitespace() {
        let sample = parse_sample_line(" 22.50 , 88.30 ").unwrap();
        assert_eq!(sample.latitude, 22.50);
        assert_eq!(sample.longitude, 88.30);
    }

    #[test]
    fn test_rejects_missing_longitude() {
        assert!(parse_sample_line("22.50").is_err());
        assert!(parse_sample_line("22.50,").is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_sample_line("north,east").is_err());
        assert!(parse_sample_line("").is_err());
        assert!(parse_sample_line("1.0,2.0,3.0").is_err());
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(parse_sample_line("NaN,88.30").is_err());
        assert!(parse_sample_line("inf,88.30").is_err());
    }
}
