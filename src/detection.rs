/*!
 * A single satellite thermal anomaly detection.
 *
 * Detections are the input atoms of the analysis. They come from an ingestion step that reads
 * the active fire products, and they are validated once, when they are created, so everything
 * downstream can assume finite coordinates and non-negative power.
 */
use crate::{
    error::{ValidationError, ValidationErrorKind},
    geo::Coord,
};
use chrono::{NaiveDate, NaiveTime};
use log::{debug, warn};
use std::{collections::BTreeMap, str::FromStr};

/// Detection confidence as reported by the fire products.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Low,
    Nominal,
    High,
    /// MODIS style percentage, 0 - 100.
    Percent(u8),
}

impl FromStr for Confidence {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "l" | "low" => Ok(Confidence::Low),
            "n" | "nominal" => Ok(Confidence::Nominal),
            "h" | "high" => Ok(Confidence::High),
            other => match other.parse::<u8>() {
                Ok(pct) if pct <= 100 => Ok(Confidence::Percent(pct)),
                _ => Err("unrecognized confidence value"),
            },
        }
    }
}

/**
 * One fire pixel detected by the satellite.
 *
 * Fields are private so a Detection can only be made through [Detection::new], which validates
 * it.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    lat: f64,
    lon: f64,
    date: NaiveDate,
    time: Option<NaiveTime>,
    /// Fire radiative power in megawatts.
    frp: f64,
    confidence: Option<Confidence>,
}

impl Detection {
    /// Create and validate a detection.
    pub fn new(lat: f64, lon: f64, date: NaiveDate, frp: f64) -> Result<Self, ValidationError> {
        Self::validate(lat, lon, frp)?;

        Ok(Detection {
            lat,
            lon,
            date,
            time: None,
            frp,
            confidence: None,
        })
    }

    /// Add the acquisition time.
    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Add the detection confidence.
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Check the numeric fields of a detection.
    pub fn validate(lat: f64, lon: f64, frp: f64) -> Result<(), ValidationError> {
        use ValidationErrorKind::*;

        let fail = |kind, value| Err(ValidationError { kind, value });

        if !lat.is_finite() {
            return fail(NonFiniteLatitude, lat);
        }
        if !lon.is_finite() {
            return fail(NonFiniteLongitude, lon);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return fail(LatitudeOutOfRange, lat);
        }
        if !(-180.0..=180.0).contains(&lon) {
            return fail(LongitudeOutOfRange, lon);
        }
        if !frp.is_finite() {
            return fail(NonFinitePower, frp);
        }
        if frp < 0.0 {
            return fail(NegativePower, frp);
        }

        Ok(())
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn coord(&self) -> Coord {
        Coord {
            lat: self.lat,
            lon: self.lon,
        }
    }

    /// The acquisition date (UTC).
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The acquisition time (UTC), if known.
    pub fn time(&self) -> Option<NaiveTime> {
        self.time
    }

    /// Fire radiative power, megawatts.
    pub fn frp(&self) -> f64 {
        self.frp
    }

    pub fn confidence(&self) -> Option<Confidence> {
        self.confidence
    }
}

/**
 * Parse an acquisition time.
 *
 * The fire archives store the time as an `HHMM` integer, so leading zeros are often lost ("130"
 * is 01:30). "HH:MM" is also accepted.
 */
pub fn parse_acq_time(acq_time: &str) -> Option<NaiveTime> {
    let acq_time = acq_time.trim();

    if let Ok(time) = NaiveTime::parse_from_str(acq_time, "%H:%M") {
        return Some(time);
    }

    if acq_time.is_empty() || acq_time.len() > 4 || !acq_time.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let hhmm: u32 = acq_time.parse().ok()?;
    NaiveTime::from_hms_opt(hhmm / 100, hhmm % 100, 0)
}

/**
 * Drop the records that failed validation, logging each one.
 *
 * Ingestion builds detections with [Detection::new] and a bad row should not stop a season, so
 * the rejects are reported and skipped.
 */
pub fn keep_valid<I>(records: I) -> Vec<Detection>
where
    I: IntoIterator<Item = Result<Detection, ValidationError>>,
{
    let mut num_rejected = 0;
    let valid: Vec<Detection> = records
        .into_iter()
        .filter_map(|res| match res {
            Ok(det) => Some(det),
            Err(err) => {
                warn!(target: "detection", "skipping record - {}", err);
                num_rejected += 1;
                None
            }
        })
        .collect();

    debug!(
        target: "detection",
        "kept {} detections, rejected {}",
        valid.len(),
        num_rejected
    );

    valid
}

/// Split a season's detections into per-day lists, ordered by date.
pub fn group_by_date<I>(detections: I) -> BTreeMap<NaiveDate, Vec<Detection>>
where
    I: IntoIterator<Item = Detection>,
{
    let mut by_date: BTreeMap<NaiveDate, Vec<Detection>> = BTreeMap::new();
    for det in detections {
        by_date.entry(det.date()).or_default().push(det);
    }

    by_date
}
