//! Per-gate arrival/exit forecasts and their normalization into time-keyed
//! load indices.
//!
//! Forecast points arrive as `{ds, yhat, yhat_lower?, yhat_upper?}` records
//! per gate. Everything downstream joins on a [`TimeKey`]: the `ds` timestamp
//! truncated to the minute.

use std::collections::BTreeMap;
use std::fmt;

use bevy::prelude::*;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_BUCKET_MINUTES;
use crate::error::FlowError;

/// Naive timestamp layouts accepted besides RFC 3339.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub ds: String,
    pub yhat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yhat_lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yhat_upper: Option<f64>,
}

impl ForecastPoint {
    pub fn new(ds: impl Into<String>, yhat: f64) -> Self {
        Self {
            ds: ds.into(),
            yhat,
            yhat_lower: None,
            yhat_upper: None,
        }
    }

    /// Predicted load with negative model output clamped to zero.
    pub fn load(&self) -> f64 {
        self.yhat.max(0.0)
    }
}

/// Gate id → ordered forecast points.
pub type GateSeries = BTreeMap<String, Vec<ForecastPoint>>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Forecast {
    #[serde(default)]
    pub arrivals: GateSeries,
    #[serde(default)]
    pub exits: GateSeries,
}

impl Forecast {
    /// Parse a forecast document. A document without a single usable point is
    /// rejected so the caller can fall back to demo data.
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        let forecast: Self = serde_json::from_str(json)?;
        if forecast.usable_points() == 0 {
            return Err(FlowError::EmptyForecast);
        }
        Ok(forecast)
    }

    /// Number of points (both series) whose timestamp parses.
    pub fn usable_points(&self) -> usize {
        self.arrivals
            .values()
            .chain(self.exits.values())
            .flatten()
            .filter(|p| to_time_key(&p.ds).is_ok())
            .count()
    }
}

/// Minute-granularity join key. Orders chronologically; displays as
/// `YYYY-MM-DDTHH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeKey(NaiveDateTime);

impl TimeKey {
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        let truncated = dt
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(dt);
        Self(truncated)
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// `HH:MM` label for the scrubber.
    pub fn clock_label(&self) -> String {
        self.0.format("%H:%M").to_string()
    }

    /// Whole minutes from `self` to `later`.
    pub fn minutes_until(&self, later: &TimeKey) -> i64 {
        (later.0 - self.0).num_minutes()
    }
}

impl fmt::Display for TimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M"))
    }
}

/// Canonicalize a raw `ds` value to minute granularity (seconds truncated).
///
/// RFC 3339 values keep the wall-clock time as written; the offset is not
/// applied, so all gates of one forecast are compared in the venue's local time.
pub fn to_time_key(raw: &str) -> Result<TimeKey, FlowError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(TimeKey::from_datetime(dt.naive_local()));
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(TimeKey::from_datetime(dt));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(TimeKey::from_datetime)
        .ok_or_else(|| FlowError::Timestamp(raw.to_string()))
}

/// Aggregated load at one time key, with the model's uncertainty band summed
/// alongside. Bounds are `None` unless every contributing point carries one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadBand {
    pub total: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl LoadBand {
    fn from_point(point: &ForecastPoint) -> Self {
        Self {
            total: point.load(),
            lower: point.yhat_lower.map(|v| v.max(0.0)),
            upper: point.yhat_upper.map(|v| v.max(0.0)),
        }
    }

    fn merge(&mut self, other: LoadBand) {
        self.total += other.total;
        self.lower = self.lower.zip(other.lower).map(|(a, b)| a + b);
        self.upper = self.upper.zip(other.upper).map(|(a, b)| a + b);
    }
}

/// Points of every gate with their parsed key. Unparseable points are skipped
/// with a warning.
fn keyed_points(series: &GateSeries) -> impl Iterator<Item = (&str, TimeKey, &ForecastPoint)> {
    series.iter().flat_map(|(gate, points)| {
        points.iter().filter_map(move |p| match to_time_key(&p.ds) {
            Ok(key) => Some((gate.as_str(), key, p)),
            Err(e) => {
                warn!("Forecast gate {}: skipping point: {}", gate, e);
                None
            }
        })
    })
}

/// Sum of every gate's load (and bounds) per time key.
pub fn aggregate_bands(series: &GateSeries) -> BTreeMap<TimeKey, LoadBand> {
    let mut out: BTreeMap<TimeKey, LoadBand> = BTreeMap::new();
    for (_, key, point) in keyed_points(series) {
        let band = LoadBand::from_point(point);
        out.entry(key)
            .and_modify(|existing| existing.merge(band))
            .or_insert(band);
    }
    out
}

/// Sum of every gate's predicted load per time key.
pub fn aggregate_by_time(series: &GateSeries) -> BTreeMap<TimeKey, f64> {
    aggregate_bands(series)
        .into_iter()
        .map(|(key, band)| (key, band.total))
        .collect()
}

/// Load of each gate at exactly `key`. Gates without a point there read as 0;
/// there is no interpolation between neighbouring points.
pub fn per_gate_load_at(series: &GateSeries, key: TimeKey) -> BTreeMap<String, f64> {
    let mut out: BTreeMap<String, f64> = series.keys().map(|g| (g.clone(), 0.0)).collect();
    for (gate, k, point) in keyed_points(series) {
        if k == key {
            if let Some(load) = out.get_mut(gate) {
                *load += point.load();
            }
        }
    }
    out
}

/// Bucket size of the forecast in minutes: the smallest positive gap between
/// consecutive keys of any single gate. Defaults to `DEFAULT_BUCKET_MINUTES`
/// when no gate has two distinct keys.
pub fn native_bucket_minutes(forecast: &Forecast) -> u32 {
    let mut smallest: Option<i64> = None;
    for series in [&forecast.arrivals, &forecast.exits] {
        for points in series.values() {
            let mut keys: Vec<TimeKey> = points
                .iter()
                .filter_map(|p| to_time_key(&p.ds).ok())
                .collect();
            keys.sort();
            keys.dedup();
            for pair in keys.windows(2) {
                let gap = pair[0].minutes_until(&pair[1]);
                if gap > 0 {
                    smallest = Some(smallest.map_or(gap, |s| s.min(gap)));
                }
            }
        }
    }
    smallest
        .and_then(|m| u32::try_from(m).ok())
        .unwrap_or(DEFAULT_BUCKET_MINUTES)
}
