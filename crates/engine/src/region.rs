//! Regional valuation: place a record's unit price against its region's
//! benchmark distribution and derive a badge, a percentile estimate, and a
//! buy signal. Everything degrades to absence; a missing or malformed
//! benchmark never errors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::finance::price_per_acre;
use crate::model::Record;

// ---------------------------------------------------------------------------
// Benchmark table
// ---------------------------------------------------------------------------

/// Unit-price-per-acre distribution for one region.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct RegionStats {
    pub median_ppacre: f64,
    pub p25: f64,
    pub p75: f64,
}

/// Keyed by region display name. BTreeMap keeps candidate scans
/// deterministic.
pub type RegionTable = BTreeMap<String, RegionStats>;

/// Parse a benchmark feed. A malformed payload, a non-object payload, or an
/// unusable entry degrades to an empty/smaller table rather than an error.
pub fn parse_region_table(input: &str) -> RegionTable {
    match serde_json::from_str::<serde_json::Value>(input) {
        Ok(serde_json::Value::Object(map)) => map
            .into_iter()
            .filter_map(|(name, stats)| {
                serde_json::from_value::<RegionStats>(stats)
                    .ok()
                    .map(|s| (name, s))
            })
            .collect(),
        _ => RegionTable::new(),
    }
}

/// Session-scoped benchmark cache. Explicit, injectable state: populated at
/// most once, and queries before population see an empty table (every record
/// classifies as "region unknown" instead of blocking).
#[derive(Debug, Default)]
pub struct RegionCache {
    stats: Option<RegionTable>,
}

static EMPTY_TABLE: RegionTable = RegionTable::new();

impl RegionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// First population wins; later calls are no-ops.
    pub fn populate(&mut self, table: RegionTable) {
        if self.stats.is_none() {
            self.stats = Some(table);
        }
    }

    pub fn populate_from_json(&mut self, input: &str) {
        self.populate(parse_region_table(input));
    }

    pub fn is_populated(&self) -> bool {
        self.stats.is_some()
    }

    pub fn table(&self) -> &RegionTable {
        self.stats.as_ref().unwrap_or(&EMPTY_TABLE)
    }
}

// ---------------------------------------------------------------------------
// Region inference
// ---------------------------------------------------------------------------

/// Town name (lower-cased) to region display name.
const TOWN_REGIONS: &[(&str, &str)] = &[
    ("monterey", "Berkshires (Western MA)"),
    ("sheffield", "Berkshires (Western MA)"),
    ("becket", "Berkshires (Western MA)"),
    ("hinsdale", "Hilltowns (MA)"),
    ("savoy", "Hilltowns (MA)"),
    ("cummington", "Hilltowns (MA)"),
    ("northampton", "Pioneer Valley (MA)"),
    ("amherst", "Pioneer Valley (MA)"),
    ("hadley", "Pioneer Valley (MA)"),
    ("easthampton", "Pioneer Valley (MA)"),
    ("torrington", "Litchfield Hills (CT)"),
    ("kent", "Litchfield Hills (CT)"),
    ("new milford", "Litchfield Hills (CT)"),
    ("sharon", "Litchfield Hills (CT)"),
];

/// (state, county lower-cased) to region display name.
const COUNTY_REGIONS: &[(&str, &str, &str)] = &[
    ("MA", "berkshire", "Berkshires (Western MA)"),
    ("CT", "litchfield", "Litchfield Hills (CT)"),
];

/// Town lookup, then state+county, then the unique region whose display name
/// encodes the state (e.g. `"(MA)"`). Ambiguity means unknown.
pub fn infer_region(record: &Record, table: &RegionTable) -> Option<String> {
    let town = record.text("Town").to_lowercase();
    let county = record.text("County").to_lowercase();
    let state = record.text("State").to_uppercase();

    if let Some((_, region)) = TOWN_REGIONS.iter().find(|(t, _)| *t == town) {
        return Some((*region).to_string());
    }
    if let Some((_, _, region)) = COUNTY_REGIONS
        .iter()
        .find(|(s, c, _)| *s == state && *c == county)
    {
        return Some((*region).to_string());
    }

    if state.is_empty() {
        return None;
    }
    let needle = format!("({state})");
    let mut candidates = table.keys().filter(|name| name.contains(&needle));
    match (candidates.next(), candidates.next()) {
        (Some(name), None) => Some(name.clone()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Percentile
// ---------------------------------------------------------------------------

/// Tiered percentile estimate: at or below p25 reads 10, at or above p75
/// reads 90, interior values map linearly onto 25..75. The jump at the
/// boundaries is intentional and preserved.
pub fn percentile_rank(value: f64, p25: f64, p75: f64) -> Option<u8> {
    if !value.is_finite() || !p25.is_finite() || !p75.is_finite() || p75 <= p25 {
        return None;
    }
    if value <= p25 {
        return Some(10);
    }
    if value >= p75 {
        return Some(90);
    }
    let pos = (value - p25) / (p75 - p25);
    Some((25.0 + pos * 50.0).round() as u8)
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    Undervalued,
    FairValue,
    Overpriced,
}

impl std::fmt::Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undervalued => write!(f, "undervalued"),
            Self::FairValue => write!(f, "fair value"),
            Self::Overpriced => write!(f, "overpriced"),
        }
    }
}

/// Buy signal from percent deviation below median, independent of the badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    StrongBuy,
    Watch,
    Pass,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrongBuy => write!(f, "strong buy"),
            Self::Watch => write!(f, "watch"),
            Self::Pass => write!(f, "pass"),
        }
    }
}

/// Per-record classification bundle. Every field is absent when no benchmark
/// or no valid unit price exists; nothing is fabricated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionAnalysis {
    pub region_name: Option<String>,
    pub median: Option<f64>,
    pub p25: Option<f64>,
    pub p75: Option<f64>,
    pub percentile: Option<u8>,
    pub badge: Option<Badge>,
    pub detail: Option<String>,
    /// Percent deviation below median (negative when above).
    pub score: Option<f64>,
    pub signal: Option<Signal>,
    pub value_ppa: Option<f64>,
}

pub fn analyze(record: &Record, table: &RegionTable) -> RegionAnalysis {
    let value = price_per_acre(record);
    let region_name = infer_region(record, table);
    let stats = region_name.as_deref().and_then(|name| table.get(name));
    let median = stats.map(|s| s.median_ppacre).and_then(usable);
    let p25 = stats.map(|s| s.p25).and_then(usable);
    let p75 = stats.map(|s| s.p75).and_then(usable);

    let percentile = match (median, value, p25, p75) {
        (Some(_), Some(v), Some(p25), Some(p75)) => percentile_rank(v, p25, p75),
        _ => None,
    };

    let (badge, detail) = match (median, value) {
        (Some(m), Some(v)) => {
            let badge = if p25.is_some_and(|p| v < p) {
                Badge::Undervalued
            } else if p75.is_some_and(|p| v > p) {
                Badge::Overpriced
            } else {
                Badge::FairValue
            };
            let word = match badge {
                Badge::Undervalued => "Undervalued",
                Badge::Overpriced => "Overpriced",
                Badge::FairValue => "Near median",
            };
            let diff_pct = (m - v) / m * 100.0;
            let vs = region_name.as_deref().unwrap_or("region");
            (
                Some(badge),
                Some(format!("{word} vs {vs} by {}%", diff_pct.abs().round())),
            )
        }
        _ => (None, None),
    };

    let (score, signal) = match (median, value) {
        (Some(m), Some(v)) if m > 0.0 => {
            let below = (m - v) / m * 100.0;
            let signal = if below > 25.0 {
                Signal::StrongBuy
            } else if below >= 5.0 {
                Signal::Watch
            } else {
                Signal::Pass
            };
            (Some(below), Some(signal))
        }
        _ => (None, None),
    };

    RegionAnalysis {
        region_name,
        median,
        p25,
        p75,
        percentile,
        badge,
        detail,
        score,
        signal,
        value_ppa: value,
    }
}

// A benchmark figure of zero or worse is as good as missing.
fn usable(v: f64) -> Option<f64> {
    (v.is_finite() && v != 0.0).then_some(v)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
