//! Rank-based composite scoring. Incommensurable metrics are reduced to
//! ordinal ranks within the current subset, blended with a location-fit
//! score into one total order where lower is better.

use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::finance::{price_per_acre, MultiMetrics, SingleMetrics};
use crate::model::Record;

// Rank weights for the three land metrics.
const PPA_WEIGHT: f64 = 0.5;
const ACRES_WEIGHT: f64 = 0.3;
const WATER_WEIGHT: f64 = 0.2;

/// Fixed nudge for records already tagged for an in-person visit, biasing
/// them toward the top. Tunable weight, not a derived quantity.
pub const VISIT_NUDGE: f64 = -0.2;

// Blend between the rank score and the (inverted) location-fit score.
const RANK_BLEND: f64 = 0.7;
const FIT_BLEND: f64 = 0.3;

// Location-fit inputs.
const JOY_WEIGHT: f64 = 0.6;
const WALKABLE_WEIGHT: f64 = 0.4;
const COMMUTE_CAP_MIN: f64 = 90.0;
const WATER_VIBE_BOOST: f64 = 0.05;

// ---------------------------------------------------------------------------
// Ordinal ranks
// ---------------------------------------------------------------------------

/// 1-based ranks per input position, ascending (low is better). A record
/// missing the metric receives exactly `n`, the subset size.
pub fn rank_low(values: &[Option<f64>]) -> Vec<usize> {
    rank_by(values, |a, b| OrderedFloat(a).cmp(&OrderedFloat(b)))
}

/// 1-based ranks per input position, descending (high is better).
pub fn rank_high(values: &[Option<f64>]) -> Vec<usize> {
    rank_by(values, |a, b| OrderedFloat(b).cmp(&OrderedFloat(a)))
}

fn rank_by(values: &[Option<f64>], cmp: impl Fn(f64, f64) -> Ordering) -> Vec<usize> {
    let n = values.len();
    let mut present: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();
    // Stable sort: ties keep arrival order, so re-ranking is idempotent.
    present.sort_by(|a, b| cmp(a.1, b.1));

    let mut ranks = vec![n; n];
    for (pos, (i, _)) in present.into_iter().enumerate() {
        ranks[i] = pos + 1;
    }
    ranks
}

/// Per-metric rank positions for a land subset, parallel to the input slice.
#[derive(Debug, Clone)]
pub struct RankTable {
    pub ppa_low: Vec<usize>,
    pub acres_high: Vec<usize>,
    pub water_low: Vec<usize>,
}

pub fn build_land_ranks(records: &[Record]) -> RankTable {
    let ppa: Vec<_> = records.iter().map(price_per_acre).collect();
    let acres: Vec<_> = records.iter().map(|r| r.number("Acres")).collect();
    let water: Vec<_> = records.iter().map(|r| r.number("WaterProximity")).collect();
    RankTable {
        ppa_low: rank_low(&ppa),
        acres_high: rank_high(&acres),
        water_low: rank_low(&water),
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LandScores {
    /// Weighted rank sum; lower is better.
    pub rank_score: f64,
    /// Location fit; higher is better.
    pub location_fit: f64,
    /// Final blend; lower is better.
    pub composite: f64,
}

/// Weighted rank sum plus the visit nudge.
pub fn rank_score(record: &Record, ranks: &RankTable, index: usize) -> f64 {
    let nudge = if record.effective_tag() == "visit" {
        VISIT_NUDGE
    } else {
        0.0
    };
    ranks.ppa_low[index] as f64 * PPA_WEIGHT
        + ranks.acres_high[index] as f64 * ACRES_WEIGHT
        + ranks.water_low[index] as f64 * WATER_WEIGHT
        + nudge
}

/// Subjective location fit in roughly [0, 1]; unknown inputs resolve to a
/// neutral midpoint rather than being excluded.
pub fn location_fit(record: &Record) -> f64 {
    let joy = match record.number("Joy") {
        Some(j) => j.clamp(0.0, 5.0) / 5.0,
        None => 0.5,
    };
    let walkable = match record.flag("Walkable") {
        Some(true) => 1.0,
        Some(false) => 0.0,
        None => 0.5,
    };
    let commute = record
        .number("CommuteMin")
        .unwrap_or(COMMUTE_CAP_MIN)
        .min(COMMUTE_CAP_MIN);
    let commute_penalty = commute / (2.0 * COMMUTE_CAP_MIN);
    let vibe = if record.flag("WaterVibe") == Some(true) {
        WATER_VIBE_BOOST
    } else {
        0.0
    };
    JOY_WEIGHT * joy + WALKABLE_WEIGHT * walkable - commute_penalty + vibe
}

/// Score every record of a land subset. Output is parallel to the input;
/// sorting is the caller's choice via [`land_order`].
pub fn score_land(records: &[Record]) -> Vec<LandScores> {
    let ranks = build_land_ranks(records);
    records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let rank_score = rank_score(record, &ranks, i);
            let location_fit = location_fit(record);
            // Location fit polarity is inverted so lower stays better.
            let composite = RANK_BLEND * rank_score + FIT_BLEND * (1.0 - location_fit);
            LandScores {
                rank_score,
                location_fit,
                composite,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sort orders
// ---------------------------------------------------------------------------

fn asc_or_last(v: Option<f64>) -> OrderedFloat<f64> {
    OrderedFloat(v.unwrap_or(f64::INFINITY))
}

fn desc_or_last(v: Option<f64>) -> OrderedFloat<f64> {
    OrderedFloat(v.unwrap_or(f64::NEG_INFINITY))
}

/// Land: composite ascending, ties by ascending unit price (absent last).
pub fn land_order(a: &LandScores, a_ppa: Option<f64>, b: &LandScores, b_ppa: Option<f64>) -> Ordering {
    OrderedFloat(a.composite)
        .cmp(&OrderedFloat(b.composite))
        .then_with(|| asc_or_last(a_ppa).cmp(&asc_or_last(b_ppa)))
}

/// Multi-unit: DSCR descending, cap rate descending, price-per-unit
/// ascending (absent last).
pub fn multi_order(a: &MultiMetrics, b: &MultiMetrics) -> Ordering {
    OrderedFloat(b.dscr)
        .cmp(&OrderedFloat(a.dscr))
        .then_with(|| OrderedFloat(b.cap_rate).cmp(&OrderedFloat(a.cap_rate)))
        .then_with(|| asc_or_last(a.price_per_unit).cmp(&asc_or_last(b.price_per_unit)))
}

/// Single-family: rent yield descending (absent last), price ascending
/// (absent last).
pub fn single_order(
    a: &SingleMetrics,
    a_price: Option<f64>,
    b: &SingleMetrics,
    b_price: Option<f64>,
) -> Ordering {
    desc_or_last(b.rent_yield)
        .cmp(&desc_or_last(a.rent_yield))
        .then_with(|| asc_or_last(a_price).cmp(&asc_or_last(b_price)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn land(id: &str, acres: Option<f64>, price: Option<f64>, water: Option<f64>) -> Record {
        let mut r = Record {
            id: Some(id.into()),
            ..Record::default()
        };
        if let Some(a) = acres {
            r.numbers.insert("Acres".into(), a);
        }
        if let Some(p) = price {
            r.numbers.insert("Price".into(), p);
        }
        if let Some(w) = water {
            r.numbers.insert("WaterProximity".into(), w);
        }
        r
    }

    #[test]
    fn rank_low_orders_ascending() {
        let ranks = rank_low(&[Some(30.0), Some(10.0), Some(20.0)]);
        assert_eq!(ranks, [3, 1, 2]);
    }

    #[test]
    fn rank_high_orders_descending() {
        let ranks = rank_high(&[Some(30.0), Some(10.0), Some(20.0)]);
        assert_eq!(ranks, [1, 3, 2]);
    }

    #[test]
    fn missing_metric_gets_worst_case_rank() {
        let ranks = rank_low(&[Some(5.0), None, Some(1.0), None]);
        assert_eq!(ranks, [2, 4, 1, 4]);
    }

    #[test]
    fn rank_completeness() {
        let values = vec![Some(3.0), None, Some(1.0), Some(2.0), None];
        let n = values.len();
        for &rank in &rank_low(&values) {
            assert!(rank >= 1 && rank <= n);
        }
        for &rank in &rank_high(&values) {
            assert!(rank >= 1 && rank <= n);
        }
    }

    #[test]
    fn location_fit_neutral_when_unknown() {
        // All inputs missing: 0.6*0.5 + 0.4*0.5 - 90/180 = 0.0
        let fit = location_fit(&Record::default());
        assert!((fit - 0.0).abs() < 1e-12);
    }

    #[test]
    fn location_fit_rewards_walkable_joy() {
        let mut r = Record::default();
        r.numbers.insert("Joy".into(), 5.0);
        r.flags.insert("Walkable".into(), true);
        r.numbers.insert("CommuteMin".into(), 0.0);
        r.flags.insert("WaterVibe".into(), true);
        assert!((location_fit(&r) - 1.05).abs() < 1e-12);
    }

    #[test]
    fn joy_is_clamped() {
        let mut r = Record::default();
        r.numbers.insert("Joy".into(), 99.0);
        let mut capped = Record::default();
        capped.numbers.insert("Joy".into(), 5.0);
        assert_eq!(location_fit(&r), location_fit(&capped));
    }

    #[test]
    fn visit_nudge_applies() {
        let mut visit = land("a", Some(10.0), Some(100_000.0), None);
        visit.tag = Some("visit".into());
        let plain = land("b", Some(10.0), Some(100_000.0), None);

        let records = vec![visit.clone(), plain.clone()];
        let ranks = build_land_ranks(&records);
        let with_nudge = rank_score(&records[0], &ranks, 0);
        let without = rank_score(&records[1], &ranks, 1);
        // Same metrics, one rank apart; the nudge shifts only the tagged row.
        assert!((with_nudge - (1.0 * 0.5 + 1.0 * 0.3 + 2.0 * 0.2 + VISIT_NUDGE)).abs() < 1e-12);
        assert!((without - (2.0 * 0.5 + 2.0 * 0.3 + 2.0 * 0.2)).abs() < 1e-12);
    }

    #[test]
    fn cheaper_larger_parcel_scores_better() {
        let records = vec![
            land("pricey", Some(2.0), Some(200_000.0), Some(2000.0)),
            land("bargain", Some(20.0), Some(100_000.0), Some(100.0)),
        ];
        let scores = score_land(&records);
        assert!(scores[1].composite < scores[0].composite);
    }

    #[test]
    fn scoring_is_deterministic() {
        let records = vec![
            land("a", Some(10.0), Some(100_000.0), Some(500.0)),
            land("b", Some(8.0), Some(90_000.0), None),
            land("c", None, Some(50_000.0), Some(0.0)),
        ];
        assert_eq!(score_land(&records), score_land(&records));
    }

    #[test]
    fn tie_break_by_unit_price_absent_last() {
        let s = LandScores {
            rank_score: 1.0,
            location_fit: 0.0,
            composite: 1.0,
        };
        assert_eq!(land_order(&s, Some(5_000.0), &s, Some(9_000.0)), Ordering::Less);
        assert_eq!(land_order(&s, None, &s, Some(9_000.0)), Ordering::Greater);
        assert_eq!(land_order(&s, None, &s, None), Ordering::Equal);
    }

    #[test]
    fn multi_order_prefers_coverage() {
        let strong = MultiMetrics {
            egi: 0.0,
            noi: 0.0,
            loan_amount: 0.0,
            monthly_pi: 0.0,
            annual_debt: 0.0,
            cap_rate: 0.07,
            dscr: 1.4,
            price_per_unit: Some(120_000.0),
        };
        let weak = MultiMetrics {
            dscr: 1.1,
            ..strong.clone()
        };
        assert_eq!(multi_order(&strong, &weak), Ordering::Less);
    }

    #[test]
    fn single_order_prefers_yield_then_price() {
        let high = SingleMetrics {
            price_per_sqft: None,
            rent_yield: Some(0.08),
        };
        let low = SingleMetrics {
            price_per_sqft: None,
            rent_yield: Some(0.05),
        };
        assert_eq!(single_order(&high, None, &low, None), Ordering::Less);

        let none = SingleMetrics {
            price_per_sqft: None,
            rent_yield: None,
        };
        assert_eq!(single_order(&none, None, &low, None), Ordering::Greater);
        assert_eq!(
            single_order(&high, Some(100.0), &high, Some(200.0)),
            Ordering::Less
        );
    }
}
