use serde::Serialize;

use crate::error::TriageError;
use crate::finance::{derive_multi, derive_single, price_per_acre, MultiMetrics, SingleMetrics};
use crate::merge::merge_records;
use crate::model::{RawRow, Record};
use crate::normalize::normalize_row;
use crate::region::{analyze, RegionAnalysis, RegionCache};
use crate::schema::{FieldSchema, RecordKind};
use crate::score::{land_order, multi_order, score_land, single_order, LandScores};
use crate::summary::{compute_summary, TriageSummary};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct TriageMeta {
    pub schema_name: String,
    pub kind: RecordKind,
    pub engine_version: String,
    pub run_at: String,
}

/// Per-kind derived metrics attached to each record.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Metrics {
    Land {
        value_ppa: Option<f64>,
        scores: LandScores,
    },
    MultiFamily(MultiMetrics),
    SingleFamily(SingleMetrics),
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnotatedRecord {
    pub record: Record,
    pub metrics: Metrics,
    /// Regional valuation; attached for land records only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<RegionAnalysis>,
}

#[derive(Debug, Serialize)]
pub struct TriageResult {
    pub meta: TriageMeta,
    pub summary: TriageSummary,
    /// Reconciled records in display order (best first).
    pub records: Vec<AnnotatedRecord>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run one triage pass: normalize incoming rows, reconcile them against the
/// existing set, derive financial metrics and regional valuation, and order
/// the result. Deterministic for identical inputs (modulo `run_at`).
pub fn run(
    schema: &FieldSchema,
    existing: &[Record],
    incoming: &[RawRow],
    regions: &RegionCache,
) -> Result<TriageResult, TriageError> {
    schema.validate()?;

    let normalized: Vec<Record> = incoming
        .iter()
        .map(|raw| normalize_row(raw, schema))
        .collect();
    let merged = merge_records(existing, normalized);
    let summary = compute_summary(&merged);

    let mut records = annotate(schema.kind, merged, regions);
    sort_annotated(schema.kind, &mut records);

    Ok(TriageResult {
        meta: TriageMeta {
            schema_name: schema.name.clone(),
            kind: schema.kind,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        records,
    })
}

fn annotate(kind: RecordKind, merged: Vec<Record>, regions: &RegionCache) -> Vec<AnnotatedRecord> {
    match kind {
        RecordKind::Land => {
            let scores = score_land(&merged);
            merged
                .into_iter()
                .zip(scores)
                .map(|(record, scores)| {
                    let region = analyze(&record, regions.table());
                    AnnotatedRecord {
                        metrics: Metrics::Land {
                            value_ppa: price_per_acre(&record),
                            scores,
                        },
                        region: Some(region),
                        record,
                    }
                })
                .collect()
        }
        RecordKind::MultiFamily => merged
            .into_iter()
            .map(|record| AnnotatedRecord {
                metrics: Metrics::MultiFamily(derive_multi(&record)),
                region: None,
                record,
            })
            .collect(),
        RecordKind::SingleFamily => merged
            .into_iter()
            .map(|record| AnnotatedRecord {
                metrics: Metrics::SingleFamily(derive_single(&record)),
                region: None,
                record,
            })
            .collect(),
    }
}

fn sort_annotated(kind: RecordKind, records: &mut [AnnotatedRecord]) {
    match kind {
        RecordKind::Land => records.sort_by(|a, b| match (&a.metrics, &b.metrics) {
            (
                Metrics::Land {
                    value_ppa: a_ppa,
                    scores: a_scores,
                },
                Metrics::Land {
                    value_ppa: b_ppa,
                    scores: b_scores,
                },
            ) => land_order(a_scores, *a_ppa, b_scores, *b_ppa),
            _ => std::cmp::Ordering::Equal,
        }),
        RecordKind::MultiFamily => records.sort_by(|a, b| match (&a.metrics, &b.metrics) {
            (Metrics::MultiFamily(ma), Metrics::MultiFamily(mb)) => multi_order(ma, mb),
            _ => std::cmp::Ordering::Equal,
        }),
        RecordKind::SingleFamily => records.sort_by(|a, b| match (&a.metrics, &b.metrics) {
            (Metrics::SingleFamily(sa), Metrics::SingleFamily(sb)) => {
                single_order(sa, a.record.number("Price"), sb, b.record.number("Price"))
            }
            _ => std::cmp::Ordering::Equal,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
