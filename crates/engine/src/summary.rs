use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Bucket, Record};

/// Counts over the reconciled set, for tab badges and reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageSummary {
    pub total: usize,
    pub by_bucket: BTreeMap<String, usize>,
    pub by_tag: BTreeMap<String, usize>,
}

pub fn compute_summary(records: &[Record]) -> TriageSummary {
    let mut by_bucket: BTreeMap<String, usize> =
        Bucket::ALL.iter().map(|b| (b.to_string(), 0)).collect();
    let mut by_tag: BTreeMap<String, usize> = BTreeMap::new();

    for record in records {
        let tag = record.effective_tag();
        *by_tag.entry(tag.to_string()).or_insert(0) += 1;
        for bucket in Bucket::ALL {
            if bucket.contains(tag) {
                *by_bucket.entry(bucket.to_string()).or_insert(0) += 1;
            }
        }
    }

    TriageSummary {
        total: records.len(),
        by_bucket,
        by_tag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(tag: Option<&str>) -> Record {
        Record {
            tag: tag.map(String::from),
            ..Record::default()
        }
    }

    #[test]
    fn summary_counts() {
        let records = vec![
            tagged(None),
            tagged(Some("inbox")),
            tagged(Some("visit")),
            tagged(Some("offer")),
            tagged(Some("hold")),
            tagged(Some("skip")),
        ];
        let s = compute_summary(&records);
        assert_eq!(s.total, 6);
        assert_eq!(s.by_bucket["inbox"], 2);
        assert_eq!(s.by_bucket["shortlist"], 2);
        assert_eq!(s.by_bucket["watch"], 1);
        assert_eq!(s.by_bucket["archived"], 1);
        assert_eq!(s.by_tag["inbox"], 2);
        assert_eq!(s.by_tag["visit"], 1);
    }

    #[test]
    fn empty_set() {
        let s = compute_summary(&[]);
        assert_eq!(s.total, 0);
        assert_eq!(s.by_bucket["inbox"], 0);
        assert!(s.by_tag.is_empty());
    }
}
