use std::collections::HashMap;

use crate::model::{Record, TAG_INBOX};

/// Reconcile incoming (already normalized) records against an existing set.
///
/// Identity-indexed, O(existing + incoming). Overwrite is value-driven: an
/// incoming field replaces the existing one only when it carries a value, so
/// a blank import never erases something already known, and merging the same
/// batch twice equals merging it once. The workflow tag is the exception:
/// an explicitly specified incoming tag always wins.
pub fn merge_records(existing: &[Record], incoming: Vec<Record>) -> Vec<Record> {
    let mut merged: Vec<Record> = existing.to_vec();
    let mut by_id: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.id.clone().map(|id| (id, i)))
        .collect();

    for mut inc in incoming {
        let Some(id) = inc.id.clone() else {
            // No identity: never a merge target, always a standalone insert.
            if inc.tag.is_none() {
                inc.tag = Some(TAG_INBOX.into());
            }
            merged.push(inc);
            continue;
        };

        match by_id.get(&id) {
            None => {
                if inc.tag.is_none() {
                    inc.tag = Some(TAG_INBOX.into());
                }
                by_id.insert(id, merged.len());
                merged.push(inc);
            }
            Some(&i) => overwrite_populated(&mut merged[i], inc),
        }
    }

    merged
}

fn overwrite_populated(existing: &mut Record, incoming: Record) {
    for (field, value) in incoming.strings {
        if !value.is_empty() {
            existing.strings.insert(field, value);
        }
    }
    for (field, value) in incoming.numbers {
        existing.numbers.insert(field, value);
    }
    for (field, value) in incoming.flags {
        existing.flags.insert(field, value);
    }
    if let Some(tag) = incoming.tag {
        existing.tag = Some(tag.to_lowercase());
    }
}
