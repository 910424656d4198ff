use std::collections::BTreeMap;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single untyped row from any source (manual form, CSV paste, JSON import).
pub type RawRow = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Workflow tag assigned when a record enters the set without one.
pub const TAG_INBOX: &str = "inbox";

/// The canonical listing record. Field values live in per-type maps keyed by
/// declared field name; a missing key is the absence value, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    /// Derived identity (lower-cased identity fields, pipe-joined).
    /// `None` when no identity field was present; such records are never
    /// merge targets and several may coexist.
    pub id: Option<String>,
    /// Workflow tag, always lower-case. `None` means never specified;
    /// reads go through [`Record::effective_tag`].
    pub tag: Option<String>,
    pub strings: BTreeMap<String, String>,
    pub numbers: BTreeMap<String, f64>,
    /// Tri-state amenity flags; a missing key is "unknown", distinct from
    /// `false`.
    pub flags: BTreeMap<String, bool>,
}

impl Record {
    /// Declared string field, empty when missing.
    pub fn text(&self, field: &str) -> &str {
        self.strings.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.numbers.get(field).copied()
    }

    pub fn flag(&self, field: &str) -> Option<bool> {
        self.flags.get(field).copied()
    }

    /// The workflow tag as seen by scoring and bucketing: `"inbox"` until a
    /// tag is assigned.
    pub fn effective_tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(TAG_INBOX)
    }

    pub fn set_tag(&mut self, tag: &str) {
        self.tag = Some(tag.trim().to_lowercase());
    }
}

// ---------------------------------------------------------------------------
// Workflow buckets
// ---------------------------------------------------------------------------

/// Triage buckets grouping workflow tags for display tabs and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Inbox,
    Shortlist,
    Watch,
    Archived,
}

impl Bucket {
    pub const ALL: [Bucket; 4] = [Self::Inbox, Self::Shortlist, Self::Watch, Self::Archived];

    pub fn contains(self, tag: &str) -> bool {
        match self {
            Self::Inbox => tag.is_empty() || tag == TAG_INBOX,
            Self::Shortlist => matches!(tag, "shortlist" | "offer" | "visit"),
            Self::Watch => matches!(tag, "watch" | "hold"),
            Self::Archived => matches!(tag, "archived" | "skip"),
        }
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inbox => write!(f, "inbox"),
            Self::Shortlist => write!(f, "shortlist"),
            Self::Watch => write!(f, "watch"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

// ---------------------------------------------------------------------------
// Display labels
// ---------------------------------------------------------------------------

/// Water proximity (meters) at or below this reads as "near".
pub const WATER_NEAR_MAX: f64 = 900.0;

pub fn water_label(proximity: Option<f64>) -> &'static str {
    match proximity {
        Some(v) if v == 0.0 => "adjacent",
        Some(v) if v.is_finite() && v <= WATER_NEAR_MAX => "near",
        _ => "far",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_tag_defaults_to_inbox() {
        let mut r = Record::default();
        assert_eq!(r.effective_tag(), "inbox");
        r.set_tag(" Visit ");
        assert_eq!(r.effective_tag(), "visit");
    }

    #[test]
    fn bucket_membership() {
        assert!(Bucket::Inbox.contains(""));
        assert!(Bucket::Inbox.contains("inbox"));
        assert!(Bucket::Shortlist.contains("offer"));
        assert!(Bucket::Shortlist.contains("visit"));
        assert!(Bucket::Watch.contains("hold"));
        assert!(Bucket::Archived.contains("skip"));
        assert!(!Bucket::Watch.contains("visit"));
    }

    #[test]
    fn water_labels() {
        assert_eq!(water_label(Some(0.0)), "adjacent");
        assert_eq!(water_label(Some(900.0)), "near");
        assert_eq!(water_label(Some(901.0)), "far");
        assert_eq!(water_label(None), "far");
    }

    #[test]
    fn absent_number_is_none_not_zero() {
        let r = Record::default();
        assert_eq!(r.number("Acres"), None);
        assert_eq!(r.flag("Walkable"), None);
        assert_eq!(r.text("Town"), "");
    }
}
