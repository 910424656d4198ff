use serde::{Deserialize, Serialize};

use crate::error::TriageError;

// ---------------------------------------------------------------------------
// Record kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Land,
    MultiFamily,
    SingleFamily,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Land => write!(f, "land"),
            Self::MultiFamily => write!(f, "multi_family"),
            Self::SingleFamily => write!(f, "single_family"),
        }
    }
}

// ---------------------------------------------------------------------------
// Field schema
// ---------------------------------------------------------------------------

/// Identity fields used when a schema does not declare its own.
pub const DEFAULT_ID_FIELDS: &[&str] = &["State", "County", "Town", "Parcel"];

/// Reserved workflow-tag field name; handled by the tag path when
/// `lower_tags` is set, never stored as an ordinary string field.
pub const TAG_FIELD: &str = "Tag";

/// Declares, per record type, which raw keys are strings, numbers, and
/// tri-state flags, plus identity derivation. Configuration is data: one
/// normalizer serves every record type.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub kind: RecordKind,
    #[serde(default)]
    pub strings: Vec<String>,
    #[serde(default)]
    pub numbers: Vec<String>,
    #[serde(default)]
    pub booleans: Vec<String>,
    /// Handle the `Tag` key as a lower-cased workflow tag.
    #[serde(default)]
    pub lower_tags: bool,
    /// Ordered identity fields, joined to derive the record id.
    /// Falls back to [`DEFAULT_ID_FIELDS`] when absent.
    #[serde(default)]
    pub id_fields: Option<Vec<String>>,
}

impl FieldSchema {
    pub fn from_toml(input: &str) -> Result<Self, TriageError> {
        let schema: FieldSchema =
            toml::from_str(input).map_err(|e| TriageError::SchemaParse(e.to_string()))?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn validate(&self) -> Result<(), TriageError> {
        let mut seen = std::collections::BTreeSet::new();
        for field in self
            .strings
            .iter()
            .chain(&self.numbers)
            .chain(&self.booleans)
        {
            if !seen.insert(field.as_str()) {
                return Err(TriageError::SchemaValidation(format!(
                    "field '{field}' declared in more than one category"
                )));
            }
        }

        if seen.is_empty() {
            return Err(TriageError::SchemaValidation(
                "schema declares no fields".into(),
            ));
        }

        if let Some(ref id_fields) = self.id_fields {
            if id_fields.is_empty() {
                return Err(TriageError::SchemaValidation(
                    "id_fields must not be empty when present".into(),
                ));
            }
            for field in id_fields {
                if !seen.contains(field.as_str()) {
                    return Err(TriageError::SchemaValidation(format!(
                        "identity field '{field}' is not declared"
                    )));
                }
            }
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Built-in record types
    // -----------------------------------------------------------------------

    /// Land parcel listings; identity = State|County|Town|Parcel.
    pub fn land() -> Self {
        Self {
            name: "Land parcels".into(),
            kind: RecordKind::Land,
            strings: str_vec(&["State", "County", "Town", "Parcel", "Link", "Note"]),
            numbers: str_vec(&[
                "Acres",
                "Price",
                "WaterProximity",
                "Lat",
                "Lon",
                "CommuteMin",
                "Joy",
            ]),
            booleans: str_vec(&["Walkable", "WaterVibe"]),
            lower_tags: true,
            id_fields: None,
        }
    }

    /// Multi-unit income properties; identity = State|City|Address.
    pub fn multi_family() -> Self {
        Self {
            name: "Multi-family".into(),
            kind: RecordKind::MultiFamily,
            strings: str_vec(&["Address", "City", "State", "Notes", "Link"]),
            numbers: str_vec(&[
                "Units",
                "RentPerUnit",
                "VacancyPercent",
                "OtherIncomeMonthly",
                "TaxesAnnual",
                "InsuranceAnnual",
                "OpExAnnual",
                "Price",
                "DownPercent",
                "RatePercent",
                "TermYears",
                "HOAmonthly",
                "Lat",
                "Lon",
            ]),
            booleans: Vec::new(),
            lower_tags: true,
            id_fields: Some(str_vec(&["State", "City", "Address"])),
        }
    }

    /// Single-family homes; identity = State|City|Address.
    pub fn single_family() -> Self {
        Self {
            name: "Single-family".into(),
            kind: RecordKind::SingleFamily,
            strings: str_vec(&["Address", "City", "State", "Notes", "Link"]),
            numbers: str_vec(&[
                "Beds",
                "Baths",
                "Sqft",
                "Price",
                "RentZestimate",
                "TaxesAnnual",
                "InsuranceAnnual",
                "HOAmonthly",
                "Lat",
                "Lon",
            ]),
            booleans: Vec::new(),
            lower_tags: true,
            id_fields: Some(str_vec(&["State", "City", "Address"])),
        }
    }
}

fn str_vec(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|s| s.to_string()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
