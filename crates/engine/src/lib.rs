//! `landscout-engine` — Listing triage engine.
//!
//! Pure engine crate: receives pre-parsed rows and a regional benchmark
//! table, returns reconciled, scored, and classified records.
//! No UI or persistence dependencies.

pub mod engine;
pub mod error;
pub mod finance;
pub mod ingest;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod region;
pub mod schema;
pub mod score;
pub mod summary;

pub use engine::{run, AnnotatedRecord, Metrics, TriageResult};
pub use error::TriageError;
pub use model::{RawRow, Record};
pub use region::RegionCache;
pub use schema::FieldSchema;
