//! Ingestion stages that run on the request path: dedup, disposition
//! classification and translation into canonical activities.

pub mod dedup;
pub mod disposition;
pub mod error;
pub mod translate;

pub use dedup::{DedupKey, DedupStore, Deduplicator, InMemoryStore};
pub use disposition::{Classifier, Disposition};
pub use error::{IngestError, Result, TranslateError};
pub use translate::{translate_command, translate_event, translate_interaction};
