//! crawline-store: object-store persistence for the pipeline
//!
//! Two consumers share one small key/value contract: the batcher's
//! processed-marker store (content-addressed dedup signals) and the
//! worker's tokenized-document store (freshly keyed artifacts).

pub mod document;
pub mod marker;
pub mod object_store;

pub use document::DocumentStore;
pub use marker::{MarkerStore, marker_key};
pub use object_store::{FsObjectStore, ObjectStore, StoreError};
