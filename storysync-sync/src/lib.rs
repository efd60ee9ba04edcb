//! # storysync-sync
//!
//! Import and export orchestration.
//!
//! [`import_documents`] pushes story documents to Linear and writes new
//! ids back into them; [`export_records`] pulls matching issues into a
//! single document. Both take the remote client and file access as
//! injected collaborators.

pub mod error;
pub mod exporter;
pub mod importer;
pub mod store;

pub use error::SyncError;
pub use exporter::{export_records, ExportOptions, ExportOutcome};
pub use importer::{import_documents, ImportOptions};
pub use store::{DocumentStore, FsStore};
