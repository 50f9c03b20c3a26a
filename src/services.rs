pub mod batch_service;

pub use batch_service::{BatchError, BatchExport, BatchOutcome, BatchService, Diagnostic};
