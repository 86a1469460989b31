// lumen-core/src/application/mod.rs

pub mod pipeline;
pub mod session;

pub use pipeline::{ReviewPipeline, RunReport, SourceSummary};
pub use session::{AuditRecord, AuditTrail, HistoryEntry, SessionManager};
