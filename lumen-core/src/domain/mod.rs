pub mod classify;
pub mod error;
pub mod model;
pub mod ports;
pub mod standards;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use error::DomainError;
pub use model::{Column, Measure, ModelStructure, StructureSummary};
