// lumen-core/src/infrastructure/mod.rs

pub mod catalog_store;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod fs;
pub mod profiles;

pub use error::InfrastructureError;
