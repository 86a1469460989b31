// lumen-core/src/lib.rs

// 1. Mandatory documentation for production code
#![allow(missing_docs)]
// 2. Memory safety
#![deny(unsafe_code)]
// 3. Robustness
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
// 4. Performance
#![warn(clippy::perf)]

// --- MODULES HEXAGONAUX ---

// 1. Domain (business core)
// Standard rules, naming transforms, domain classifier, DAX scanner,
// standards validator, patch generator. Depends on nothing else.
pub mod domain;

// 2. Infrastructure (Adapters)
// Catalog persistence, PBIP extraction, source discovery, profile files.
// Depends on the Domain.
pub mod infrastructure;

// 3. Application (Use Cases)
// Review pipeline orchestration, sessions, audit trail.
// Depends on the Domain and the Infrastructure.
pub mod application;

// --- GESTION DES ERREURS GLOBALE ---
pub mod error;

// --- RE-EXPORTS (FACADE) ---
// Lets callers import the main error easily: use lumen_core::LumenError;
pub use error::LumenError;
