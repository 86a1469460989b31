// lumen-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Session '{0}' not found")]
    #[diagnostic(
        code(lumen::domain::session_not_found),
        help("Sessions live only for the duration of one pipeline run.")
    )]
    SessionNotFound(String),
}
