// lumen-core/src/application/session.rs

use crate::domain::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// One action recorded in a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub user: String,
    pub action: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Append-only audit line, shared across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub user: String,
    pub action: String,
    pub status: String,
}

/// Append-only log of every session action.
#[derive(Debug, Default)]
pub struct AuditTrail {
    records: Vec<AuditRecord>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, session_id: &str, user: &str, action: &str, status: &str) {
        self.records.push(AuditRecord {
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
            user: user.to_string(),
            action: action.to_string(),
            status: status.to_string(),
        });
    }

    pub fn session_records(&self, session_id: &str) -> Vec<AuditRecord> {
        self.records
            .iter()
            .filter(|record| record.session_id == session_id)
            .cloned()
            .collect()
    }

    pub fn export(&self) -> &[AuditRecord] {
        &self.records
    }
}

#[derive(Debug, Clone)]
struct Session {
    status: String,
    context: Map<String, Value>,
    history: Vec<HistoryEntry>,
    updated_at: DateTime<Utc>,
}

/// Review sessions: uuid identifiers, per-session context and history, with
/// every transition mirrored into the audit trail.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: HashMap<String, Session>,
    audit: AuditTrail,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_session(&mut self, user: &str, context: Map<String, Value>) -> String {
        let session_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let init = HistoryEntry {
            timestamp: now,
            user: user.to_string(),
            action: "init".to_string(),
            status: "started".to_string(),
            payload: None,
        };
        self.sessions.insert(
            session_id.clone(),
            Session {
                status: "started".to_string(),
                context,
                history: vec![init],
                updated_at: now,
            },
        );
        self.audit.log(&session_id, user, "init", "started");
        session_id
    }

    pub fn process_session(
        &mut self,
        session_id: &str,
        action: &str,
        user: &str,
        payload: Option<Value>,
    ) -> Result<HistoryEntry, DomainError> {
        let session = self.require_session(session_id)?;
        let now = Utc::now();
        session.status = "processing".to_string();
        session.updated_at = now;

        let entry = HistoryEntry {
            timestamp: now,
            user: user.to_string(),
            action: action.to_string(),
            status: "ok".to_string(),
            payload,
        };
        session.history.push(entry.clone());
        self.audit.log(session_id, user, action, "ok");
        Ok(entry)
    }

    pub fn close_session(
        &mut self,
        session_id: &str,
        user: &str,
    ) -> Result<HistoryEntry, DomainError> {
        let session = self.require_session(session_id)?;
        let now = Utc::now();
        session.status = "closed".to_string();
        session.updated_at = now;

        let entry = HistoryEntry {
            timestamp: now,
            user: user.to_string(),
            action: "close".to_string(),
            status: "closed".to_string(),
            payload: None,
        };
        session.history.push(entry.clone());
        self.audit.log(session_id, user, "close", "closed");
        Ok(entry)
    }

    pub fn history(&self, session_id: &str) -> Result<&[HistoryEntry], DomainError> {
        self.sessions
            .get(session_id)
            .map(|session| session.history.as_slice())
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))
    }

    pub fn context(&self, session_id: &str) -> Result<&Map<String, Value>, DomainError> {
        self.sessions
            .get(session_id)
            .map(|session| &session.context)
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))
    }

    pub fn status(&self, session_id: &str) -> Result<&str, DomainError> {
        self.sessions
            .get(session_id)
            .map(|session| session.status.as_str())
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))
    }

    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }

    fn require_session(&mut self, session_id: &str) -> Result<&mut Session, DomainError> {
        self.sessions
            .get_mut(session_id)
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))
    }
}
