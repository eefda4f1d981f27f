//! Session storage.
//!
//! `SessionStore` is the seam between the HTTP surface and whatever keeps the
//! records. `MemoryStore` is the process-local implementation; callers share
//! it behind a lock, which serializes writes.

use crate::config::StoreConfig;
use crate::error::{LedgerError, Result};
use crate::types::{NewSession, Session, SessionPatch};
use chrono::Utc;
use std::path::Path;

/// CRUD contract over session records.
pub trait SessionStore: Send + Sync {
    /// All sessions in insertion order.
    fn list(&self) -> Vec<Session>;

    fn get(&self, id: &str) -> Result<Session>;

    /// Assign a fresh id, store the record, and return it.
    fn create(&mut self, data: NewSession) -> Result<Session>;

    /// Merge `patch` into the record with `id`. The id never changes.
    fn update(&mut self, id: &str, patch: SessionPatch) -> Result<Session>;

    fn delete(&mut self, id: &str) -> Result<()>;

    fn len(&self) -> usize {
        self.list().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store keeping sessions in insertion order.
#[derive(Debug)]
pub struct MemoryStore {
    sessions: Vec<Session>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
            next_id: 1,
        }
    }

    /// Build a store pre-populated with `sessions`. Ids must be unique.
    pub fn with_sessions(sessions: Vec<Session>) -> Result<Self> {
        let mut store = Self::new();
        for session in sessions {
            session.validate()?;
            if store.position(&session.id).is_some() {
                return Err(LedgerError::Validation(format!(
                    "duplicate session id: {}",
                    session.id
                )));
            }
            store.bump_next_id(&session.id);
            store.sessions.push(session);
        }
        Ok(store)
    }

    /// Build a store from the configured seed sources.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let mut sessions = Vec::new();
        if config.demo_data {
            sessions.extend(crate::seed::demo_sessions());
        }
        if let Some(path) = &config.seed_file {
            sessions.extend(load_seed_file(path)?);
        }
        let store = Self::with_sessions(sessions)?;
        tracing::info!("Session store ready with {} sessions", store.sessions.len());
        Ok(store)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    /// Keep ids monotonic: never hand out an id at or below a numeric id
    /// that has been stored.
    fn bump_next_id(&mut self, id: &str) {
        if let Ok(n) = id.parse::<u64>() {
            self.next_id = self.next_id.max(n.saturating_add(1));
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemoryStore {
    fn list(&self) -> Vec<Session> {
        self.sessions.clone()
    }

    fn get(&self, id: &str) -> Result<Session> {
        self.position(id)
            .map(|idx| self.sessions[idx].clone())
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    fn create(&mut self, data: NewSession) -> Result<Session> {
        let mut next = self.next_id;
        while self.position(&next.to_string()).is_some() {
            next = next
                .checked_add(1)
                .ok_or_else(|| LedgerError::Validation("id space exhausted".into()))?;
        }
        let session = data
            .into_session(next.to_string(), Utc::now())
            .inspect_err(|e| {
                tracing::warn!("Rejected new session: {}", e);
            })?;
        self.next_id = next.saturating_add(1);
        tracing::info!(
            "Created session {} (player {}, machine {})",
            session.id,
            session.player_id,
            session.machine_id
        );
        self.sessions.push(session.clone());
        Ok(session)
    }

    fn update(&mut self, id: &str, patch: SessionPatch) -> Result<Session> {
        let idx = self
            .position(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        if patch.is_empty() {
            return Ok(self.sessions[idx].clone());
        }
        let candidate = patch.merged_with(&self.sessions[idx]);
        candidate.validate().inspect_err(|e| {
            tracing::warn!("Rejected update to session {}: {}", id, e);
        })?;
        self.sessions[idx] = candidate.clone();
        tracing::info!("Updated session {}", id);
        Ok(candidate)
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let idx = self
            .position(id)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))?;
        self.sessions.remove(idx);
        tracing::info!("Deleted session {}", id);
        Ok(())
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}

/// Read a JSON array of sessions.
pub fn load_seed_file(path: &Path) -> Result<Vec<Session>> {
    let json = std::fs::read_to_string(path)?;
    let sessions: Vec<Session> = serde_json::from_str(&json)?;
    tracing::debug!("Loaded {} sessions from {:?}", sessions.len(), path);
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_session(player: &str, machine: &str, investment: i64, payout: i64) -> NewSession {
        NewSession {
            player_id: player.into(),
            machine_id: machine.into(),
            investment,
            payout,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let mut store = MemoryStore::new();
        let a = store.create(new_session("1", "1", 100, 200)).unwrap();
        let b = store.create(new_session("2", "2", 100, 50)).unwrap();
        assert_eq!(a.id, "1");
        assert_eq!(b.id, "2");
        assert_eq!(store.len(), 2);
        assert_eq!(store.list()[0], a);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let mut store = MemoryStore::new();
        store.create(new_session("1", "1", 0, 0)).unwrap();
        let b = store.create(new_session("1", "1", 0, 0)).unwrap();
        store.delete(&b.id).unwrap();
        let c = store.create(new_session("1", "1", 0, 0)).unwrap();
        assert_eq!(c.id, "3");
    }

    #[test]
    fn test_missing_ending_count_stored_as_zero() {
        let mut store = MemoryStore::new();
        let data: NewSession =
            serde_json::from_str(r#"{"player_id":"1","machine_id":"2","investment":5000}"#)
                .unwrap();
        let created = store.create(data).unwrap();
        assert_eq!(created.ending_count, 0);
        assert_eq!(store.get(&created.id).unwrap().ending_count, 0);
    }

    #[test]
    fn test_invalid_create_leaves_store_unchanged() {
        let mut store = MemoryStore::new();
        let err = store.create(new_session("", "1", 100, 0)).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(store.is_empty());
        // The rejected request does not burn an id.
        assert_eq!(store.create(new_session("1", "1", 0, 0)).unwrap().id, "1");
    }

    #[test]
    fn test_update_merges_and_keeps_id() {
        let mut store = MemoryStore::new();
        let created = store.create(new_session("1", "1", 20000, 35000)).unwrap();
        let patch = SessionPatch {
            payout: Some(10000),
            notes: Some("corrected".into()),
            ..Default::default()
        };
        let updated = store.update(&created.id, patch).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.payout, 10000);
        assert_eq!(updated.investment, 20000);
        assert_eq!(store.get(&created.id).unwrap(), updated);
    }

    #[test]
    fn test_empty_update_is_noop() {
        let mut store = MemoryStore::new();
        let created = store.create(new_session("1", "1", 20000, 35000)).unwrap();
        let updated = store.update(&created.id, SessionPatch::default()).unwrap();
        assert_eq!(updated, created);
    }

    #[test]
    fn test_invalid_update_leaves_record_unchanged() {
        let mut store = MemoryStore::new();
        let created = store.create(new_session("1", "1", 20000, 35000)).unwrap();
        let patch = SessionPatch {
            payout: Some(1),
            investment: Some(-5),
            ..Default::default()
        };
        assert!(store.update(&created.id, patch).is_err());
        assert_eq!(store.get(&created.id).unwrap(), created);
    }

    #[test]
    fn test_update_unknown_id_not_found() {
        let mut store = MemoryStore::new();
        let err = store.update("404", SessionPatch::default()).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn test_delete_removes_and_unknown_fails() {
        let mut store = MemoryStore::new();
        let a = store.create(new_session("1", "1", 0, 0)).unwrap();
        let b = store.create(new_session("1", "1", 0, 0)).unwrap();
        store.delete(&a.id).unwrap();
        assert!(store.list().iter().all(|s| s.id != a.id));
        assert_eq!(store.list(), vec![b]);
        assert!(matches!(store.delete(&a.id), Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn test_demo_seed_continues_ids() {
        let config = StoreConfig {
            demo_data: true,
            seed_file: None,
        };
        let mut store = MemoryStore::from_config(&config).unwrap();
        assert_eq!(store.len(), 5);
        let created = store.create(new_session("5", "6", 0, 0)).unwrap();
        assert_eq!(created.id, "6");
    }

    #[test]
    fn test_seed_file_loaded() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("seed.json");
        std::fs::write(
            &path,
            r#"[{"id":"10","date":"2025-06-01T09:00:00Z","player_id":"2","machine_id":"4",
                "starting_count":0,"investment":1000,"ending_count":10,"payout":3000,"notes":""}]"#,
        )
        .unwrap();
        let config = StoreConfig {
            demo_data: false,
            seed_file: Some(path),
        };
        let mut store = MemoryStore::from_config(&config).unwrap();
        assert_eq!(store.get("10").unwrap().profit(), 2000);
        assert_eq!(store.create(new_session("1", "1", 0, 0)).unwrap().id, "11");
    }

    #[test]
    fn test_exhausted_id_space_is_an_error() {
        let mut seeded = crate::seed::demo_sessions().remove(0);
        seeded.id = u64::MAX.to_string();
        let mut store = MemoryStore::with_sessions(vec![seeded]).unwrap();
        let err = store.create(new_session("1", "1", 0, 0)).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_last_free_id_is_handed_out_once() {
        let mut seeded = crate::seed::demo_sessions().remove(0);
        seeded.id = (u64::MAX - 1).to_string();
        let mut store = MemoryStore::with_sessions(vec![seeded]).unwrap();
        let created = store.create(new_session("1", "1", 0, 0)).unwrap();
        assert_eq!(created.id, u64::MAX.to_string());
        assert!(store.create(new_session("1", "1", 0, 0)).is_err());
    }

    #[test]
    fn test_duplicate_seed_ids_rejected() {
        let mut sessions = crate::seed::demo_sessions();
        sessions.push(sessions[0].clone());
        assert!(matches!(
            MemoryStore::with_sessions(sessions),
            Err(LedgerError::Validation(_))
        ));
    }
}
