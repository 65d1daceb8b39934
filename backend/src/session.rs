use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{consolidate, ResultBundle, SessionError, SessionState, Verdict};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Unknown session: {0}")]
    UnknownSession(Uuid),
    #[error(transparent)]
    Session(#[from] SessionError),
}

struct SessionEntry {
    state: SessionState,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionEntry {
    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Busy sessions are never idle; their run still has to settle them.
    fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        !self.state.is_analyzing()
            && (now - self.updated_at).to_std().is_ok_and(|idle| idle > ttl)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub last_uploaded_file: Option<String>,
    pub analyzing: bool,
    pub bundle: Option<ResultBundle>,
    pub verdict: Option<Verdict>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory analysis sessions keyed by id. Every update holds the lock only for the
/// state transition, never across a detector call. Sessions untouched for longer than
/// `idle_ttl` are evicted.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle_ttl,
        }
    }

    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        retain_active(&mut sessions, now, self.idle_ttl);
        sessions.insert(
            id,
            SessionEntry {
                state: SessionState::new(),
                created_at: now,
                updated_at: now,
            },
        );
        log::info!("Created session {}", id);
        id
    }

    /// Drops every idle session and returns how many were removed.
    pub async fn evict_idle(&self) -> usize {
        retain_active(&mut *self.sessions.lock().await, Utc::now(), self.idle_ttl)
    }

    /// Records the uploaded file (clearing results of a different file) and marks the session busy.
    pub async fn select_and_begin(&self, id: Uuid, file_name: &str) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.get_mut(&id).ok_or(SessionStoreError::UnknownSession(id))?;

        if entry.state.on_file_selected(file_name) {
            log::info!("Session {} switched to {}, cleared previous results", id, file_name);
        }
        entry.touch();
        entry.state.begin_analysis()?;
        Ok(())
    }

    /// Stores a finished bundle. Returns `false` when the session has moved on to another file.
    pub async fn complete(&self, id: Uuid, bundle: ResultBundle) -> Result<bool, SessionStoreError> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.get_mut(&id).ok_or(SessionStoreError::UnknownSession(id))?;

        let run_id = bundle.run_id;
        let file_name = bundle.file_name.clone();
        let stored = entry.state.on_analysis_complete(bundle);
        entry.touch();
        if !stored {
            log::warn!(
                "Session {} dropped run {} for {}: file changed to {:?}",
                id,
                run_id,
                file_name,
                entry.state.last_uploaded_file()
            );
        }
        Ok(stored)
    }

    /// Clears the busy flag of a run that ended without a bundle.
    pub async fn fail(&self, id: Uuid) -> Result<(), SessionStoreError> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.get_mut(&id).ok_or(SessionStoreError::UnknownSession(id))?;
        entry.state.on_analysis_failed();
        entry.touch();
        log::warn!("Session {} run ended without results", id);
        Ok(())
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, SessionStoreError> {
        let sessions = self.sessions.lock().await;
        let entry = sessions.get(&id).ok_or(SessionStoreError::UnknownSession(id))?;
        let bundle = entry.state.current_bundle().cloned();
        let verdict = bundle.as_ref().filter(|b| b.mode.is_auto()).map(consolidate);

        Ok(SessionSnapshot {
            session_id: id,
            last_uploaded_file: entry.state.last_uploaded_file().map(str::to_string),
            analyzing: entry.state.is_analyzing(),
            bundle,
            verdict,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        })
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.lock().await.remove(&id).is_some();
        if removed {
            log::info!("Removed session {}", id);
        }
        removed
    }
}

fn retain_active(
    sessions: &mut HashMap<Uuid, SessionEntry>,
    now: DateTime<Utc>,
    ttl: Duration,
) -> usize {
    let before = sessions.len();
    sessions.retain(|_, entry| !entry.is_idle(now, ttl));
    let evicted = before - sessions.len();
    if evicted > 0 {
        log::info!("Evicted {} idle session(s)", evicted);
    }
    evicted
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{AnalysisMode, DetectorResult, ManualSelection};

    fn store() -> SessionStore {
        SessionStore::new(Duration::from_secs(3600))
    }

    fn bundle(file_name: &str, mode: AnalysisMode) -> ResultBundle {
        let payload = serde_json::from_value(serde_json::json!({
            "is_forged": true, "probability": 0.66
        }))
        .unwrap();
        ResultBundle::new(file_name, mode, Some(DetectorResult::Success(payload)), None)
    }

    #[tokio::test]
    async fn unknown_session_is_rejected() {
        let store = store();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.select_and_begin(id, "a.png").await,
            Err(SessionStoreError::UnknownSession(_))
        ));
        assert!(matches!(store.snapshot(id).await, Err(SessionStoreError::UnknownSession(_))));
    }

    #[tokio::test]
    async fn completed_auto_run_exposes_verdict() {
        let store = store();
        let id = store.create().await;

        store.select_and_begin(id, "a.png").await.unwrap();
        assert!(store.snapshot(id).await.unwrap().analyzing);

        assert!(store.complete(id, bundle("a.png", AnalysisMode::Auto)).await.unwrap());
        let snapshot = store.snapshot(id).await.unwrap();
        assert!(!snapshot.analyzing);
        assert_eq!(snapshot.last_uploaded_file.as_deref(), Some("a.png"));
        let verdict = snapshot.verdict.unwrap();
        assert!(verdict.is_tampered_or_generated);
        assert_eq!(verdict.confidence, 0.66);
    }

    #[tokio::test]
    async fn manual_run_has_no_verdict() {
        let store = store();
        let id = store.create().await;
        let mode = AnalysisMode::Manual(ManualSelection::TamperedOnly);

        store.select_and_begin(id, "a.png").await.unwrap();
        store.complete(id, bundle("a.png", mode)).await.unwrap();

        let snapshot = store.snapshot(id).await.unwrap();
        assert!(snapshot.bundle.is_some());
        assert!(snapshot.verdict.is_none());
    }

    #[tokio::test]
    async fn busy_session_refuses_new_run_and_drops_stale_result() {
        let store = store();
        let id = store.create().await;

        store.select_and_begin(id, "a.png").await.unwrap();
        assert!(matches!(
            store.select_and_begin(id, "b.png").await,
            Err(SessionStoreError::Session(SessionError::AnalysisInProgress))
        ));

        assert!(!store.complete(id, bundle("a.png", AnalysisMode::Auto)).await.unwrap());
        let snapshot = store.snapshot(id).await.unwrap();
        assert!(snapshot.bundle.is_none());
        assert_eq!(snapshot.last_uploaded_file.as_deref(), Some("b.png"));

        store.select_and_begin(id, "b.png").await.unwrap();
        assert!(store.complete(id, bundle("b.png", AnalysisMode::Auto)).await.unwrap());
    }

    #[tokio::test]
    async fn removed_session_is_gone() {
        let store = store();
        let id = store.create().await;
        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert!(matches!(
            store.complete(id, bundle("a.png", AnalysisMode::Auto)).await,
            Err(SessionStoreError::UnknownSession(_))
        ));
    }

    #[tokio::test]
    async fn failed_run_frees_the_session() {
        let store = store();
        let id = store.create().await;

        store.select_and_begin(id, "a.png").await.unwrap();
        store.fail(id).await.unwrap();
        assert!(!store.snapshot(id).await.unwrap().analyzing);
        store.select_and_begin(id, "a.png").await.unwrap();

        assert!(matches!(
            store.fail(Uuid::new_v4()).await,
            Err(SessionStoreError::UnknownSession(_))
        ));
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_on_create() {
        let store = SessionStore::new(Duration::from_millis(20));
        let stale = store.create().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let fresh = store.create().await;
        assert_eq!(store.sessions.lock().await.len(), 1);
        assert!(matches!(
            store.snapshot(stale).await,
            Err(SessionStoreError::UnknownSession(_))
        ));
        assert!(store.snapshot(fresh).await.is_ok());
    }

    #[tokio::test]
    async fn busy_sessions_survive_eviction() {
        let store = SessionStore::new(Duration::from_millis(20));
        let busy = store.create().await;
        let idle = store.create().await;
        store.select_and_begin(busy, "a.png").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.evict_idle().await, 1);
        assert!(store.snapshot(busy).await.is_ok());
        assert!(store.snapshot(idle).await.is_err());

        store.complete(busy, bundle("a.png", AnalysisMode::Auto)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.evict_idle().await, 1);
        assert!(store.sessions.lock().await.is_empty());
    }
}
