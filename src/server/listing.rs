//! Listing sessions: one pagination state per opened listing page

use indexmap::IndexMap;
use tokio::sync::Mutex;

use super::ServerError;
use crate::content::PaginationState;
use crate::prismic::FetchError;

/// Outcome of trying to start a "load more" on a session
#[derive(Debug)]
pub enum Claim {
    /// The caller owns the load and must hand the snapshot to `load_more`
    Ready(PaginationState),
    /// Another load for this session has not finished yet
    InFlight,
    /// The listing has no next page
    Exhausted,
}

/// Listing states keyed by session id, oldest first
pub struct ListingStore {
    sessions: Mutex<IndexMap<String, PaginationState>>,
    capacity: usize,
}

impl ListingStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(IndexMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Register a fresh listing and return its session id
    pub async fn create(&self, state: PaginationState) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let mut sessions = self.sessions.lock().await;
        sessions.insert(id.clone(), state);
        while sessions.len() > self.capacity {
            if let Some((evicted, _)) = sessions.shift_remove_index(0) {
                tracing::debug!("Evicted listing session {}", evicted);
            }
        }
        id
    }

    pub async fn get(&self, id: &str) -> Option<PaginationState> {
        self.sessions.lock().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Mark the session in flight. The lock is released before returning,
    /// so the fetch itself runs unlocked.
    pub async fn begin_load(&self, id: &str) -> Result<Claim, ServerError> {
        let mut sessions = self.sessions.lock().await;
        let state = sessions
            .get_mut(id)
            .ok_or_else(|| ServerError::SessionNotFound(id.to_string()))?;

        if state.in_flight {
            return Ok(Claim::InFlight);
        }
        Ok(match state.begin_load() {
            Some(snapshot) => Claim::Ready(snapshot),
            None => Claim::Exhausted,
        })
    }

    /// Commit (or drop, on error) the result of a claimed load
    pub async fn finish_load(
        &self,
        id: &str,
        loaded: Result<PaginationState, FetchError>,
    ) -> Result<usize, FetchError> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(id) {
            Some(state) => state.finish_load(loaded),
            None => {
                tracing::debug!("Listing session {} evicted during load", id);
                loaded.map(|_| 0)
            }
        }
    }
}
