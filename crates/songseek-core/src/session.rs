//! Per-conversation session storage.
//!
//! A session ties one query's results to the pagination and download
//! actions that follow it. Writes overwrite the whole entry.

use crate::search::{Query, ResultSet};
use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

/// Conversation identifier (the chat id)
pub type SessionId = i64;

/// Position in the search/select/download state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    /// No search in progress
    #[default]
    Idle,
    /// `/search` was issued; the next text message is the query. Results
    /// of a previous search stay selectable.
    AwaitingQuery,
    /// A result page is on screen
    ResultsShown,
    /// A selected track is being fetched and delivered
    Downloading,
}

/// State of one conversation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Current phase
    pub phase: Phase,
    /// Active result set (empty unless results were shown)
    pub results: ResultSet,
    /// Query that produced `results`
    pub query: Option<Query>,
    /// Last rendered page
    pub page: usize,
}

impl Session {
    /// Session showing `page` of `results`.
    #[must_use]
    pub const fn results_shown(results: ResultSet, query: Query, page: usize) -> Self {
        Self {
            phase: Phase::ResultsShown,
            results,
            query: Some(query),
            page,
        }
    }

    /// Whether a result page is on screen and accepts selections.
    #[must_use]
    pub fn has_results(&self) -> bool {
        matches!(self.phase, Phase::AwaitingQuery | Phase::ResultsShown)
            && !self.results.is_empty()
    }
}

/// Interface for session storage
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current session; the default Idle session when none is stored.
    async fn get(&self, id: SessionId) -> Session;
    /// Replace the stored session.
    async fn put(&self, id: SessionId, session: Session);
    /// Drop the stored session.
    async fn clear(&self, id: SessionId);
}

/// In-memory session store with idle expiry
#[derive(Clone)]
pub struct InMemorySessionStore {
    cache: Cache<SessionId, Session>,
}

impl InMemorySessionStore {
    /// Creates a store whose entries expire after `ttl_secs` without access.
    ///
    /// # Examples
    ///
    /// ```
    /// use songseek_core::session::InMemorySessionStore;
    ///
    /// let store = InMemorySessionStore::new(86_400, 10_000);
    /// ```
    #[must_use]
    pub fn new(ttl_secs: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_idle(Duration::from_secs(ttl_secs))
            .build();
        Self { cache }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: SessionId) -> Session {
        self.cache.get(&id).await.unwrap_or_default()
    }

    async fn put(&self, id: SessionId, session: Session) {
        debug!(session_id = id, phase = ?session.phase, page = session.page, "Storing session");
        self.cache.insert(id, session).await;
    }

    async fn clear(&self, id: SessionId) {
        debug!(session_id = id, "Clearing session");
        self.cache.invalidate(&id).await;
    }
}
