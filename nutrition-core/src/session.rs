//! Per-session query limiting.
//!
//! Every browser session (or CLI run) owns one [`QueryCounter`]. The counter is
//! the only mutable state shared between requests of a session, and it lives
//! exactly as long as the [`Session`] that holds it.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::env;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::ai::ConfigError;
use crate::error::AnalysisError;

/// Default number of analyses allowed per session.
pub const DEFAULT_QUERY_LIMIT: u32 = 5;

/// Default session lifetime (1 hour).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// Counts completed analyses and refuses to dispatch past the limit.
#[derive(Debug)]
pub struct QueryCounter {
    limit: u32,
    /// Completed plus in-flight queries.
    reserved: AtomicU32,
    completed: AtomicU32,
}

impl QueryCounter {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            reserved: AtomicU32::new(0),
            completed: AtomicU32::new(0),
        }
    }

    /// Reserve a slot for one dispatch.
    ///
    /// The check and the reservation happen in a single atomic step, so two
    /// submissions racing for the last slot cannot both get it.
    pub fn try_acquire(&self) -> Result<QueryPermit<'_>, AnalysisError> {
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.limit).then_some(n + 1)
            })
            .map_err(|_| AnalysisError::LimitReached { limit: self.limit })?;

        Ok(QueryPermit {
            counter: self,
            committed: false,
        })
    }

    /// Number of completed queries.
    pub fn count(&self) -> u32 {
        self.completed.load(Ordering::Acquire)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Slots still available, not counting in-flight queries.
    pub fn remaining(&self) -> u32 {
        self.limit
            .saturating_sub(self.reserved.load(Ordering::Acquire))
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

impl Default for QueryCounter {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY_LIMIT)
    }
}

/// A reserved query slot.
///
/// Call [`commit`](QueryPermit::commit) once the model has answered. Dropping
/// the permit without committing gives the slot back.
#[derive(Debug)]
#[must_use = "dropping a permit without committing releases the slot"]
pub struct QueryPermit<'a> {
    counter: &'a QueryCounter,
    committed: bool,
}

impl QueryPermit<'_> {
    /// Record the query as completed. Returns the new completed count.
    pub fn commit(mut self) -> u32 {
        self.committed = true;
        self.counter.completed.fetch_add(1, Ordering::AcqRel) + 1
    }
}

impl Drop for QueryPermit<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.counter.reserved.fetch_sub(1, Ordering::AcqRel);
        }
    }
}

/// Session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub query_limit: u32,
    pub ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            query_limit: DEFAULT_QUERY_LIMIT,
            ttl: DEFAULT_SESSION_TTL,
        }
    }
}

impl SessionConfig {
    /// Load session settings from environment variables.
    ///
    /// Optional:
    /// - `NUTRITION_QUERY_LIMIT`: Analyses per session (default: 5)
    /// - `NUTRITION_SESSION_TTL_SECS`: Session lifetime in seconds (default: 3600)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let query_limit = parse_var(&lookup, "NUTRITION_QUERY_LIMIT")?.unwrap_or(DEFAULT_QUERY_LIMIT);
        let ttl = parse_var::<u64, _>(&lookup, "NUTRITION_SESSION_TTL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SESSION_TTL);

        Ok(Self { query_limit, ttl })
    }
}

fn parse_var<T, F>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value,
            }),
    }
}

/// One user session and its query counter.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub counter: QueryCounter,
}

impl Session {
    pub fn new(query_limit: u32, ttl: Duration) -> Self {
        let created_at = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| created_at.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self {
            id: Uuid::new_v4(),
            created_at,
            expires_at,
            counter: QueryCounter::new(query_limit),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// In-memory registry of live sessions.
///
/// Creating a session is the only way to get a fresh counter; expired
/// sessions are dropped on lookup and by [`purge_expired`](SessionStore::purge_expired).
#[derive(Debug)]
pub struct SessionStore {
    config: SessionConfig,
    sessions: DashMap<Uuid, Arc<Session>>,
}

impl SessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(self.config.query_limit, self.config.ttl));
        self.sessions.insert(session.id, Arc::clone(&session));
        tracing::debug!(session_id = %session.id, "Session created");
        session
    }

    /// Look up a live session. An expired session is removed and reported as absent.
    pub fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        let session = self.sessions.get(id).map(|entry| Arc::clone(entry.value()))?;

        if session.is_expired() {
            self.sessions.remove(id);
            tracing::debug!(session_id = %id, "Session expired");
            return None;
        }

        Some(session)
    }

    /// Tear down a session. Returns false if it did not exist.
    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::debug!(session_id = %id, "Session removed");
        }
        removed
    }

    /// Drop every expired session, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired_at(now));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_counter_starts_at_zero() {
        let counter = QueryCounter::default();
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.limit(), DEFAULT_QUERY_LIMIT);
        assert_eq!(counter.remaining(), DEFAULT_QUERY_LIMIT);
    }

    #[test]
    fn test_sixth_query_refused() {
        let counter = QueryCounter::new(5);
        for expected in 1..=5 {
            let permit = counter.try_acquire().unwrap();
            assert_eq!(permit.commit(), expected);
        }

        let err = counter.try_acquire().unwrap_err();
        assert!(matches!(err, AnalysisError::LimitReached { limit: 5 }));
        assert_eq!(
            err.to_string(),
            "You have reached the limit of 5 queries. Please try again later."
        );
        assert_eq!(counter.count(), 5);
        assert!(counter.is_exhausted());
    }

    #[test]
    fn test_dropped_permit_releases_slot() {
        let counter = QueryCounter::new(1);
        {
            let _permit = counter.try_acquire().unwrap();
            assert!(counter.try_acquire().is_err());
        }
        assert_eq!(counter.count(), 0);
        assert_eq!(counter.remaining(), 1);
        assert!(counter.try_acquire().is_ok());
    }

    #[test]
    fn test_in_flight_permits_count_toward_limit() {
        let counter = QueryCounter::new(2);
        let first = counter.try_acquire().unwrap();
        let _second = counter.try_acquire().unwrap();
        assert!(counter.try_acquire().is_err());
        assert_eq!(first.commit(), 1);
        assert!(counter.try_acquire().is_err());
    }

    #[test]
    fn test_zero_limit_refuses_everything() {
        let counter = QueryCounter::new(0);
        assert!(counter.try_acquire().is_err());
    }

    #[test]
    fn test_concurrent_acquires_never_exceed_limit() {
        let counter = QueryCounter::new(5);
        let granted = AtomicU32::new(0);

        std::thread::scope(|scope| {
            for _ in 0..32 {
                scope.spawn(|| {
                    if let Ok(permit) = counter.try_acquire() {
                        granted.fetch_add(1, Ordering::SeqCst);
                        permit.commit();
                    }
                });
            }
        });

        assert_eq!(granted.load(Ordering::SeqCst), 5);
        assert_eq!(counter.count(), 5);
    }

    #[test]
    fn test_store_create_get_remove() {
        let store = SessionStore::default();
        let session = store.create();
        assert_eq!(store.len(), 1);

        let found = store.get(&session.id).unwrap();
        assert!(Arc::ptr_eq(&session, &found));

        assert!(store.remove(&session.id));
        assert!(!store.remove(&session.id));
        assert!(store.get(&session.id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_fresh_session_has_fresh_counter() {
        let store = SessionStore::new(SessionConfig {
            query_limit: 1,
            ttl: DEFAULT_SESSION_TTL,
        });
        let first = store.create();
        first.counter.try_acquire().unwrap().commit();
        assert!(first.counter.is_exhausted());

        let second = store.create();
        assert_ne!(first.id, second.id);
        assert_eq!(second.counter.count(), 0);
    }

    #[test]
    fn test_expired_session_is_torn_down() {
        let store = SessionStore::new(SessionConfig {
            query_limit: 5,
            ttl: Duration::ZERO,
        });
        let session = store.create();
        assert!(session.is_expired());
        assert!(store.get(&session.id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let expiring = SessionStore::new(SessionConfig {
            query_limit: 5,
            ttl: Duration::ZERO,
        });
        expiring.create();
        expiring.create();
        assert_eq!(expiring.purge_expired(), 2);
        assert!(expiring.is_empty());

        let live = SessionStore::default();
        live.create();
        assert_eq!(live.purge_expired(), 0);
        assert_eq!(live.len(), 1);
    }

    #[test]
    fn test_session_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("NUTRITION_QUERY_LIMIT", "10"),
            ("NUTRITION_SESSION_TTL_SECS", "120"),
        ]
        .into_iter()
        .collect();
        let config =
            SessionConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.query_limit, 10);
        assert_eq!(config.ttl, Duration::from_secs(120));

        let defaults = SessionConfig::from_lookup(|_| None).unwrap();
        assert_eq!(defaults, SessionConfig::default());
    }

    #[test]
    fn test_session_config_invalid_value() {
        let err = SessionConfig::from_lookup(|key| {
            (key == "NUTRITION_QUERY_LIMIT").then(|| "five".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref var, .. } if var == "NUTRITION_QUERY_LIMIT"));
    }
}
