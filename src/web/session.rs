//! Per-browser session state for the form.
//!
//! A session is keyed by a UUID carried in the `voyage_session` cookie. It
//! holds the theme choice, the last submitted request (to prefill the form),
//! and the history of completed plans. "Clear History" drops the history;
//! "Kill Session" drops the whole entry.
//!
//! Sessions idle for longer than the store's TTL are pruned whenever a new
//! one is created, and each history keeps at most `max_history` plans.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::merge::{DEFAULT_MAX_HISTORY, DEFAULT_SESSION_TTL_SECS};
use crate::orchestration::CrewOutput;
use crate::travel::TripRequest;

pub const SESSION_COOKIE: &str = "voyage_session";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// One completed plan kept in session history.
#[derive(Debug, Clone, Serialize)]
pub struct PlanRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub request: TripRequest,
    pub output: CrewOutput,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub last_seen: DateTime<Utc>,
    pub theme: Theme,
    pub last_request: Option<TripRequest>,
    pub history: Vec<PlanRecord>,
}

impl SessionState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_seen: now,
            theme: Theme::default(),
            last_request: None,
            history: Vec::new(),
        }
    }
}

/// Shared, mutex-guarded map of live sessions. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<Uuid, SessionState>>>,
    ttl: TimeDelta,
    max_history: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SESSION_TTL_SECS, DEFAULT_MAX_HISTORY)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that drops sessions idle for `ttl_secs` and keeps at most
    /// `max_history` plans per session.
    pub fn with_limits(ttl_secs: u64, max_history: usize) -> Self {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
            max_history,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, SessionState>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the id of the live session `id`, refreshing its idle timer, or
    /// create a fresh one when `id` is absent, unknown, or expired.
    pub fn ensure(&self, id: Option<Uuid>) -> Uuid {
        self.ensure_at(id, Utc::now())
    }

    fn ensure_at(&self, id: Option<Uuid>, now: DateTime<Utc>) -> Uuid {
        let mut sessions = self.lock();
        let live = id.filter(|id| {
            sessions
                .get(id)
                .is_some_and(|s| now.signed_duration_since(s.last_seen) <= self.ttl)
        });
        if let Some(id) = live
            && let Some(session) = sessions.get_mut(&id)
        {
            session.last_seen = now;
            return id;
        }

        let before = sessions.len();
        sessions.retain(|_, s| now.signed_duration_since(s.last_seen) <= self.ttl);
        if sessions.len() < before {
            tracing::debug!(evicted = before - sessions.len(), "Idle sessions pruned");
        }

        let id = Uuid::new_v4();
        sessions.insert(id, SessionState::new(now));
        tracing::debug!(session = %id, "Session created");
        id
    }

    /// Clone of the session's current state.
    pub fn snapshot(&self, id: Uuid) -> Option<SessionState> {
        self.lock().get(&id).cloned()
    }

    pub fn set_theme(&self, id: Uuid, theme: Theme) {
        if let Some(s) = self.lock().get_mut(&id) {
            s.theme = theme;
        }
    }

    pub fn remember_request(&self, id: Uuid, request: TripRequest) {
        if let Some(s) = self.lock().get_mut(&id) {
            s.last_request = Some(request);
        }
    }

    pub fn record_plan(&self, id: Uuid, request: TripRequest, output: CrewOutput) -> Option<Uuid> {
        let mut sessions = self.lock();
        let session = sessions.get_mut(&id)?;
        let record = PlanRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            request,
            output,
        };
        let record_id = record.id;
        session.history.push(record);
        let excess = session.history.len().saturating_sub(self.max_history);
        session.history.drain(..excess);
        Some(record_id)
    }

    /// Drop the session's plan history. Returns false if the session is gone.
    pub fn clear_history(&self, id: Uuid) -> bool {
        match self.lock().get_mut(&id) {
            Some(s) => {
                s.history.clear();
                true
            }
            None => false,
        }
    }

    /// Remove the session entirely. Returns false if it did not exist.
    pub fn kill(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extract the session id from the request's `Cookie` headers.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// `Set-Cookie` value binding the browser to `id`.
pub fn session_cookie(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value that removes the session cookie.
pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
