use crate::{
    CreateRequest, DeleteRequest, Event, GetRequest, KEY_PREFIX_APP, KEY_PREFIX_TEMP,
    KEY_PREFIX_USER, ListRequest, Session, SessionService,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use launchpad_core::{LaunchpadError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

type StateMap = HashMap<String, Value>;

#[derive(Clone)]
struct SessionData {
    id: SessionId,
    events: Vec<Event>,
    state: StateMap,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct SessionId {
    app_name: String,
    user_id: String,
    session_id: String,
}

impl SessionId {
    fn not_found(&self) -> LaunchpadError {
        LaunchpadError::SessionNotFound {
            app_name: self.app_name.clone(),
            user_id: self.user_id.clone(),
            session_id: self.session_id.clone(),
        }
    }
}

fn poisoned<T>(_: PoisonError<T>) -> LaunchpadError {
    LaunchpadError::Session("session store lock poisoned".into())
}

/// Process-local session store. Everything is lost when the process exits.
#[derive(Default)]
pub struct InMemorySessionService {
    sessions: Arc<RwLock<HashMap<SessionId, SessionData>>>,
    app_state: Arc<RwLock<HashMap<String, StateMap>>>,
    user_state: Arc<RwLock<HashMap<(String, String), StateMap>>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits a delta into (app, user, session) parts; `temp:` keys are dropped.
    fn extract_state_deltas(delta: &StateMap) -> (StateMap, StateMap, StateMap) {
        let mut app_delta = StateMap::new();
        let mut user_delta = StateMap::new();
        let mut session_delta = StateMap::new();

        for (key, value) in delta {
            if let Some(clean_key) = key.strip_prefix(KEY_PREFIX_APP) {
                app_delta.insert(clean_key.to_string(), value.clone());
            } else if let Some(clean_key) = key.strip_prefix(KEY_PREFIX_USER) {
                user_delta.insert(clean_key.to_string(), value.clone());
            } else if !key.starts_with(KEY_PREFIX_TEMP) {
                session_delta.insert(key.clone(), value.clone());
            }
        }

        (app_delta, user_delta, session_delta)
    }

    fn merge_states(app: &StateMap, user: &StateMap, session: &StateMap) -> StateMap {
        let mut merged = session.clone();
        for (k, v) in app {
            merged.insert(format!("{KEY_PREFIX_APP}{k}"), v.clone());
        }
        for (k, v) in user {
            merged.insert(format!("{KEY_PREFIX_USER}{k}"), v.clone());
        }
        merged
    }

    fn apply_shared_deltas(
        &self,
        app_name: &str,
        user_id: &str,
        app_delta: StateMap,
        user_delta: StateMap,
    ) -> Result<()> {
        if !app_delta.is_empty() {
            let mut app_state = self.app_state.write().map_err(poisoned)?;
            app_state.entry(app_name.to_string()).or_default().extend(app_delta);
        }
        if !user_delta.is_empty() {
            let mut user_state = self.user_state.write().map_err(poisoned)?;
            user_state
                .entry((app_name.to_string(), user_id.to_string()))
                .or_default()
                .extend(user_delta);
        }
        Ok(())
    }

    fn snapshot(
        &self,
        data: &SessionData,
        num_recent_events: Option<usize>,
    ) -> Result<InMemorySession> {
        let app_state = self
            .app_state
            .read()
            .map_err(poisoned)?
            .get(&data.id.app_name)
            .cloned()
            .unwrap_or_default();
        let user_state = self
            .user_state
            .read()
            .map_err(poisoned)?
            .get(&(data.id.app_name.clone(), data.id.user_id.clone()))
            .cloned()
            .unwrap_or_default();

        let mut events = data.events.clone();
        if let Some(num) = num_recent_events {
            let start = events.len().saturating_sub(num);
            events.drain(..start);
        }

        Ok(InMemorySession {
            id: data.id.clone(),
            state: Self::merge_states(&app_state, &user_state, &data.state),
            events,
            updated_at: data.updated_at,
        })
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn create(&self, req: CreateRequest) -> Result<Box<dyn Session>> {
        let session_id = req.session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let id = SessionId { app_name: req.app_name, user_id: req.user_id, session_id };

        let (app_delta, user_delta, session_state) = Self::extract_state_deltas(&req.state);

        let data = {
            let mut sessions = self.sessions.write().map_err(poisoned)?;
            if sessions.contains_key(&id) {
                return Err(LaunchpadError::Session(format!(
                    "session {} already exists",
                    id.session_id
                )));
            }
            let data = SessionData {
                id: id.clone(),
                events: Vec::new(),
                state: session_state,
                updated_at: Utc::now(),
            };
            sessions.insert(id.clone(), data.clone());
            data
        };

        self.apply_shared_deltas(&id.app_name, &id.user_id, app_delta, user_delta)?;
        tracing::debug!(
            app_name = %id.app_name,
            user_id = %id.user_id,
            session_id = %id.session_id,
            "session created"
        );

        Ok(Box::new(self.snapshot(&data, None)?))
    }

    async fn get(&self, req: GetRequest) -> Result<Box<dyn Session>> {
        let id = SessionId {
            app_name: req.app_name,
            user_id: req.user_id,
            session_id: req.session_id,
        };

        let data = {
            let sessions = self.sessions.read().map_err(poisoned)?;
            sessions.get(&id).cloned().ok_or_else(|| id.not_found())?
        };

        Ok(Box::new(self.snapshot(&data, req.num_recent_events)?))
    }

    async fn list(&self, req: ListRequest) -> Result<Vec<Box<dyn Session>>> {
        let matching: Vec<SessionData> = {
            let sessions = self.sessions.read().map_err(poisoned)?;
            sessions
                .values()
                .filter(|d| d.id.app_name == req.app_name && d.id.user_id == req.user_id)
                .cloned()
                .collect()
        };

        let mut result = Vec::with_capacity(matching.len());
        for data in &matching {
            result.push(Box::new(self.snapshot(data, None)?) as Box<dyn Session>);
        }
        Ok(result)
    }

    async fn delete(&self, req: DeleteRequest) -> Result<()> {
        let id = SessionId {
            app_name: req.app_name,
            user_id: req.user_id,
            session_id: req.session_id,
        };

        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.remove(&id);
        Ok(())
    }

    async fn append_event(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
        mut event: Event,
    ) -> Result<()> {
        if event.partial {
            return Ok(());
        }
        event.actions.state_delta.retain(|k, _| !k.starts_with(KEY_PREFIX_TEMP));

        let id = SessionId {
            app_name: app_name.to_string(),
            user_id: user_id.to_string(),
            session_id: session_id.to_string(),
        };

        let (app_delta, user_delta) = {
            let mut sessions = self.sessions.write().map_err(poisoned)?;
            let data = sessions.get_mut(&id).ok_or_else(|| id.not_found())?;

            let (app_delta, user_delta, session_delta) =
                Self::extract_state_deltas(&event.actions.state_delta);
            data.state.extend(session_delta);
            data.updated_at = event.timestamp;
            data.events.push(event);

            (app_delta, user_delta)
        };

        self.apply_shared_deltas(app_name, user_id, app_delta, user_delta)
    }
}

struct InMemorySession {
    id: SessionId,
    state: StateMap,
    events: Vec<Event>,
    updated_at: DateTime<Utc>,
}

impl Session for InMemorySession {
    fn id(&self) -> &str {
        &self.id.session_id
    }

    fn app_name(&self) -> &str {
        &self.id.app_name
    }

    fn user_id(&self) -> &str {
        &self.id.user_id
    }

    fn state(&self) -> &HashMap<String, Value> {
        &self.state
    }

    fn events(&self) -> &[Event] {
        &self.events
    }

    fn last_update_time(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
