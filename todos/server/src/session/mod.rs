use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

use crate::todo::{StoredTodoList, TodoList};

/// Lifetime of the session cookie, in days.
pub const SESSION_COOKIE_MAX_AGE_DAYS: i64 = 31;

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// A one-time message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub severity: Severity,
    pub text: String,
}

impl FlashMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }

    /// Returns the CSS class for this message's severity.
    pub fn severity_class(&self) -> &'static str {
        match self.severity {
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

/// Plain serialized session state, as held by the session store.
///
/// The layout is `{"todoLists": [...], "flash": [...]}`; domain types are
/// reconstructed from it on every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default)]
    pub todo_lists: Vec<StoredTodoList>,
    #[serde(default)]
    pub flash: Vec<FlashMessage>,
}

/// The per-request session state: the reconstructed todo lists plus any
/// flash messages queued for the next render.
///
/// Handlers thread this context through their work and persist it back to
/// the [`SessionStore`] once they are done mutating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoSession {
    id: Uuid,
    pub todo_lists: Vec<TodoList>,
    flash: Vec<FlashMessage>,
}

impl TodoSession {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            todo_lists: Vec::new(),
            flash: Vec::new(),
        }
    }

    /// Rebuilds the session context from its serialized record.
    pub fn from_record(id: Uuid, record: SessionRecord) -> Self {
        Self {
            id,
            todo_lists: record.todo_lists.into_iter().map(TodoList::from).collect(),
            flash: record.flash,
        }
    }

    /// Serializes the session context back into a plain record.
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            todo_lists: self.todo_lists.iter().map(StoredTodoList::from).collect(),
            flash: self.flash.clone(),
        }
    }

    /// Returns the session id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns a fresh id for a new todo list in this session.
    pub fn next_list_id(&self) -> u32 {
        self.todo_lists
            .iter()
            .map(TodoList::id)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Appends a todo list to the session.
    pub fn add_list(&mut self, list: TodoList) {
        self.todo_lists.push(list);
    }

    /// Removes and returns the todo list with the given id.
    pub fn remove_list(&mut self, todo_list_id: u32) -> Option<TodoList> {
        let index = self
            .todo_lists
            .iter()
            .position(|list| list.id() == todo_list_id)?;
        Some(self.todo_lists.remove(index))
    }

    /// Queues a success flash message for the next rendered page.
    pub fn flash_success(&mut self, text: impl Into<String>) {
        self.flash.push(FlashMessage::success(text));
    }

    /// Queues an error flash message for the next rendered page.
    pub fn flash_error(&mut self, text: impl Into<String>) {
        self.flash.push(FlashMessage::error(text));
    }

    /// Drains the queued flash messages; they are shown exactly once.
    pub fn take_flash(&mut self) -> Vec<FlashMessage> {
        std::mem::take(&mut self.flash)
    }
}

/// In-memory session store keyed by session id.
///
/// Records are kept as serialized JSON, mirroring a session backend that
/// only persists plain data; each request deserializes its own record.
#[derive(Clone, Debug)]
pub struct SessionStore {
    cookie_name: String,
    sessions: Arc<RwLock<HashMap<Uuid, serde_json::Value>>>,
}

impl SessionStore {
    pub fn new(cookie_name: String) -> Self {
        Self {
            cookie_name,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the name of the session cookie.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Resolves the request's session from the cookie jar.
    ///
    /// A valid cookie pointing at a known record reconstructs that
    /// session. Otherwise a fresh empty session is created, stored, and a
    /// new session cookie is added to the jar.
    pub fn open(&self, jar: CookieJar) -> (TodoSession, CookieJar) {
        if let Some(session_id) = self.session_id_from_jar(&jar) {
            if let Some(record) = self.load(session_id) {
                return (TodoSession::from_record(session_id, record), jar);
            }
        }

        let session = TodoSession::new(Uuid::new_v4());
        self.persist(&session);
        let jar = jar.add(self.session_cookie(session.id()));
        (session, jar)
    }

    /// Writes the session's current state back to the store.
    pub fn persist(&self, session: &TodoSession) {
        if let Ok(value) = serde_json::to_value(session.to_record()) {
            self.sessions
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(session.id(), value);
        }
    }

    /// Loads and deserializes the record for the given session id.
    ///
    /// A record that no longer matches the expected shape is treated as
    /// absent, so the caller starts over with a fresh session.
    pub fn load(&self, session_id: Uuid) -> Option<SessionRecord> {
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let value = sessions.get(&session_id)?.clone();
        serde_json::from_value(value).ok()
    }

    fn session_id_from_jar(&self, jar: &CookieJar) -> Option<Uuid> {
        let cookie = jar.get(&self.cookie_name)?;
        Uuid::parse_str(cookie.value()).ok()
    }

    fn session_cookie(&self, session_id: Uuid) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), session_id.to_string()))
            .http_only(true)
            .secure(false)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(SESSION_COOKIE_MAX_AGE_DAYS))
            .path("/")
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::Todo;

    fn store() -> SessionStore {
        SessionStore::new("todos-session-id".to_string())
    }

    #[test]
    fn open_without_cookie_creates_fresh_session_and_sets_cookie() {
        let store = store();
        let (session, jar) = store.open(CookieJar::new());

        assert!(session.todo_lists.is_empty());
        let cookie = jar.get("todos-session-id").unwrap();
        assert_eq!(cookie.value(), session.id().to_string());
        // the fresh session is stored right away
        assert_eq!(store.load(session.id()), Some(SessionRecord::default()));
    }

    #[test]
    fn open_with_unknown_session_id_starts_over() {
        let store = store();
        let stale =
            CookieJar::new().add(Cookie::new("todos-session-id", Uuid::new_v4().to_string()));
        let (session, jar) = store.open(stale);

        assert!(session.todo_lists.is_empty());
        // a replacement cookie points at the new session
        let cookie = jar.get("todos-session-id").unwrap();
        assert_eq!(cookie.value(), session.id().to_string());
    }

    #[test]
    fn persisted_state_survives_a_round_trip() {
        let store = store();
        let (mut session, _jar) = store.open(CookieJar::new());
        let mut list = TodoList::new(1, "Groceries".to_string());
        list.add(Todo::new(1, "Milk".to_string()));
        session.add_list(list);
        store.persist(&session);

        let cookie = Cookie::new("todos-session-id", session.id().to_string());
        let (reloaded, _jar) = store.open(CookieJar::new().add(cookie));
        assert_eq!(reloaded.todo_lists, session.todo_lists);
    }

    #[test]
    fn flash_messages_are_drained_once() {
        let mut session = TodoSession::new(Uuid::new_v4());
        session.flash_success("The todo list has been created.");
        session.flash_error("List title must be unique.");

        let flash = session.take_flash();
        assert_eq!(flash.len(), 2);
        assert_eq!(flash[0].severity, Severity::Success);
        assert_eq!(flash[1].severity, Severity::Error);
        assert!(session.take_flash().is_empty());
    }

    #[test]
    fn next_list_id_is_one_past_the_maximum() {
        let mut session = TodoSession::new(Uuid::new_v4());
        assert_eq!(session.next_list_id(), 1);
        session.add_list(TodoList::new(1, "a".to_string()));
        session.add_list(TodoList::new(7, "b".to_string()));
        assert_eq!(session.next_list_id(), 8);
    }

    #[test]
    fn remove_list_returns_the_removed_list() {
        let mut session = TodoSession::new(Uuid::new_v4());
        session.add_list(TodoList::new(1, "a".to_string()));
        session.add_list(TodoList::new(2, "b".to_string()));

        let removed = session.remove_list(1).unwrap();
        assert_eq!(removed.title(), "a");
        assert_eq!(session.todo_lists.len(), 1);
        assert!(session.remove_list(9).is_none());
    }

    #[test]
    fn session_record_serializes_with_camel_case_layout() {
        let mut session = TodoSession::new(Uuid::new_v4());
        let mut list = TodoList::new(1, "Groceries".to_string());
        list.add(Todo::new(1, "Milk".to_string()));
        session.add_list(list);

        let value = serde_json::to_value(session.to_record()).unwrap();
        let lists = value.get("todoLists").unwrap().as_array().unwrap();
        assert_eq!(lists[0].get("title").unwrap(), "Groceries");
        assert_eq!(lists[0]["todos"][0]["done"], serde_json::Value::Bool(false));
    }

    #[test]
    fn malformed_record_is_treated_as_absent() {
        let store = store();
        let id = Uuid::new_v4();
        store
            .sessions
            .write()
            .unwrap()
            .insert(id, serde_json::json!({"todoLists": "oops"}));
        assert_eq!(store.load(id), None);
    }
}
