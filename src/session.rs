//! Per-user session state and the registry that keeps sessions isolated.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TrainerError};
use crate::logging::{log_first_interaction, log_session_started};
use crate::selection::Selection;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Random 128-bit identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    Student,
    #[default]
    Procurement,
    Finance,
    #[serde(rename = "HR")]
    Hr,
    Auditor,
    Other,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Student,
        Role::Procurement,
        Role::Finance,
        Role::Hr,
        Role::Auditor,
        Role::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Procurement => "Procurement",
            Role::Finance => "Finance",
            Role::Hr => "HR",
            Role::Auditor => "Auditor",
            Role::Other => "Other",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown role {:?}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Region {
    #[default]
    Europe,
    Asia,
    Africa,
    Americas,
    #[serde(rename = "MENA")]
    Mena,
    Oceania,
}

impl Region {
    pub const ALL: [Region; 6] = [
        Region::Europe,
        Region::Asia,
        Region::Africa,
        Region::Americas,
        Region::Mena,
        Region::Oceania,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Europe => "Europe",
            Region::Asia => "Asia",
            Region::Africa => "Africa",
            Region::Americas => "Americas",
            Region::Mena => "MENA",
            Region::Oceania => "Oceania",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Region::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown region {:?}", s))
    }
}

/// Anonymous campaign tags picked up from the entry link. Empty when absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AcquisitionTags {
    pub utm_source: String,
    pub utm_campaign: String,
    #[serde(rename = "ref")]
    pub referrer: String,
}

/// What the user tells us about themselves; attached to every response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Profile {
    pub role: Role,
    pub region: Region,
    pub tags: AcquisitionTags,
}

/// Everything the scoring engine needs from a session to stamp a response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseContext {
    pub session_id: SessionId,
    pub profile: Profile,
    pub first_click_latency: Option<f64>,
}

/// One submitted choice. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub session_id: SessionId,
    pub timestamp: DateTime<Utc>,
    pub dilemma_id: String,
    pub choice_key: String,
    pub score: u8,
    #[serde(skip)]
    pub feedback: String,
    pub role: Role,
    pub region: Region,
    pub tags: AcquisitionTags,
    /// Seconds from session start to first choice interaction.
    pub first_click_latency: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    id: SessionId,
    start_time: DateTime<Utc>,
    first_click_latency: Option<f64>,
    responses: Vec<Response>,
    pub profile: Profile,
    pub selection: Selection,
}

impl SessionState {
    pub fn create() -> Self {
        Self::create_at(Utc::now())
    }

    pub fn create_at(start_time: DateTime<Utc>) -> Self {
        let session = Self {
            id: SessionId::generate(),
            start_time,
            first_click_latency: None,
            responses: Vec::new(),
            profile: Profile::default(),
            selection: Selection::default(),
        };
        log_session_started(session.id.as_str(), &start_time.to_rfc3339());
        session
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn first_click_latency(&self) -> Option<f64> {
        self.first_click_latency
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn record_first_interaction(&mut self) {
        self.record_first_interaction_at(Utc::now());
    }

    /// Write-once: later calls leave the first latency untouched.
    pub fn record_first_interaction_at(&mut self, now: DateTime<Utc>) {
        if self.first_click_latency.is_some() {
            return;
        }
        let elapsed_ms = (now - self.start_time).num_milliseconds().max(0);
        // two decimals, half up
        let centis = (elapsed_ms + 5) / 10;
        let secs = centis as f64 / 100.0;
        self.first_click_latency = Some(secs);
        log_first_interaction(self.id.as_str(), secs);
    }

    pub fn append_response(&mut self, response: Response) {
        self.responses.push(response);
    }

    pub fn response_context(&self) -> ResponseContext {
        ResponseContext {
            session_id: self.id.clone(),
            profile: self.profile.clone(),
            first_click_latency: self.first_click_latency,
        }
    }
}

/// Sessions keyed by id. Each session is mutated by one caller at a time;
/// nothing is shared between entries.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, SessionState>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_session(&mut self) -> SessionId {
        let session = SessionState::create();
        let id = session.id().clone();
        self.sessions.insert(id.clone(), session);
        id
    }

    pub fn get(&self, id: &SessionId) -> Result<&SessionState> {
        self.sessions
            .get(id)
            .ok_or_else(|| TrainerError::UnknownSession { id: id.to_string() })
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Result<&mut SessionState> {
        self.sessions
            .get_mut(id)
            .ok_or_else(|| TrainerError::UnknownSession { id: id.to_string() })
    }

    pub fn remove(&mut self, id: &SessionId) -> Option<SessionState> {
        self.sessions.remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::HashSet;

    #[test]
    fn new_session_is_empty() {
        let s = SessionState::create();
        assert!(s.responses().is_empty());
        assert!(s.first_click_latency().is_none());
        assert_eq!(s.id().as_str().len(), 36);
    }

    #[test]
    fn session_ids_do_not_collide() {
        let ids: HashSet<_> = (0..500).map(|_| SessionId::generate()).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn first_interaction_is_write_once() {
        let start = Utc::now();
        let mut s = SessionState::create_at(start);
        s.record_first_interaction_at(start + Duration::milliseconds(2_345));
        assert_eq!(s.first_click_latency(), Some(2.35));
        s.record_first_interaction_at(start + Duration::seconds(90));
        assert_eq!(s.first_click_latency(), Some(2.35));
    }

    #[test]
    fn latency_never_negative() {
        let start = Utc::now();
        let mut s = SessionState::create_at(start);
        s.record_first_interaction_at(start - Duration::seconds(5));
        assert_eq!(s.first_click_latency(), Some(0.0));
    }

    #[test]
    fn role_and_region_parse_case_insensitively() {
        assert_eq!("hr".parse::<Role>().unwrap(), Role::Hr);
        assert_eq!("Mena".parse::<Region>().unwrap(), Region::Mena);
        assert!("pilot".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::Procurement);
        assert_eq!(Region::default(), Region::Europe);
    }

    #[test]
    fn registry_isolates_sessions() {
        let mut reg = SessionRegistry::new();
        let a = reg.create_session();
        let b = reg.create_session();
        assert_ne!(a, b);
        reg.get_mut(&a).unwrap().record_first_interaction();
        assert!(reg.get(&a).unwrap().first_click_latency().is_some());
        assert!(reg.get(&b).unwrap().first_click_latency().is_none());
        let missing = SessionId::from("missing");
        assert!(matches!(reg.get(&missing), Err(TrainerError::UnknownSession { .. })));
        assert!(reg.remove(&a).is_some());
        assert_eq!(reg.len(), 1);
    }
}
