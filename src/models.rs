use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    #[default]
    Low = 1,
    Medium = 2,
    High = 3,
}

impl TryFrom<u8> for Priority {
    type Error = ApiError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Low),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::High),
            other => Err(ApiError::InvalidPriority(other)),
        }
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority as u8
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

impl std::str::FromStr for Priority {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|_| ApiError::UnparsablePriority(s.to_string()))?;
        Priority::try_from(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: String,
    pub value: String,
    pub priority: Priority,
    pub is_finished: bool,
}

impl Note {
    pub fn new(id: impl Into<String>, value: impl Into<String>, priority: Priority, is_finished: bool) -> Self {
        Note {
            id: id.into(),
            value: value.into(),
            priority,
            is_finished,
        }
    }

    pub fn edit_value(&mut self, new_text: impl Into<String>) {
        self.value = new_text.into();
    }

    pub fn edit_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    pub fn change_status(&mut self) {
        self.is_finished = !self.is_finished;
    }
}

/// Note record as the remote service sends it
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteNote {
    #[serde(rename = "_id")]
    pub id: String,
    pub value: String,
    pub priority: Priority,
    #[serde(default)]
    pub checked: bool,
}

impl From<RemoteNote> for Note {
    fn from(remote: RemoteNote) -> Self {
        Note::new(remote.id, remote.value, remote.priority, remote.checked)
    }
}

#[derive(Debug, Serialize)]
pub struct NotePayload<'a> {
    pub value: &'a str,
    pub priority: Priority,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub value: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// Bearer credential issued by login. Attached to every later call and
/// never refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Session { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl From<LoginResponse> for Session {
    fn from(response: LoginResponse) -> Self {
        Session::new(response.access_token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Focus {
    Input,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditField {
    Text,
    Priority,
}
