use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{LoginRequest, LoginResponse, Note, NotePayload, Priority, RemoteNote, Session};

/// Notes keyed by id, iterated in the order they were first inserted
#[derive(Debug, Default)]
pub struct NoteCache {
    order: Vec<String>,
    notes: HashMap<String, Note>,
}

impl NoteCache {
    pub fn insert(&mut self, note: Note) {
        if !self.notes.contains_key(&note.id) {
            self.order.push(note.id.clone());
        }
        self.notes.insert(note.id.clone(), note);
    }

    pub fn remove(&mut self, id: &str) -> Option<Note> {
        let removed = self.notes.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Note> {
        self.notes.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &Note> {
        self.order.iter().filter_map(|id| self.notes.get(id))
    }
}

impl FromIterator<Note> for NoteCache {
    fn from_iter<I: IntoIterator<Item = Note>>(iter: I) -> Self {
        let mut cache = NoteCache::default();
        for note in iter {
            cache.insert(note);
        }
        cache
    }
}

/// Remote note service plus the in-memory copy of its collection
pub struct Model {
    client: Client,
    base_url: Url,
    identity: String,
    session: Option<Session>,
    notes: Option<NoteCache>,
}

impl Model {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ApiError::Client)?;

        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ApiError::InvalidBaseUrl(config.base_url.clone()))?;

        Ok(Self {
            client,
            base_url,
            identity: config.identity.clone(),
            session: None,
            notes: None,
        })
    }

    /// Reuse a token issued earlier instead of logging in again
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.notes.is_some()
    }

    pub fn cached(&self, id: &str) -> Option<&Note> {
        self.notes.as_ref().and_then(|notes| notes.get(id))
    }

    /// Base URL plus `segments`, each percent-encoded as one path segment
    fn url(&self, segments: &[&str]) -> Result<String, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.into())
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.session {
            Some(session) => builder.bearer_auth(session.token()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, method: Method, url: &str) -> Result<Response, ApiError> {
        log::debug!("{} {}", method, url);
        let response = builder.send().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                method,
                url: url.to_string(),
                status,
                body,
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Body of a mutating call; empty bodies decode as null
    async fn decode_value(response: Response, url: &str) -> Result<Value, ApiError> {
        let text = response.text().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    pub async fn authenticate(&mut self) -> Result<&Session, ApiError> {
        let url = self.url(&["auth", "login"])?;
        let builder = self
            .client
            .post(&url)
            .json(&LoginRequest { value: &self.identity });

        let response = self.send(builder, Method::POST, &url).await?;
        let login: LoginResponse = Self::decode(response, &url).await?;
        log::info!("Authenticated as '{}'", self.identity);

        Ok(&*self.session.insert(Session::from(login)))
    }

    /// Fetches once per session; later calls answer from the cache
    pub async fn get_notes(&mut self) -> Result<Vec<Note>, ApiError> {
        if self.notes.is_none() {
            self.authenticate().await?;

            let url = self.url(&["todo"])?;
            let builder = self.request(Method::GET, &url);
            let response = self.send(builder, Method::GET, &url).await?;
            let records: Vec<RemoteNote> = Self::decode(response, &url).await?;
            log::debug!("Fetched {} notes", records.len());

            self.notes = Some(records.into_iter().map(Note::from).collect());
        }

        Ok(self
            .notes
            .as_ref()
            .map(|notes| notes.values().cloned().collect())
            .unwrap_or_default())
    }

    pub async fn create_note(&mut self, value: &str, priority: Priority) -> Result<Note, ApiError> {
        let url = self.url(&["todo"])?;
        let builder = self
            .request(Method::POST, &url)
            .json(&NotePayload { value, priority });

        let response = self.send(builder, Method::POST, &url).await?;
        let record: RemoteNote = Self::decode(response, &url).await?;
        let note = Note::from(record);

        // Before the first fetch the remote list is still unknown
        if let Some(notes) = self.notes.as_mut() {
            notes.insert(note.clone());
        }
        Ok(note)
    }

    pub async fn delete_note(&mut self, id: &str) -> Result<Value, ApiError> {
        let url = self.url(&["todo", id])?;
        let builder = self.request(Method::DELETE, &url);

        let response = self.send(builder, Method::DELETE, &url).await?;

        // Any 2xx means the server applied it, whatever the body holds
        if let Some(notes) = self.notes.as_mut() {
            notes.remove(id);
        }
        Self::decode_value(response, &url).await
    }

    pub async fn edit_note_text(&mut self, id: &str, new_value: &str, new_priority: Priority) -> Result<Value, ApiError> {
        let url = self.url(&["todo", id])?;
        let builder = self.request(Method::PUT, &url).json(&NotePayload {
            value: new_value,
            priority: new_priority,
        });

        let response = self.send(builder, Method::PUT, &url).await?;

        if let Some(note) = self.notes.as_mut().and_then(|notes| notes.get_mut(id)) {
            note.edit_value(new_value);
            note.edit_priority(new_priority);
        }
        Self::decode_value(response, &url).await
    }

    pub async fn change_note_status(&mut self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&["todo", id, "toggle"])?;
        let builder = self.request(Method::PUT, &url);

        self.send(builder, Method::PUT, &url).await?;

        if let Some(note) = self.notes.as_mut().and_then(|notes| notes.get_mut(id)) {
            note.change_status();
        }
        Ok(())
    }
}
