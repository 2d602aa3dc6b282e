//! In-memory backend used by the crate's tests.
//!
//! Behaves like the content API for the routes a run touches, keeps a journal
//! of every request, and can be told to fail individual requests.

use crate::config::Credential;
use crate::error::{Result, TransportError};
use crate::reconcile::AttachmentKind;
use crate::routes;
use crate::transport::{Body, FilePart, Query, Service, SessionToken, Transport};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::time::Instant;
use uuid::Uuid;

pub const TOKEN: &str = "memory-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub service: Service,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub upload: Option<FilePart>,
    /// When the request reached the backend.
    pub at: Instant,
}

impl Call {
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub id: Uuid,
    pub name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StoredPlaylist {
    pub id: Uuid,
    pub name: String,
    pub body: Value,
    /// (association id, file id)
    pub files: Vec<(Uuid, Uuid)>,
    /// (association id, screen id)
    pub screens: Vec<(Uuid, Uuid)>,
    pub calendar: Option<Value>,
    pub urls: Vec<Value>,
    pub published: bool,
}

#[derive(Default)]
struct State {
    files: Vec<StoredFile>,
    playlists: Vec<StoredPlaylist>,
    screens: Vec<Uuid>,
    calls: Vec<Call>,
    failures: Vec<(Method, String)>,
    reject_token: bool,
    auth_attempts: usize,
}

#[derive(Default)]
pub struct MemoryBackend {
    state: RefCell<State>,
}

impl MemoryBackend {
    /// A backend with a single screen and nothing else.
    pub fn with_screen() -> Self {
        let backend = Self::default();
        backend.add_screen();
        backend
    }

    pub fn add_screen(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.state.borrow_mut().screens.push(id);
        id
    }

    pub fn seed_file(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state.borrow_mut().files.push(StoredFile {
            id,
            name: name.to_string(),
            content_type: "application/octet-stream".to_string(),
            size: 0,
        });
        id
    }

    /// A playlist with `files` file attachments and `screens` screen attachments.
    pub fn seed_playlist(&self, name: &str, files: usize, screens: usize) -> Uuid {
        let id = Uuid::new_v4();
        let playlist = StoredPlaylist {
            id,
            name: name.to_string(),
            files: (0..files).map(|_| (Uuid::new_v4(), Uuid::new_v4())).collect(),
            screens: (0..screens)
                .map(|_| (Uuid::new_v4(), Uuid::new_v4()))
                .collect(),
            ..StoredPlaylist::default()
        };
        self.state.borrow_mut().playlists.push(playlist);
        id
    }

    /// Answer every `method` request whose path ends with `suffix` with a 500.
    pub fn fail(&self, method: Method, suffix: impl Into<String>) {
        self.state
            .borrow_mut()
            .failures
            .push((method, suffix.into()));
    }

    pub fn reject_token(&self) {
        self.state.borrow_mut().reject_token = true;
    }

    pub fn auth_attempts(&self) -> usize {
        self.state.borrow().auth_attempts
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    /// Index of the first journaled request matching `method path`.
    pub fn position(&self, method: Method, path: &str) -> Option<usize> {
        self.state
            .borrow()
            .calls
            .iter()
            .position(|c| c.method == method && c.path == path)
    }

    pub fn playlists_named(&self, name: &str) -> Vec<StoredPlaylist> {
        self.state
            .borrow()
            .playlists
            .iter()
            .filter(|p| p.name == name)
            .cloned()
            .collect()
    }

    pub fn files_named(&self, name: &str) -> Vec<StoredFile> {
        self.state
            .borrow()
            .files
            .iter()
            .filter(|f| f.name == name)
            .cloned()
            .collect()
    }

    pub fn screens(&self) -> Vec<Uuid> {
        self.state.borrow().screens.clone()
    }

    // -----------------------------------------------------------------------
    // Routing
    // -----------------------------------------------------------------------

    fn handle(
        &self,
        method: Method,
        service: Service,
        path: &str,
        query: Query<'_>,
        body: Option<Value>,
        upload: Option<FilePart>,
    ) -> Result<Value> {
        let call = Call {
            method,
            service,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            body,
            upload,
            at: Instant::now(),
        };
        let mut state = self.state.borrow_mut();
        state.calls.push(call.clone());

        if state
            .failures
            .iter()
            .any(|(m, suffix)| *m == method && path.ends_with(suffix.as_str()))
        {
            return Err(status(path, 500, "injected failure"));
        }

        match (method, service) {
            (Method::Get, Service::Reporting) if path == routes::POP_OVERVIEW => {
                let screen = call.query("ScreenId").unwrap_or_default().to_string();
                let published = state
                    .playlists
                    .iter()
                    .filter(|p| p.published)
                    .filter(|p| p.screens.iter().any(|(_, s)| s.to_string() == screen))
                    .count();
                Ok(json!({ "screenId": screen, "publishedPlaylists": published }))
            }
            (_, Service::Reporting) => Err(status(path, 404, "not found")),
            (Method::Get, Service::Api) => get(&state, &call),
            (Method::Post, Service::Api) => post(&mut state, &call),
            (Method::Put, Service::Api) => put(&mut state, &call),
            (Method::Delete, Service::Api) => delete(&mut state, &call),
        }
    }
}

fn status(path: &str, code: u16, body: &str) -> TransportError {
    TransportError::Status {
        path: path.to_string(),
        status: code,
        body: body.to_string(),
    }
}

fn listing<I: IntoIterator<Item = Value>>(items: I) -> Value {
    let items: Vec<Value> = items.into_iter().collect();
    json!({ "totalCount": items.len(), "items": items })
}

fn query_uuid(call: &Call, key: &str) -> Result<Uuid> {
    call.query(key)
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or_else(|| status(&call.path, 400, &format!("missing {key}")))
}

/// Split `api/playlist-management/playlist/{id}[/{action}]`.
fn playlist_route(path: &str) -> Option<(Uuid, &str)> {
    let rest = path.strip_prefix(routes::PLAYLISTS)?.strip_prefix('/')?;
    let (id, action) = rest.split_once('/').unwrap_or((rest, ""));
    Some((Uuid::parse_str(id).ok()?, action))
}

fn playlist_mut<'s>(state: &'s mut State, path: &str, id: Uuid) -> Result<&'s mut StoredPlaylist> {
    state
        .playlists
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| status(path, 404, "playlist not found"))
}

fn associations(playlist: &mut StoredPlaylist, kind: AttachmentKind) -> &mut Vec<(Uuid, Uuid)> {
    match kind {
        AttachmentKind::File => &mut playlist.files,
        AttachmentKind::Screen => &mut playlist.screens,
    }
}

fn get(state: &State, call: &Call) -> Result<Value> {
    let path = call.path.as_str();
    if path == routes::FILES {
        return Ok(listing(
            state
                .files
                .iter()
                .map(|f| json!({ "id": f.id, "name": f.name })),
        ));
    }
    if path == routes::PLAYLISTS {
        let filter = call.query("Filter").unwrap_or_default().to_lowercase();
        return Ok(listing(
            state
                .playlists
                .iter()
                .filter(|p| p.name.to_lowercase().contains(&filter))
                .map(|p| json!({ "id": p.id, "name": p.name })),
        ));
    }
    if path == routes::SCREENS {
        let max = call
            .query("maxResultCount")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(10);
        return Ok(listing(
            state
                .screens
                .iter()
                .take(max)
                .map(|id| json!({ "id": id, "name": format!("screen-{id}") })),
        ));
    }
    for kind in AttachmentKind::ALL {
        if path == kind.list_path() {
            let playlist_id = query_uuid(call, "playlistId")?;
            let playlist = state
                .playlists
                .iter()
                .find(|p| p.id == playlist_id)
                .ok_or_else(|| status(path, 404, "playlist not found"))?;
            let assoc = match kind {
                AttachmentKind::File => &playlist.files,
                AttachmentKind::Screen => &playlist.screens,
            };
            return Ok(listing(
                assoc
                    .iter()
                    .map(|(id, target)| json!({ "id": id, "targetId": target })),
            ));
        }
    }
    Err(status(path, 404, "not found"))
}

fn post(state: &mut State, call: &Call) -> Result<Value> {
    let path = call.path.as_str();
    let body = call.body.clone().unwrap_or(Value::Null);

    if path == routes::FILE_PRE_UPLOAD {
        return Ok(json!([{ "fileName": body[0]["fileName"], "accepted": true }]));
    }
    if path == routes::FILE_UPLOAD {
        let name = call.query("Name").unwrap_or_default().to_string();
        let part = call
            .upload
            .as_ref()
            .ok_or_else(|| status(path, 400, "expected multipart"))?;
        let id = Uuid::new_v4();
        state.files.push(StoredFile {
            id,
            name: name.clone(),
            content_type: part.content_type.clone(),
            size: part.bytes.len(),
        });
        return Ok(json!({ "id": id, "name": name }));
    }
    if path == routes::PLAYLISTS {
        let name = body["name"].as_str().unwrap_or_default().to_string();
        let id = Uuid::new_v4();
        state.playlists.push(StoredPlaylist {
            id,
            name: name.clone(),
            body,
            ..StoredPlaylist::default()
        });
        return Ok(json!({ "id": id, "name": name }));
    }
    if path == routes::PLAYLIST_URLS {
        let playlist_id = query_uuid(call, "playlistId")?;
        playlist_mut(state, path, playlist_id)?.urls.push(body);
        return Ok(json!({ "id": Uuid::new_v4() }));
    }
    if let Some((id, "publish")) = playlist_route(path) {
        playlist_mut(state, path, id)?.published = true;
        return Ok(Value::Null);
    }
    Err(status(path, 404, "not found"))
}

fn put(state: &mut State, call: &Call) -> Result<Value> {
    let path = call.path.as_str();
    let body = call.body.clone().unwrap_or(Value::Null);

    if let Some((id, "update-calendar")) = playlist_route(path) {
        playlist_mut(state, path, id)?.calendar = Some(body);
        return Ok(Value::Null);
    }
    for kind in AttachmentKind::ALL {
        let prefix = format!("{}/create-or-update-batch/", kind.list_path());
        if let Some(id) = path.strip_prefix(&prefix) {
            let id = Uuid::parse_str(id).map_err(|_| status(path, 400, "bad id"))?;
            let targets: Vec<Uuid> = body[kind.replace_key()]
                .as_array()
                .ok_or_else(|| status(path, 400, "missing id list"))?
                .iter()
                .filter_map(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
                .collect();
            let playlist = playlist_mut(state, path, id)?;
            *associations(playlist, kind) = targets
                .into_iter()
                .map(|target| (Uuid::new_v4(), target))
                .collect();
            return Ok(Value::Null);
        }
    }
    Err(status(path, 404, "not found"))
}

fn delete(state: &mut State, call: &Call) -> Result<Value> {
    let path = call.path.as_str();

    for kind in AttachmentKind::ALL {
        if path == kind.delete_batch_path() {
            let ids: Vec<Uuid> = call
                .body
                .as_ref()
                .and_then(|b| b["ids"].as_array().cloned())
                .unwrap_or_default()
                .iter()
                .filter_map(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
                .collect();
            for playlist in state.playlists.iter_mut() {
                associations(playlist, kind).retain(|(assoc, _)| !ids.contains(assoc));
            }
            return Ok(Value::Null);
        }
    }
    if let Some((id, "")) = playlist_route(path) {
        let playlist = playlist_mut(state, path, id)?;
        if !playlist.files.is_empty() || !playlist.screens.is_empty() {
            return Err(status(path, 409, "playlist has live attachments"));
        }
        state.playlists.retain(|p| p.id != id);
        return Ok(Value::Null);
    }
    Err(status(path, 404, "not found"))
}

impl Transport for MemoryBackend {
    fn authenticate(&self, credential: &Credential) -> Result<SessionToken> {
        let mut state = self.state.borrow_mut();
        state.auth_attempts += 1;
        if state.reject_token {
            return Err(status(routes::TOKEN, 400, "{\"error\":\"invalid_grant\"}"));
        }
        Ok(SessionToken {
            access_token: TOKEN.to_string(),
            tenant: credential.tenant.clone(),
        })
    }

    fn get(
        &self,
        token: &SessionToken,
        service: Service,
        path: &str,
        query: Query<'_>,
    ) -> Result<Value> {
        assert_eq!(token.access_token, TOKEN);
        self.handle(Method::Get, service, path, query, None, None)
    }

    fn post(
        &self,
        token: &SessionToken,
        path: &str,
        query: Query<'_>,
        body: Body,
    ) -> Result<Value> {
        assert_eq!(token.access_token, TOKEN);
        let (json, upload) = match body {
            Body::Empty => (None, None),
            Body::Json(v) => (Some(v), None),
            Body::Multipart(part) => (None, Some(part)),
        };
        self.handle(Method::Post, Service::Api, path, query, json, upload)
    }

    fn put(&self, token: &SessionToken, path: &str, body: &Value) -> Result<()> {
        assert_eq!(token.access_token, TOKEN);
        self.handle(Method::Put, Service::Api, path, &[], Some(body.clone()), None)
            .map(|_| ())
    }

    fn delete(&self, token: &SessionToken, path: &str, body: Option<&Value>) -> Result<()> {
        assert_eq!(token.access_token, TOKEN);
        self.handle(Method::Delete, Service::Api, path, &[], body.cloned(), None)
            .map(|_| ())
    }
}
