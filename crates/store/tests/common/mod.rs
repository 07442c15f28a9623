//! In-memory stand-in for the GitHub Contents API

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use catnav_store::http::Method;
use catnav_store::{ContentStore, ContentStoreError, HttpExecutor, HttpRequest, HttpResponse, Result};
use serde_json::{Value, json};

pub const TOKEN: &str = "test-token";
pub const OWNER: &str = "maodeyu";
pub const REPO: &str = "nav";
pub const BRANCH: &str = "main";

const REPO_PREFIX: &str = "https://api.github.com/repos/maodeyu/nav";

/// What the fake does with the next request instead of routing it.
pub enum Scripted {
    Respond(HttpResponse),
    NetworkFailure(String),
    Stall,
}

#[derive(Default)]
struct State {
    files: HashMap<String, (Vec<u8>, String)>,
    next_sha: u64,
    requests: Vec<HttpRequest>,
    scripted: VecDeque<Scripted>,
    external_edit: Option<(String, Vec<u8>)>,
}

impl State {
    fn store(&mut self, path: &str, bytes: Vec<u8>) -> String {
        self.next_sha += 1;
        let sha = format!("sha-{}", self.next_sha);
        self.files.insert(path.to_string(), (bytes, sha.clone()));
        sha
    }
}

#[derive(Default)]
pub struct FakeGitHub {
    state: Mutex<State>,
}

impl FakeGitHub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Put a file in place and return its content hash.
    pub fn seed(&self, path: &str, content: impl Into<Vec<u8>>) -> String {
        self.state.lock().unwrap().store(path, content.into())
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().files.get(path).map(|(bytes, _)| bytes.clone())
    }

    pub fn file_text(&self, path: &str) -> Option<String> {
        self.file(path).map(|bytes| String::from_utf8(bytes).unwrap())
    }

    pub fn sha(&self, path: &str) -> Option<String> {
        self.state.lock().unwrap().files.get(path).map(|(_, sha)| sha.clone())
    }

    pub fn script(&self, step: Scripted) {
        self.state.lock().unwrap().scripted.push_back(step);
    }

    /// Another editor commits `content` right before the next write lands.
    pub fn external_edit_before_next_write(&self, path: &str, content: impl Into<Vec<u8>>) {
        self.state.lock().unwrap().external_edit = Some((path.to_string(), content.into()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn methods(&self) -> Vec<Method> {
        self.requests().iter().map(|r| r.method).collect()
    }

    /// JSON bodies of every PUT, in order.
    pub fn write_bodies(&self) -> Vec<Value> {
        self.requests()
            .iter()
            .filter(|r| r.method == Method::Put)
            .map(|r| serde_json::from_slice(r.body.as_deref().unwrap_or_default()).unwrap())
            .collect()
    }

    fn route(&self, request: &HttpRequest) -> HttpResponse {
        let expected = format!("Bearer {}", TOKEN);
        if request.header_value("authorization") != Some(expected.as_str()) {
            return error(401, "Bad credentials");
        }

        let Some(rest) = request.url.strip_prefix(REPO_PREFIX) else {
            return error(404, "Not Found");
        };

        if rest.is_empty() {
            return HttpResponse::new(
                200,
                json!({
                    "full_name": format!("{}/{}", OWNER, REPO),
                    "private": false,
                    "permissions": {"admin": false, "push": true, "pull": true}
                })
                .to_string(),
            );
        }

        let Some(path) = rest.strip_prefix("/contents/") else {
            return error(404, "Not Found");
        };

        match request.method {
            Method::Get => self.get(path),
            Method::Put => self.put(path, request.body.as_deref().unwrap_or_default()),
        }
    }

    fn get(&self, path: &str) -> HttpResponse {
        let state = self.state.lock().unwrap();
        let Some((bytes, sha)) = state.files.get(path) else {
            return error(404, "Not Found");
        };

        HttpResponse::new(
            200,
            json!({
                "type": "file",
                "encoding": "base64",
                "path": path,
                "sha": sha,
                "content": wrap_lines(&BASE64.encode(bytes)),
            })
            .to_string(),
        )
    }

    fn put(&self, path: &str, body: &[u8]) -> HttpResponse {
        let mut state = self.state.lock().unwrap();

        if let Some((edited, content)) = state.external_edit.take() {
            state.store(&edited, content);
        }

        let body: Value = match serde_json::from_slice(body) {
            Ok(body) => body,
            Err(_) => return error(400, "Problems parsing JSON"),
        };
        let supplied = body.get("sha").and_then(Value::as_str);
        let current = state.files.get(path).map(|(_, sha)| sha.clone());

        match (&current, supplied) {
            (Some(current), Some(supplied)) if current != supplied => {
                return error(409, &format!("{} does not match {}", path, supplied));
            }
            (Some(_), None) => return error(422, "Invalid request.\n\n\"sha\" wasn't supplied."),
            (None, Some(_)) => return error(409, &format!("{} does not exist", path)),
            _ => {}
        }

        let Some(bytes) = body
            .get("content")
            .and_then(Value::as_str)
            .and_then(|content| BASE64.decode(content).ok())
        else {
            return error(422, "content is not valid Base64");
        };

        let created = current.is_none();
        let sha = state.store(path, bytes);
        let commit = format!("commit-{}", state.next_sha);

        HttpResponse::new(
            if created { 201 } else { 200 },
            json!({
                "content": {"path": path, "sha": sha},
                "commit": {
                    "sha": commit,
                    "html_url": format!("https://github.com/{}/{}/commit/{}", OWNER, REPO, commit),
                    "message": body["message"],
                }
            })
            .to_string(),
        )
    }
}

#[async_trait]
impl HttpExecutor for FakeGitHub {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let scripted = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            state.scripted.pop_front()
        };

        match scripted {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::NetworkFailure(message)) => Err(ContentStoreError::NetworkError(message)),
            Some(Scripted::Stall) => std::future::pending().await,
            None => Ok(self.route(&request)),
        }
    }
}

fn error(status: u16, message: &str) -> HttpResponse {
    HttpResponse::new(
        status,
        json!({"message": message, "documentation_url": "https://docs.github.com/rest"}).to_string(),
    )
}

/// GitHub breaks base64 content into 60 character lines.
fn wrap_lines(encoded: &str) -> String {
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / 60 + 1);
    for chunk in encoded.as_bytes().chunks(60) {
        wrapped.push_str(std::str::from_utf8(chunk).unwrap());
        wrapped.push('\n');
    }
    wrapped
}

pub fn settings() -> HashMap<String, String> {
    HashMap::from([
        ("CATNAV_GITHUB_TOKEN".to_string(), TOKEN.to_string()),
        ("CATNAV_GITHUB_OWNER".to_string(), OWNER.to_string()),
        ("CATNAV_GITHUB_REPO".to_string(), REPO.to_string()),
        ("CATNAV_GITHUB_BRANCH".to_string(), BRANCH.to_string()),
    ])
}

pub fn store_with(github: &Arc<FakeGitHub>, settings: HashMap<String, String>) -> ContentStore {
    ContentStore::new(github.clone()).with_settings_source(Arc::new(settings))
}

pub fn store(github: &Arc<FakeGitHub>) -> ContentStore {
    store_with(github, settings())
}
