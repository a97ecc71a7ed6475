//! Scripted transport for tests.
//!
//! Responses come from two places: routes (matched by method and path, reused
//! for every matching request) and a FIFO queue consumed by anything no route
//! matches. Every request is recorded so tests can assert on headers, query
//! parameters and bodies.

use super::ApiClient;
use super::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::error::{Error, Result};
use crate::model::User;
use crate::session::SessionStore;
use crate::store::MemoryStore;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Reply {
    Respond(ApiResponse),
    Fail(String),
    Stall,
}

#[derive(Debug, Default)]
struct Script {
    routes: Vec<(Method, String, Reply)>,
    queue: VecDeque<Reply>,
    requests: Vec<ApiRequest>,
}

/// Cloneable handle; clones share the same script and request log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next unrouted request.
    pub fn respond(self, status: u16, body: &str) -> Self {
        self.push(Reply::Respond(ApiResponse::new(status, body)));
        self
    }

    /// Queue a transport failure for the next unrouted request.
    pub fn fail(self, message: &str) -> Self {
        self.push(Reply::Fail(message.to_string()));
        self
    }

    /// Answer every `method path` request with the same response.
    pub fn route(self, method: Method, path: &str, status: u16, body: &str) -> Self {
        self.script.lock().unwrap().routes.push((
            method,
            path.to_string(),
            Reply::Respond(ApiResponse::new(status, body)),
        ));
        self
    }

    /// Queue a request that never gets an answer.
    pub fn stall(self) -> Self {
        self.push(Reply::Stall);
        self
    }

    fn push(&self, reply: Reply) {
        self.script.lock().unwrap().queue.push_back(reply);
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> ApiRequest {
        self.requests().pop().expect("no request was sent")
    }

    /// Requests sent to `method path`.
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let reply = {
            let mut script = self.script.lock().unwrap();
            let routed = script
                .routes
                .iter()
                .find(|(m, p, _)| *m == request.method && *p == request.path)
                .map(|(_, _, reply)| reply.clone());
            script.requests.push(request);
            routed.or_else(|| script.queue.pop_front())
        };

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(Error::Transport(message)),
            Some(Reply::Stall) => std::future::pending().await,
            None => Ok(ApiResponse::new(404, r#"{"detail": "no scripted response"}"#)),
        }
    }
}

/// Client over `transport` with an empty in-memory session.
pub fn client_with(transport: ScriptedTransport) -> (ApiClient<ScriptedTransport>, ScriptedTransport) {
    let session = SessionStore::new(Arc::new(MemoryStore::new()));
    (ApiClient::new(transport.clone(), session), transport)
}

/// Client whose session already holds a token and user `user_id`.
pub fn signed_in_client(
    transport: ScriptedTransport,
    user_id: i64,
) -> (ApiClient<ScriptedTransport>, ScriptedTransport) {
    let (client, transport) = client_with(transport);
    client.session().save_token("test-token").unwrap();
    client
        .session()
        .save_user(&User {
            id: user_id,
            email: format!("user{user_id}@example.com"),
            name: None,
            username: None,
            role: None,
        })
        .unwrap();
    (client, transport)
}

/// JSON for a backend task record.
pub fn task_json(id: i64, project_id: i64, status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": format!("Task {id}"),
        "description": null,
        "status": status,
        "priority": "medium",
        "complexity": "medium",
        "project_id": project_id,
        "created_at": "2025-01-01T00:00:00"
    })
}

/// JSON for a backend project record.
pub fn project_json(id: i64, name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "description": null,
        "tech_stack": null,
        "infrastructure": null,
        "members_count": 1,
        "start_date": "2025-01-01T00:00:00",
        "created_at": "2025-01-01T00:00:00",
        "updated_at": null
    })
}
