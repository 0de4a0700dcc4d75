//! Mock directory API served by Actix on an ephemeral port.
//!
//! Each test builds a [`DirectoryState`] describing the users, roles and
//! scripted failures it needs, then starts a server bound to `127.0.0.1:0`.

use std::collections::{HashMap, VecDeque};
use std::net::TcpListener;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use roster_client::domain::{Role, UserProfile};
use serde_json::Value;
use url::Url;

/// Canned directory contents and failure script.
#[derive(Default)]
pub struct DirectoryState {
    users: Mutex<HashMap<String, Value>>,
    user_failures: Mutex<HashMap<String, VecDeque<u16>>>,
    roles: Mutex<Option<(u16, String)>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<String>>,
}

impl DirectoryState {
    /// Serve `profile` under its own identifier.
    pub fn with_user(self, profile: &UserProfile) -> Self {
        let body = serde_json::to_value(profile).expect("profile encodes");
        self.with_user_json(&profile.id, body)
    }

    /// Serve an arbitrary JSON body for `id`.
    pub fn with_user_json(self, id: &str, body: Value) -> Self {
        lock(&self.users).insert(id.to_owned(), body);
        self
    }

    /// Answer the next requests for `id` with these statuses, in order.
    pub fn failing_user(self, id: &str, statuses: impl IntoIterator<Item = u16>) -> Self {
        lock(&self.user_failures)
            .entry(id.to_owned())
            .or_default()
            .extend(statuses);
        self
    }

    /// Serve `roles` as the role list.
    pub fn with_roles(self, roles: &[Role]) -> Self {
        let body = serde_json::to_string(roles).expect("roles encode");
        self.with_roles_body(200, body)
    }

    /// Serve a raw role list response.
    pub fn with_roles_body(self, status: u16, body: impl Into<String>) -> Self {
        *lock(&self.roles) = Some((status, body.into()));
        self
    }

    /// Delay every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn record(&self, request: &HttpRequest) {
        lock(&self.requests).push(request.path().to_owned());
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            actix_web::rt::time::sleep(delay).await;
        }
    }
}

/// Running mock server.
pub struct MockDirectory {
    base_url: Url,
    handle: ServerHandle,
    state: web::Data<DirectoryState>,
}

impl MockDirectory {
    /// Bind an ephemeral port and serve `state` below `/api/`.
    pub fn start(state: DirectoryState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock directory");
        let addr = listener.local_addr().expect("mock directory address");
        let data = web::Data::new(state);
        let server_data = data.clone();

        let server = HttpServer::new(move || {
            App::new()
                .app_data(server_data.clone())
                .route("/api/users/{id}", web::get().to(user))
                .route("/api/roles", web::get().to(roles))
        })
        .disable_signals()
        .workers(1)
        .listen(listener)
        .expect("listen on mock directory")
        .run();

        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            base_url: Url::parse(&format!("http://{addr}/api/")).expect("mock base url"),
            handle,
            state: data,
        }
    }

    /// Base URL to inject into the adapter.
    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Paths requested so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state.requests).clone()
    }

    /// Stop the server and wait for it to shut down.
    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}

/// Base URL of a port with nothing listening on it.
pub fn unreachable_base_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind throwaway port");
    let addr = listener.local_addr().expect("throwaway address");
    drop(listener);
    Url::parse(&format!("http://{addr}/api/")).expect("unreachable base url")
}

async fn user(
    state: web::Data<DirectoryState>,
    path: web::Path<String>,
    request: HttpRequest,
) -> HttpResponse {
    state.record(&request);
    state.pause().await;
    let id = path.into_inner();

    let scripted = lock(&state.user_failures)
        .get_mut(&id)
        .and_then(VecDeque::pop_front);
    if let Some(status) = scripted {
        return HttpResponse::build(status_code(status)).body("scripted failure");
    }

    let body = lock(&state.users).get(&id).cloned();
    match body {
        Some(body) => HttpResponse::Ok().json(body),
        None => HttpResponse::NotFound().body(format!("no user {id}")),
    }
}

async fn roles(state: web::Data<DirectoryState>, request: HttpRequest) -> HttpResponse {
    state.record(&request);
    state.pause().await;

    let reply = lock(&state.roles).clone();
    match reply {
        Some((status, body)) => HttpResponse::build(status_code(status))
            .content_type("application/json")
            .body(body),
        None => HttpResponse::Ok().json(Vec::<Value>::new()),
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).expect("valid scripted status")
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
