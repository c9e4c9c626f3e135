//! In-process double of the BLS service.
//!
//! Serves the HTTP API under `/api` and the echo socket at `/ws` on an
//! ephemeral localhost port. State lives in memory and the primary
//! designation is kept exclusive the way the real service does it.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{
        Path, Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use bls_proto::{
    ApplicantRecord, BookingRequest, CaptchaRequest, CredentialRecord, NewApplicant,
    NewCredential, echo_reply,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Deviations from conforming behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct Behavior {
    /// `/bls/stop` acknowledges but leaves the system running.
    pub broken_stop: bool,
    /// The socket accepts messages but never answers.
    pub silent_stream: bool,
}

#[derive(Debug, Default)]
struct Store {
    applicants: Vec<ApplicantRecord>,
    credentials: Vec<CredentialRecord>,
    bookings: Vec<Value>,
    running: bool,
    next_id: u64,
}

impl Store {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn primary_applicant(&self) -> Option<&ApplicantRecord> {
        self.applicants.iter().find(|a| a.is_primary)
    }

    fn primary_credential(&self) -> Option<&CredentialRecord> {
        self.credentials.iter().find(|c| c.is_primary)
    }

    fn make_primary_applicant(&mut self, id: &str) {
        for applicant in &mut self.applicants {
            applicant.is_primary = applicant.id == id;
        }
    }

    fn make_primary_credential(&mut self, id: &str) {
        for credential in &mut self.credentials {
            credential.is_primary = credential.id == id;
        }
    }
}

#[derive(Clone)]
struct AppState {
    store: Arc<Mutex<Store>>,
    behavior: Behavior,
}

type Reply = (StatusCode, Json<Value>);

fn ok(value: impl Serialize) -> Reply {
    (
        StatusCode::OK,
        Json(serde_json::to_value(value).unwrap()),
    )
}

fn message(text: impl Into<String>) -> Reply {
    ok(json!({ "message": text.into() }))
}

fn not_found(what: &str) -> Reply {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "detail": format!("{what} not found") })),
    )
}

/// A running mock service. Aborted on drop.
pub struct MockService {
    pub base_url: String,
    store: Arc<Mutex<Store>>,
    handle: JoinHandle<()>,
}

impl MockService {
    pub async fn spawn(behavior: Behavior) -> Self {
        let store = Arc::new(Mutex::new(Store::default()));
        let app = router(AppState {
            store: Arc::clone(&store),
            behavior,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            store,
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.store.lock().unwrap().running
    }

    pub fn applicant_ids(&self) -> Vec<String> {
        let store = self.store.lock().unwrap();
        store.applicants.iter().map(|a| a.id.clone()).collect()
    }

    pub fn credentials(&self) -> Vec<CredentialRecord> {
        self.store.lock().unwrap().credentials.clone()
    }

    pub fn booking_count(&self) -> usize {
        self.store.lock().unwrap().bookings.len()
    }
}

impl Drop for MockService {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A localhost URL nothing is listening on.
pub fn closed_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/applicants", get(list_applicants).post(create_applicant))
        .route("/applicants/primary/info", get(primary_applicant))
        .route(
            "/applicants/{id}",
            get(get_applicant)
                .put(update_applicant)
                .delete(delete_applicant),
        )
        .route("/credentials", get(list_credentials).post(create_credential))
        .route("/credentials/primary/info", get(primary_credential))
        .route(
            "/credentials/{id}",
            get(get_credential)
                .put(update_credential)
                .delete(delete_credential),
        )
        .route("/credentials/{id}/set-primary", post(set_primary_credential))
        .route("/credentials/{id}/test", post(test_credential))
        .route("/bls/status", get(status))
        .route("/bls/start", post(start))
        .route("/bls/stop", post(stop))
        .route("/bls/solve-captcha", post(solve_captcha))
        .route("/bls/book-appointment", post(book_appointment))
        .route("/bls/bookings", get(bookings));

    Router::new()
        .nest("/api", api)
        .route("/ws", get(ws_handler))
        .with_state(state)
}

// ==================== Applicants ====================

async fn list_applicants(State(state): State<AppState>) -> Reply {
    ok(&state.store.lock().unwrap().applicants)
}

async fn create_applicant(
    State(state): State<AppState>,
    Json(new): Json<NewApplicant>,
) -> Reply {
    let mut store = state.store.lock().unwrap();
    let id = store.next_id("app");
    let record = ApplicantRecord::from_new(id.clone(), new);
    let primary = record.is_primary;
    store.applicants.push(record.clone());
    if primary {
        store.make_primary_applicant(&id);
    }
    ok(record)
}

async fn primary_applicant(State(state): State<AppState>) -> Reply {
    match state.store.lock().unwrap().primary_applicant() {
        Some(record) => ok(record),
        None => not_found("Primary applicant"),
    }
}

async fn get_applicant(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let store = state.store.lock().unwrap();
    match store.applicants.iter().find(|a| a.id == id) {
        Some(record) => ok(record),
        None => not_found("Applicant"),
    }
}

async fn update_applicant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(new): Json<NewApplicant>,
) -> Reply {
    let mut store = state.store.lock().unwrap();
    let Some(index) = store.applicants.iter().position(|a| a.id == id) else {
        return not_found("Applicant");
    };
    let record = ApplicantRecord::from_new(id.clone(), new);
    let primary = record.is_primary;
    store.applicants[index] = record.clone();
    if primary {
        store.make_primary_applicant(&id);
    }
    ok(record)
}

async fn delete_applicant(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let mut store = state.store.lock().unwrap();
    let before = store.applicants.len();
    store.applicants.retain(|a| a.id != id);
    if store.applicants.len() == before {
        return not_found("Applicant");
    }
    message("Applicant deleted successfully")
}

// ==================== Credentials ====================

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    active_only: bool,
}

async fn list_credentials(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Reply {
    let store = state.store.lock().unwrap();
    let records: Vec<&CredentialRecord> = store
        .credentials
        .iter()
        .filter(|c| !query.active_only || c.is_active)
        .collect();
    ok(records)
}

async fn create_credential(
    State(state): State<AppState>,
    Json(new): Json<NewCredential>,
) -> Reply {
    let mut store = state.store.lock().unwrap();
    let id = store.next_id("cred");
    let record = CredentialRecord::from_new(id.clone(), new);
    let primary = record.is_primary;
    store.credentials.push(record.clone());
    if primary {
        store.make_primary_credential(&id);
    }
    ok(record)
}

async fn primary_credential(State(state): State<AppState>) -> Reply {
    match state.store.lock().unwrap().primary_credential() {
        Some(record) => ok(record),
        None => not_found("Primary credential"),
    }
}

async fn get_credential(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let store = state.store.lock().unwrap();
    match store.credentials.iter().find(|c| c.id == id) {
        Some(record) => ok(record),
        None => not_found("Credential"),
    }
}

/// A replace applies `is_primary` as sent, demoting the others when set.
async fn update_credential(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(new): Json<NewCredential>,
) -> Reply {
    let mut store = state.store.lock().unwrap();
    let Some(index) = store.credentials.iter().position(|c| c.id == id) else {
        return not_found("Credential");
    };
    let record = CredentialRecord::from_new(id.clone(), new);
    let primary = record.is_primary;
    store.credentials[index] = record.clone();
    if primary {
        store.make_primary_credential(&id);
    }
    ok(record)
}

async fn delete_credential(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let mut store = state.store.lock().unwrap();
    let before = store.credentials.len();
    store.credentials.retain(|c| c.id != id);
    if store.credentials.len() == before {
        return not_found("Credential");
    }
    message("Credential deleted successfully")
}

async fn set_primary_credential(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Reply {
    let mut store = state.store.lock().unwrap();
    if !store.credentials.iter().any(|c| c.id == id) {
        return not_found("Credential");
    }
    store.make_primary_credential(&id);
    message("Primary credential updated")
}

async fn test_credential(State(state): State<AppState>, Path(id): Path<String>) -> Reply {
    let store = state.store.lock().unwrap();
    match store.credentials.iter().find(|c| c.id == id) {
        Some(record) => ok(json!({
            "status": "success",
            "message": format!("Login test successful for {}", record.name),
        })),
        None => not_found("Credential"),
    }
}

// ==================== Automation ====================

async fn status(State(state): State<AppState>) -> Reply {
    ok(json!({ "is_running": state.store.lock().unwrap().running }))
}

async fn start(State(state): State<AppState>) -> Reply {
    state.store.lock().unwrap().running = true;
    message("BLS automation system started")
}

async fn stop(State(state): State<AppState>) -> Reply {
    if !state.behavior.broken_stop {
        state.store.lock().unwrap().running = false;
    }
    message("BLS automation system stopped")
}

async fn solve_captcha(Json(request): Json<CaptchaRequest>) -> Reply {
    let selected: Vec<usize> = (0..request.captcha_images.len()).step_by(2).collect();
    ok(json!({ "selected_indices": selected, "confidence": 0.91 }))
}

async fn book_appointment(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> Reply {
    let mut store = state.store.lock().unwrap();
    if store.primary_applicant().is_none() || store.primary_credential().is_none() {
        return ok(json!({
            "status": "failure",
            "message": "Primary applicant and credential required",
        }));
    }

    let booking_id = store.next_id("BLS");
    store.bookings.push(json!({
        "booking_id": booking_id,
        "location": request.location,
        "visa_type": request.visa_type,
    }));
    ok(json!({
        "status": "success",
        "booking_id": booking_id,
        "message": "Appointment booked",
    }))
}

async fn bookings(State(state): State<AppState>) -> Reply {
    ok(&state.store.lock().unwrap().bookings)
}

// ==================== Streaming ====================

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let silent = state.behavior.silent_stream;
    ws.on_upgrade(move |socket| echo(socket, silent))
}

async fn echo(mut socket: WebSocket, silent: bool) {
    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                if silent {
                    continue;
                }
                let reply = echo_reply(text.as_str());
                if socket.send(Message::Text(reply.into())).await.is_err() {
                    break;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
}
