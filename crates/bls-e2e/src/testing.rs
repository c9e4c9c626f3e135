//! Scripted transport for deterministic suite and runner tests.

use crate::transport::{ApiResponse, Method, StreamChannel, StreamError, Transport};
use async_trait::async_trait;
use bls_proto::echo_reply;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the scripted stream behaves.
#[derive(Debug, Clone)]
pub enum StreamScript {
    /// Replies with the echo of the last sent text
    Echo,
    /// Sends nothing; every receive times out
    Silent,
    /// Replies with a fixed text
    Reply(String),
    /// Refuses the connection
    Refuse(String),
}

/// Record of a scripted call.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug)]
struct ScriptState {
    /// Responses per route; the last one repeats once the queue drains.
    routes: HashMap<(Method, String), VecDeque<ApiResponse>>,
    calls: Vec<CallRecord>,
    stream: StreamScript,
    streams_opened: usize,
    streams_closed: usize,
    shutdowns: usize,
}

/// Transport that returns pre-scripted responses.
///
/// Clones share state, so a test can keep a handle after boxing one into a
/// run controller.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    /// A transport with no routes; every call answers 404.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                routes: HashMap::new(),
                calls: Vec::new(),
                stream: StreamScript::Echo,
                streams_opened: 0,
                streams_closed: 0,
                shutdowns: 0,
            })),
        }
    }

    /// Queues `body` with `status` for `method path`.
    pub fn on(self, method: Method, path: &str, status: u16, body: Value) -> Self {
        self.respond(method, path, ApiResponse::new(status, body))
    }

    pub fn respond(self, method: Method, path: &str, response: ApiResponse) -> Self {
        self.state
            .lock()
            .unwrap()
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
        self
    }

    /// Drops every queued response for `method path` and queues `response`.
    pub fn replace(self, method: Method, path: &str, status: u16, body: Value) -> Self {
        self.state
            .lock()
            .unwrap()
            .routes
            .remove(&(method, path.to_string()));
        self.on(method, path, status, body)
    }

    pub fn with_stream(self, script: StreamScript) -> Self {
        self.state.lock().unwrap().stream = script;
        self
    }

    /// A transport scripted with the answers of a conforming service for
    /// every suite, in run order.
    pub fn conforming() -> Self {
        use bls_proto::paths;

        let maria = json!({
            "id": "a1",
            "first_name": "Maria",
            "last_name": "Garcia",
            "email": "maria.garcia@email.com",
            "phone": "+34612345678",
            "passport_number": "ESP123456789",
            "nationality": "Spanish",
            "date_of_birth": "1990-05-15",
            "is_primary": true
        });
        let mut maria_updated = maria.clone();
        maria_updated["phone"] = json!("+34600000000");
        let carlos = json!({
            "id": "a2",
            "first_name": "Carlos",
            "last_name": "Rodriguez",
            "is_primary": false
        });

        let c1 = json!({
            "id": "c1",
            "email": "maria.garcia@blsspain.com",
            "name": "Maria Garcia BLS Account",
            "is_primary": true,
            "is_active": true
        });
        let c2 = json!({
            "id": "c2",
            "email": "carlos.rodriguez@blsspain.com",
            "name": "Carlos Rodriguez BLS Account",
            "is_primary": false,
            "is_active": true
        });
        let mut c2_primary = c2.clone();
        c2_primary["is_primary"] = json!(true);
        let c1_updated = json!({
            "id": "c1",
            "name": "Updated Maria Garcia BLS Account",
            "is_primary": false,
            "is_active": true
        });
        let not_found = json!({"detail": "Not found"});

        Self::new()
            // applicants
            .on(Method::Post, paths::APPLICANTS, 200, maria.clone())
            .on(Method::Post, paths::APPLICANTS, 200, carlos.clone())
            .on(Method::Get, paths::APPLICANTS, 200, json!([maria, carlos]))
            .on(Method::Get, &paths::applicant("a1"), 200, maria.clone())
            .on(Method::Get, &paths::applicant("a1"), 200, maria_updated.clone())
            .on(Method::Get, paths::PRIMARY_APPLICANT, 200, maria)
            .on(Method::Put, &paths::applicant("a1"), 200, maria_updated)
            .on(
                Method::Delete,
                &paths::applicant("a2"),
                200,
                json!({"message": "Applicant deleted successfully"}),
            )
            .on(Method::Get, &paths::applicant("a2"), 404, not_found.clone())
            // credentials
            .on(Method::Post, paths::CREDENTIALS, 200, c1.clone())
            .on(Method::Post, paths::CREDENTIALS, 200, c2.clone())
            .on(Method::Get, paths::CREDENTIALS, 200, json!([c1, c2]))
            .on(Method::Get, paths::ACTIVE_CREDENTIALS, 200, json!([c1, c2]))
            .on(Method::Get, &paths::credential("c1"), 200, c1.clone())
            .on(Method::Get, &paths::credential("c1"), 404, not_found)
            .on(Method::Get, paths::PRIMARY_CREDENTIAL, 200, c1)
            .on(Method::Get, paths::PRIMARY_CREDENTIAL, 200, c2_primary)
            .on(
                Method::Post,
                &paths::set_primary_credential("c2"),
                200,
                json!({"message": "Primary credential updated"}),
            )
            .on(
                Method::Post,
                &paths::test_credential("c1"),
                200,
                json!({"status": "success", "message": "Login successful"}),
            )
            .on(Method::Put, &paths::credential("c1"), 200, c1_updated)
            .on(
                Method::Delete,
                &paths::credential("c1"),
                200,
                json!({"message": "Credential deleted successfully"}),
            )
            // automation
            .on(Method::Get, paths::STATUS, 200, json!({"is_running": false}))
            .on(Method::Get, paths::STATUS, 200, json!({"is_running": true}))
            .on(Method::Get, paths::STATUS, 200, json!({"is_running": false}))
            .on(
                Method::Post,
                paths::START,
                200,
                json!({"message": "BLS automation system started"}),
            )
            .on(
                Method::Post,
                paths::SOLVE_CAPTCHA,
                200,
                json!({"selected_indices": [0, 2], "confidence": 0.87}),
            )
            .on(
                Method::Post,
                paths::BOOK_APPOINTMENT,
                200,
                json!({"status": "success", "booking_id": "BLS-0001", "message": "Booked"}),
            )
            .on(Method::Get, paths::BOOKINGS, 200, json!([]))
            .on(
                Method::Post,
                paths::STOP,
                200,
                json!({"message": "BLS automation system stopped"}),
            )
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls made to `method path`.
    pub fn call_count(&self, method: Method, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    pub fn shutdown_count(&self) -> usize {
        self.state.lock().unwrap().shutdowns
    }

    pub fn streams_opened(&self) -> usize {
        self.state.lock().unwrap().streams_opened
    }

    pub fn streams_closed(&self) -> usize {
        self.state.lock().unwrap().streams_closed
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(&self, method: Method, path: &str, body: Option<&Value>) -> ApiResponse {
        let mut state = self.state.lock().unwrap();
        state.calls.push(CallRecord {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });

        let Some(queue) = state.routes.get_mut(&(method, path.to_string())) else {
            return ApiResponse::new(404, json!({"detail": "Not Found"}));
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }

    async fn open_stream(&self, _path: &str) -> Result<Box<dyn StreamChannel>, StreamError> {
        let mut state = self.state.lock().unwrap();
        if let StreamScript::Refuse(reason) = &state.stream {
            return Err(StreamError::Connect(reason.clone()));
        }
        state.streams_opened += 1;

        Ok(Box::new(ScriptedChannel {
            script: state.stream.clone(),
            last_sent: None,
            state: Arc::clone(&self.state),
        }))
    }

    fn shutdown(&self) {
        self.state.lock().unwrap().shutdowns += 1;
    }
}

struct ScriptedChannel {
    script: StreamScript,
    last_sent: Option<String>,
    state: Arc<Mutex<ScriptState>>,
}

#[async_trait]
impl StreamChannel for ScriptedChannel {
    async fn send(&mut self, text: &str) -> Result<(), StreamError> {
        self.last_sent = Some(text.to_string());
        Ok(())
    }

    async fn receive(&mut self, timeout: Duration) -> Result<String, StreamError> {
        match (&self.script, &self.last_sent) {
            (StreamScript::Echo, Some(sent)) => Ok(echo_reply(sent)),
            (StreamScript::Reply(text), _) => Ok(text.clone()),
            _ => Err(StreamError::TimedOut(timeout)),
        }
    }

    async fn close(&mut self) {
        self.state.lock().unwrap().streams_closed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_last_response_repeats() {
        let transport = ScriptedTransport::new()
            .on(Method::Get, "/bls/status", 200, json!({"is_running": false}))
            .on(Method::Get, "/bls/status", 200, json!({"is_running": true}));

        let first = transport.call(Method::Get, "/bls/status", None).await;
        let second = transport.call(Method::Get, "/bls/status", None).await;
        let third = transport.call(Method::Get, "/bls/status", None).await;

        assert_eq!(first.body["is_running"], false);
        assert_eq!(second.body["is_running"], true);
        assert_eq!(third.body["is_running"], true);
        assert_eq!(transport.call_count(Method::Get, "/bls/status"), 3);
    }

    #[tokio::test]
    async fn test_unscripted_route_is_404() {
        let transport = ScriptedTransport::new();
        let response = transport.call(Method::Delete, "/applicants/x", None).await;
        assert_eq!(response.status, 404);
        assert!(!response.synthetic);
    }

    #[tokio::test]
    async fn test_echo_stream() {
        let transport = ScriptedTransport::new();
        let mut channel = transport.open_stream("/ws").await.unwrap();
        channel.send("hi").await.unwrap();
        assert_eq!(
            channel.receive(Duration::from_secs(1)).await.unwrap(),
            "Echo: hi"
        );
        channel.close().await;
        assert_eq!(transport.streams_closed(), 1);
    }
}
