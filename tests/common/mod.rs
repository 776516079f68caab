//! Shared fixtures for the integration tests.
//!
//! [`FakeTransport`] records every request and answers from a closure, so
//! tests can assert on request counts, URLs and bodies without a network.

#![allow(dead_code)]

use moysklad_api::clients::{HttpError, HttpMethod, HttpResponseError, Transport};
use moysklad_api::{Login, MoyskladClient, MoyskladConfig, Password};
use serde_json::{json, Value};
use std::sync::Mutex;

pub const BASE: &str = "https://api.moysklad.ru/api/remap/1.2";

/// One request seen by [`FakeTransport`].
#[derive(Clone, Debug, PartialEq)]
pub struct Recorded {
    pub method: HttpMethod,
    pub url: String,
    pub body: Option<Value>,
}

type Responder = Box<dyn Fn(&Recorded) -> Result<Value, HttpError> + Send + Sync>;

/// An in-memory transport answering from a closure.
pub struct FakeTransport {
    responder: Responder,
    requests: Mutex<Vec<Recorded>>,
}

impl FakeTransport {
    pub fn new(
        responder: impl Fn(&Recorded) -> Result<Value, HttpError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A transport that fails the test on any request.
    pub fn offline() -> Self {
        Self::new(|request| panic!("unexpected request: {request:?}"))
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Transport for FakeTransport {
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<Value>,
    ) -> Result<Value, HttpError> {
        let request = Recorded {
            method,
            url: url.to_string(),
            body,
        };
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(&request)
    }
}

pub fn config() -> MoyskladConfig {
    MoyskladConfig::builder()
        .login(Login::new("admin@test").unwrap())
        .password(Password::new("secret").unwrap())
        .build()
        .unwrap()
}

pub fn client(transport: FakeTransport) -> MoyskladClient<FakeTransport> {
    MoyskladClient::with_transport(transport, &config())
}

/// Reads a numeric query parameter, 0 when absent.
pub fn query_param(url: &str, name: &str) -> usize {
    url.split(['?', '&'])
        .find_map(|pair| pair.strip_prefix(&format!("{name}=")))
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

pub fn meta(entity_type: &str, id: &str) -> Value {
    json!({
        "href": format!("{BASE}/entity/{entity_type}/{id}"),
        "type": entity_type,
        "mediaType": "application/json"
    })
}

pub fn entity_json(entity_type: &str, id: &str) -> Value {
    json!({"meta": meta(entity_type, id), "id": id, "name": format!("{entity_type} {id}")})
}

/// Answers a collection page the way the server does: rows
/// `offset..min(size, offset + limit)` and the total `size`.
pub fn page(url: &str, entity_type: &str, size: usize) -> Value {
    let limit = query_param(url, "limit");
    let offset = query_param(url, "offset");
    let rows: Vec<Value> = (offset..size.min(offset + limit))
        .map(|i| entity_json(entity_type, &i.to_string()))
        .collect();
    json!({"meta": {"size": size, "limit": limit, "offset": offset}, "rows": rows})
}

pub fn bad_response(code: u16, messages: &[&str]) -> HttpError {
    HttpError::Response(HttpResponseError {
        code,
        messages: messages.iter().map(ToString::to_string).collect(),
        error_reference: None,
    })
}
