use std::{
	future::IntoFuture,
	net::SocketAddr,
	sync::{Arc, Mutex},
};

use axum::{
	Router,
	body::Bytes,
	extract::State,
	http::{HeaderMap, Method, StatusCode, Uri, header::AUTHORIZATION},
	response::IntoResponse,
};
use serde_json::Value;
use tokio::{
	net::TcpListener,
	sync::oneshot::{self, Sender},
};

use crate::{Error, Result};

#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub method: String,
	pub path: String,
	pub authorization: Option<String>,
	pub body: Option<Value>,
}

#[derive(Clone)]
struct MockState {
	status: StatusCode,
	reply: Value,
	requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// A local HTTP server that answers every request with one canned JSON reply and records what it
/// received.
pub struct MockSearchEngine {
	base_url: String,
	requests: Arc<Mutex<Vec<RecordedRequest>>>,
	shutdown: Option<Sender<()>>,
}
impl MockSearchEngine {
	pub async fn start(status: u16, reply: Value) -> Result<Self> {
		let status = StatusCode::from_u16(status)
			.map_err(|err| Error::Message(format!("Invalid mock status {status}: {err}.")))?;
		let requests = Arc::new(Mutex::new(Vec::new()));
		let state = MockState { status, reply, requests: requests.clone() };
		let app = Router::new().fallback(record_and_reply).with_state(state);
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let addr = listener.local_addr()?;
		let (tx, rx) = oneshot::channel();
		let server = axum::serve(listener, app).with_graceful_shutdown(async move {
			let _ = rx.await;
		});

		tokio::spawn(async move {
			let _ = server.into_future().await;
		});

		Ok(Self { base_url: format!("http://{addr}"), requests, shutdown: Some(tx) })
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl Drop for MockSearchEngine {
	fn drop(&mut self) {
		if let Some(tx) = self.shutdown.take() {
			let _ = tx.send(());
		}
	}
}

/// A base URL on a loopback port that nothing listens on.
pub async fn unreachable_base_url() -> Result<String> {
	let listener = TcpListener::bind("127.0.0.1:0").await?;
	let addr: SocketAddr = listener.local_addr()?;

	drop(listener);

	Ok(format!("http://{addr}"))
}

async fn record_and_reply(
	State(state): State<MockState>,
	method: Method,
	uri: Uri,
	headers: HeaderMap,
	body: Bytes,
) -> impl IntoResponse {
	let authorization =
		headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).map(str::to_string);
	let body = serde_json::from_slice::<Value>(&body).ok();
	let request = RecordedRequest {
		method: method.to_string(),
		path: uri.path().to_string(),
		authorization,
		body,
	};

	state.requests.lock().unwrap_or_else(|err| err.into_inner()).push(request);

	(state.status, axum::Json(state.reply.clone()))
}
