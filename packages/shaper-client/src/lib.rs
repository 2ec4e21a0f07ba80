//! A minimal OpenSearch client: one `_search` call and the cluster info endpoint.

mod error;

pub use error::{Error, Result};

use std::time::Duration as StdDuration;

use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::Value;

use shaper_config::Search;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ClusterInfo {
	#[serde(default)]
	pub name: Option<String>,
	pub cluster_name: String,
	pub version: ClusterVersion,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ClusterVersion {
	pub number: String,
	#[serde(default)]
	pub distribution: Option<String>,
}

/// Constructed once by the caller and cloned freely; clones share one connection pool.
#[derive(Clone, Debug)]
pub struct SearchClient {
	http: Client,
	base: Url,
	username: String,
	password: Option<String>,
}
impl SearchClient {
	pub fn new(cfg: &Search) -> Result<Self> {
		let base = Url::parse(cfg.url.trim()).map_err(|err| Error::InvalidConfig {
			message: format!("search.url is not a valid URL: {err}"),
		})?;

		if base.cannot_be_a_base() {
			return Err(Error::InvalidConfig {
				message: "search.url must be a hierarchical http(s) URL.".to_string(),
			});
		}

		let http = Client::builder()
			.timeout(StdDuration::from_millis(cfg.timeout_ms))
			.danger_accept_invalid_certs(!cfg.verify_tls)
			.build()
			.map_err(|err| Error::InvalidConfig {
				message: format!("Failed to build HTTP client: {err}"),
			})?;

		Ok(Self { http, base, username: cfg.username.clone(), password: cfg.password.clone() })
	}

	pub fn base_url(&self) -> &str {
		self.base.as_str()
	}

	/// Runs `query` against `index` and returns the decoded response body untouched.
	pub async fn search(&self, index: &str, query: &Value) -> Result<Value> {
		let index = index.trim();

		if index.is_empty() {
			return Err(Error::InvalidRequest { message: "index must be non-empty.".to_string() });
		}

		let url = self.endpoint(&[index, "_search"])?;

		tracing::debug!(%url, "Dispatching search request.");

		let response = self.send(self.http.post(url).json(query)).await?;

		read_json(response).await
	}

	pub async fn info(&self) -> Result<ClusterInfo> {
		let url = self.endpoint(&[])?;
		let response = self.send(self.http.get(url)).await?;
		let body = read_json(response).await?;

		serde_json::from_value(body).map_err(|err| Error::InvalidResponse {
			message: format!("cluster info is missing expected fields: {err}"),
		})
	}

	fn endpoint(&self, segments: &[&str]) -> Result<Url> {
		let mut url = self.base.clone();

		{
			let mut path = url.path_segments_mut().map_err(|_| Error::InvalidConfig {
				message: "search.url must be a hierarchical http(s) URL.".to_string(),
			})?;

			path.pop_if_empty().extend(segments);
		}

		Ok(url)
	}

	async fn send(&self, builder: RequestBuilder) -> Result<Response> {
		builder
			.basic_auth(&self.username, self.password.as_deref())
			.send()
			.await
			.map_err(|err| Error::Connection { message: err.to_string() })
	}
}

async fn read_json(response: Response) -> Result<Value> {
	let status = response.status();
	let bytes = response
		.bytes()
		.await
		.map_err(|err| Error::Connection { message: format!("failed to read response body: {err}") })?;

	if status.is_success() {
		return serde_json::from_slice(&bytes).map_err(|err| Error::InvalidResponse {
			message: format!("body is not JSON: {err}"),
		});
	}

	let body = serde_json::from_slice::<Value>(&bytes)
		.unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()));
	let reason = rejection_reason(&body);

	tracing::warn!(status = status.as_u16(), reason = %reason, "OpenSearch rejected the request.");

	Err(Error::QueryRejected {
		status: status.as_u16(),
		reason,
		details: body.get("error").cloned().unwrap_or(body),
	})
}

/// Prefers the top-level `error.reason`, then the first root cause, then whatever text is there.
fn rejection_reason(body: &Value) -> String {
	let error = body.get("error");
	let reason = error
		.and_then(|error| error.get("reason"))
		.or_else(|| {
			error
				.and_then(|error| error.get("root_cause"))
				.and_then(|causes| causes.get(0))
				.and_then(|cause| cause.get("reason"))
		})
		.and_then(Value::as_str)
		.or_else(|| error.and_then(Value::as_str))
		.or_else(|| body.as_str());

	match reason {
		Some(reason) if !reason.trim().is_empty() => reason.to_string(),
		_ => "no error detail returned".to_string(),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::rejection_reason;

	#[test]
	fn reads_top_level_reason() {
		let body = json!({
			"error": {
				"root_cause": [{ "type": "parsing_exception", "reason": "inner" }],
				"type": "search_phase_execution_exception",
				"reason": "all shards failed"
			},
			"status": 400
		});

		assert_eq!(rejection_reason(&body), "all shards failed");
	}

	#[test]
	fn falls_back_to_root_cause() {
		let body = json!({ "error": { "root_cause": [{ "reason": "unknown query [mtch]" }] } });

		assert_eq!(rejection_reason(&body), "unknown query [mtch]");
	}

	#[test]
	fn accepts_plain_text_bodies() {
		assert_eq!(rejection_reason(&json!("Unauthorized")), "Unauthorized");
		assert_eq!(rejection_reason(&json!({ "error": "index_not_found" })), "index_not_found");
	}

	#[test]
	fn reports_missing_detail() {
		assert_eq!(rejection_reason(&json!({})), "no error detail returned");
	}
}
