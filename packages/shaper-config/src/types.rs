use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	#[serde(default)]
	pub service: Service,
	pub search: Search,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Service {
	pub log_level: String,
	/// Either "stdio" or "http".
	pub transport: String,
	pub mcp_bind: String,
	/// Optional. Bearer token required by the HTTP transport. Without it the bind must be
	/// loopback.
	pub mcp_auth_token: Option<String>,
}
impl Default for Service {
	fn default() -> Self {
		Self {
			log_level: "info".to_string(),
			transport: "stdio".to_string(),
			mcp_bind: "127.0.0.1:8090".to_string(),
			mcp_auth_token: None,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Search {
	pub url: String,
	#[serde(default = "default_username")]
	pub username: String,
	/// Blank values are normalized to `None`.
	#[serde(default)]
	pub password: Option<String>,
	#[serde(default)]
	pub verify_tls: bool,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_index")]
	pub default_index: String,
}

fn default_username() -> String {
	"admin".to_string()
}

fn default_timeout_ms() -> u64 {
	30_000
}

fn default_index() -> String {
	"analytics-events".to_string()
}
