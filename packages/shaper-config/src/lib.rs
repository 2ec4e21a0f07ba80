mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Search, Service};

use std::{env, fs, net::SocketAddr, path::Path};

pub const ENV_URL: &str = "OPENSEARCH_URL";
pub const ENV_USERNAME: &str = "OPENSEARCH_USER_NAME";
pub const ENV_PASSWORD: &str = "OPENSEARCH_PASSWORD";
pub const ENV_INDEX: &str = "INDEX_NAME";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	apply_env_overrides(&mut cfg, |key| env::var(key).ok());

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

/// Environment values win over the file for the connection settings and the default index.
pub fn apply_env_overrides<F>(cfg: &mut Config, lookup: F)
where
	F: Fn(&str) -> Option<String>,
{
	if let Some(url) = lookup(ENV_URL) {
		cfg.search.url = url;
	}
	if let Some(username) = lookup(ENV_USERNAME) {
		cfg.search.username = username;
	}
	if let Some(password) = lookup(ENV_PASSWORD) {
		cfg.search.password = Some(password);
	}
	if let Some(index) = lookup(ENV_INDEX) {
		cfg.search.default_index = index;
	}
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	match cfg.service.transport.as_str() {
		"stdio" => {},
		"http" => {
			cfg.service.mcp_bind.parse::<SocketAddr>().map_err(|err| Error::Validation {
				message: format!(
					"service.mcp_bind must be a valid socket address when service.transport=http: {err}"
				),
			})?;
		},
		_ => {
			return Err(Error::Validation {
				message: "service.transport must be one of stdio or http.".to_string(),
			});
		},
	}

	let url = cfg.search.url.trim();

	if url.is_empty() {
		return Err(Error::Validation { message: "search.url must be non-empty.".to_string() });
	}
	if !(url.starts_with("http://") || url.starts_with("https://")) {
		return Err(Error::Validation {
			message: "search.url must start with http:// or https://.".to_string(),
		});
	}
	if cfg.search.username.trim().is_empty() {
		return Err(Error::Validation {
			message: "search.username must be non-empty.".to_string(),
		});
	}
	if cfg.search.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "search.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_index.trim().is_empty() {
		return Err(Error::Validation {
			message: "search.default_index must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.search.password.as_deref().map(|password| password.is_empty()).unwrap_or(false) {
		cfg.search.password = None;
	}
	if cfg.service.mcp_auth_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false)
	{
		cfg.service.mcp_auth_token = None;
	}

	cfg.search.url = cfg.search.url.trim().trim_end_matches('/').to_string();
	cfg.search.default_index = cfg.search.default_index.trim().to_string();
}
