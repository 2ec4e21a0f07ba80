pub mod server;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use color_eyre::{Result, eyre};

use shaper_client::SearchClient;
use shaper_config::Service;

#[derive(Debug, Parser)]
#[command(
	version = shaper_cli::VERSION,
	rename_all = "kebab",
	styles = shaper_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum McpAuthState {
	Off,
	Bearer { token: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transport {
	Stdio,
	Http,
}

pub async fn run(args: Args) -> Result<()> {
	let config = shaper_config::load(&args.config)?;

	shaper_cli::init_tracing(&config.service.log_level);

	let client = SearchClient::new(&config.search)?;
	let default_index = config.search.default_index.clone();

	match parse_transport(&config.service)? {
		Transport::Stdio => {
			tracing::info!(endpoint = client.base_url(), "Serving MCP over stdio.");

			server::serve_stdio(client, default_index).await
		},
		Transport::Http => {
			let auth_state = build_auth_state(&config.service)?;

			tracing::info!(
				bind = %config.service.mcp_bind,
				endpoint = client.base_url(),
				"Serving MCP over HTTP."
			);

			server::serve_http(&config.service.mcp_bind, auth_state, client, default_index).await
		},
	}
}

fn parse_transport(service: &Service) -> Result<Transport> {
	match service.transport.trim() {
		"stdio" => Ok(Transport::Stdio),
		"http" => Ok(Transport::Http),
		other => Err(eyre::eyre!("service.transport must be one of stdio or http, got {other}.")),
	}
}

fn build_auth_state(service: &Service) -> Result<McpAuthState> {
	match service.mcp_auth_token.as_deref().map(str::trim) {
		Some(token) if !token.is_empty() => Ok(McpAuthState::Bearer { token: token.to_string() }),
		_ => {
			enforce_loopback_without_token(&service.mcp_bind)?;

			Ok(McpAuthState::Off)
		},
	}
}

fn enforce_loopback_without_token(mcp_bind: &str) -> Result<()> {
	let bind_addr: SocketAddr = mcp_bind
		.parse()
		.map_err(|err| eyre::eyre!("service.mcp_bind must be a valid socket address: {err}"))?;

	if !bind_addr.ip().is_loopback() {
		return Err(eyre::eyre!(
			"service.mcp_bind must be a loopback address when service.mcp_auth_token is unset."
		));
	}

	Ok(())
}
