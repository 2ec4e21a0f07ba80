//! Pieces shared by the `shaper-*` binaries: version string, help styling and log setup.

use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};
use tracing_subscriber::EnvFilter;

/// Directive used when the configured log level does not parse.
pub const FALLBACK_LOG_LEVEL: &str = "info";
pub const VERSION: &str = concat!(
	env!("CARGO_PKG_VERSION"),
	"-",
	env!("VERGEN_GIT_SHA"),
	"-",
	env!("VERGEN_CARGO_TARGET_TRIPLE"),
);

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Cyan.on_default() | Effects::BOLD | Effects::UNDERLINE)
		.usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
		.error(AnsiColor::Red.on_default() | Effects::BOLD)
		.invalid(AnsiColor::Yellow.on_default() | Effects::BOLD)
}

/// Builds the filter for `service.log_level`, falling back to `info` on a bad directive.
pub fn log_filter(level: &str) -> EnvFilter {
	EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_LOG_LEVEL))
}

/// Installs the global subscriber. Logs go to stderr: stdout carries command output and, for the
/// stdio MCP transport, the protocol itself.
pub fn init_tracing(level: &str) {
	tracing_subscriber::fmt().with_env_filter(log_filter(level)).with_writer(std::io::stderr).init();
}
