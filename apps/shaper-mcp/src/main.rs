use clap::Parser;

use shaper_mcp::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	shaper_mcp::run(args).await
}
