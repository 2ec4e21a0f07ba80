use clap::Parser;

use shaper_query::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	shaper_query::run(args).await
}
