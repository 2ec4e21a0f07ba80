pub mod query;
pub mod table;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use serde_json::Value;

use shaper_client::SearchClient;
use shaper_format::{Hit, OutputFormat, SearchResponse};

pub const DEFAULT_SOURCE_FIELD: &str = "eventData.eventSourceId.keyword";

#[derive(Debug, Parser)]
#[command(
	version = shaper_cli::VERSION,
	rename_all = "kebab",
	styles = shaper_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Run a query body and print the shaped response as JSON.
	Search {
		#[arg(long, short = 'i', value_name = "INDEX")]
		index: Option<String>,
		#[arg(long, short = 'f', value_name = "FORMAT", default_value = "analytics")]
		format: OutputFormat,
		/// Query DSL file. `-` reads from stdin; omitted means an empty body.
		#[arg(long, short = 'q', value_name = "FILE")]
		query: Option<PathBuf>,
	},
	/// Print the cluster name and version.
	Ping,
	/// List the distinct values of a field with their document counts.
	Sources {
		#[arg(long, short = 'i', value_name = "INDEX")]
		index: Option<String>,
		#[arg(long, value_name = "FIELD", default_value = DEFAULT_SOURCE_FIELD)]
		field: String,
		#[arg(long, value_name = "N", default_value_t = 50)]
		size: u32,
	},
	/// Show the most recent events of one source.
	Events {
		#[arg(long, short = 's', value_name = "SOURCE_ID")]
		source: String,
		#[arg(long, short = 'i', value_name = "INDEX")]
		index: Option<String>,
		#[arg(long, value_name = "FIELD", default_value = DEFAULT_SOURCE_FIELD)]
		field: String,
		#[arg(long, value_name = "N", default_value_t = 3)]
		size: u32,
	},
}

pub async fn run(args: Args) -> Result<()> {
	let config = shaper_config::load(&args.config)?;

	shaper_cli::init_tracing(&config.service.log_level);

	let client = SearchClient::new(&config.search)?;
	let default_index = config.search.default_index.as_str();

	match args.command {
		Command::Search { index, format, query: query_path } => {
			let body = query::read_query(query_path.as_deref())?;
			let index = index.as_deref().unwrap_or(default_index);
			let shaped = search(&client, index, &body, format).await?;
			let json = serde_json::to_string_pretty(&shaped)?;

			println!("{json}");
		},
		Command::Ping => {
			let info = client.info().await?;

			println!("Connected to {} at {}.", info.cluster_name, client.base_url());
			println!("Version: {}", info.version.number);
		},
		Command::Sources { index, field, size } => {
			let index = index.as_deref().unwrap_or(default_index);
			let body = client.search(index, &query::sources_query(&field, size)).await?;
			let response = SearchResponse::from_value(body)?;

			match shaper_format::select_grouping(response.aggregations.as_ref()) {
				Some((_, buckets)) => {
					println!("Available values of {field} in {index}:");

					table::bucket_table(buckets).printstd();
				},
				None => println!("No values of {field} found in {index}."),
			}
		},
		Command::Events { source, index, field, size } => {
			let index = index.as_deref().unwrap_or(default_index);
			let body = client.search(index, &query::events_query(&field, &source, size)).await?;
			let response = SearchResponse::from_value(body)?;
			let events: Vec<Option<&Value>> = response.hits.hits.iter().map(Hit::event).collect();

			println!("Found {} events for source {source}.", response.total_value()?);

			if events.is_empty() {
				println!("No events found for this source.");
			} else {
				println!("Showing the {} most recent:", events.len());

				table::event_table(&events).printstd();
			}
		},
	}

	Ok(())
}

/// Runs `body` against `index` and returns the response in the requested shape.
pub async fn search(
	client: &SearchClient,
	index: &str,
	body: &Value,
	format: OutputFormat,
) -> Result<Value> {
	tracing::info!(%index, %format, "Executing OpenSearch query.");

	let raw = client.search(index, body).await?;

	Ok(shaper_format::format_json(raw, format)?)
}
