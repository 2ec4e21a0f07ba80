//! Query bodies built by the CLI and the reader for user-supplied ones.

use std::{
	fs,
	io::{self, Read},
	path::Path,
};

use color_eyre::{Result, eyre};
use serde_json::{Value, json};

/// Name of the terms aggregation issued by `sources`.
pub const SOURCES_AGGREGATION: &str = "by_source";

/// Reads a query body from `path`, or stdin when `path` is `-`. No path means an empty body.
pub fn read_query(path: Option<&Path>) -> Result<Value> {
	let raw = match path {
		None => return Ok(json!({})),
		Some(path) if path.as_os_str() == "-" => {
			let mut raw = String::new();

			io::stdin().read_to_string(&mut raw)?;

			raw
		},
		Some(path) => fs::read_to_string(path)?,
	};

	parse_query(&raw)
}

pub fn parse_query(raw: &str) -> Result<Value> {
	let value: Value = serde_json::from_str(raw)?;

	if !value.is_object() {
		return Err(eyre::eyre!("Query body must be a JSON object."));
	}

	Ok(value)
}

pub fn sources_query(field: &str, size: u32) -> Value {
	json!({
		"size": 0,
		"aggs": {
			SOURCES_AGGREGATION: {
				"terms": { "field": field, "size": size }
			}
		}
	})
}

/// Latest `size` events whose `field` equals `source_id`, newest first.
pub fn events_query(field: &str, source_id: &str, size: u32) -> Value {
	json!({
		"query": { "term": { field: source_id } },
		"sort": [{ "eventData.eventDateTime": { "order": "desc" } }],
		"size": size
	})
}
