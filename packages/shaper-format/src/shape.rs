use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Aggregations, Bucket, Error, Hit, Result, SearchResponse};

/// The caller-selected output shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
	/// The response unchanged.
	Raw,
	/// Total, grouping buckets and hits.
	Dto,
	/// Total plus the events carried by hits and by per-bucket top hits.
	Analytics,
}
impl OutputFormat {
	pub const ALL: [Self; 3] = [Self::Analytics, Self::Dto, Self::Raw];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Raw => "raw",
			Self::Dto => "dto",
			Self::Analytics => "analytics",
		}
	}
}
impl FromStr for OutputFormat {
	type Err = Error;

	fn from_str(token: &str) -> Result<Self> {
		Self::ALL
			.into_iter()
			.find(|format| format.as_str() == token)
			.ok_or_else(|| Error::InvalidFormat { received: token.to_string() })
	}
}
impl fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DtoResponse<'a> {
	pub total_value: u64,
	pub grouped_results: &'a [Bucket],
	pub hit_list: &'a [Hit],
}

/// `events` has one entry per hit; a hit without an event is `None` (serialized as `null`).
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse<'a> {
	pub count: u64,
	pub events: Vec<Option<&'a Value>>,
	pub grouped_events: Vec<Option<&'a Value>>,
}

/// A shaped view borrowing from the response it was built from.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Shaped<'a> {
	Raw(&'a SearchResponse),
	Dto(DtoResponse<'a>),
	Analytics(AnalyticsResponse<'a>),
}
impl Shaped<'_> {
	pub fn format(&self) -> OutputFormat {
		match self {
			Self::Raw(_) => OutputFormat::Raw,
			Self::Dto(_) => OutputFormat::Dto,
			Self::Analytics(_) => OutputFormat::Analytics,
		}
	}

	pub fn to_value(&self) -> Result<Value> {
		Ok(serde_json::to_value(self)?)
	}
}

/// Projects `response` into `format`.
///
/// Only a missing `hits.total` fails; absent aggregations, buckets without top hits and hits
/// without events all resolve to empty or `null` entries.
pub fn format(response: &SearchResponse, format: OutputFormat) -> Result<Shaped<'_>> {
	if format == OutputFormat::Raw {
		return Ok(Shaped::Raw(response));
	}

	let total_value = response.total_value()?;
	let buckets = select_grouping(response.aggregations.as_ref())
		.map(|(_, buckets)| buckets)
		.unwrap_or_default();

	if format == OutputFormat::Dto {
		return Ok(Shaped::Dto(DtoResponse {
			total_value,
			grouped_results: buckets,
			hit_list: &response.hits.hits,
		}));
	}

	let events = response.hits.hits.iter().map(Hit::event).collect();
	let grouped_events = buckets
		.iter()
		.filter_map(Bucket::top_hits)
		.flat_map(|top| top.hits.iter().map(Hit::event))
		.collect();

	Ok(Shaped::Analytics(AnalyticsResponse { count: total_value, events, grouped_events }))
}

/// Decodes, shapes and re-encodes a JSON response body in one step.
pub fn format_json(body: Value, format: OutputFormat) -> Result<Value> {
	if format == OutputFormat::Raw {
		return Ok(body);
	}

	let response = SearchResponse::from_value(body)?;

	self::format(&response, format)?.to_value()
}

/// Picks the grouping source: the first aggregation, in wire order, with a non-empty bucket
/// sequence.
pub fn select_grouping(aggregations: Option<&Aggregations>) -> Option<(&str, &[Bucket])> {
	aggregations?.iter().find_map(|(name, aggregation)| Some((name, aggregation.bucket_list()?)))
}
