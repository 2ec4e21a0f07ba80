//! Shapes search-engine responses into the raw, dto and analytics output contracts.
//!
//! Everything here is a pure transform over borrowed input: no I/O, no shared state.

mod error;
mod ordered;
mod response;
mod shape;

pub use error::{Error, Result};
pub use ordered::Ordered;
pub use response::{
	Aggregation, Aggregations, Bucket, Buckets, EVENT_FIELD, Hit, HitSet, SearchResponse,
	SubAggregation, TopHits,
};
pub use shape::{
	AnalyticsResponse, DtoResponse, OutputFormat, Shaped, format, format_json, select_grouping,
};
