use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Ordered, Result};

/// Document field that carries the domain event.
pub const EVENT_FIELD: &str = "eventData";

pub type Aggregations = Ordered<Aggregation>;

/// A search response as returned by the engine's `_search` endpoint.
///
/// Only `hits` and `aggregations` are typed. Everything else (`took`, `_shards`, plugin fields)
/// is kept in `extra` so the raw view serializes back without loss.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
	pub hits: HitSet,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub aggregations: Option<Aggregations>,
	#[serde(flatten)]
	pub extra: Ordered<Value>,
}
impl SearchResponse {
	/// Checks the structural contract and then decodes the response.
	///
	/// `hits` must be an object, `hits.hits` an array of objects and `hits.total.value` an
	/// unsigned integer. Everything else is tolerated.
	pub fn from_value(value: Value) -> Result<Self> {
		check_structure(&value)?;

		serde_json::from_value(value).map_err(|err| Error::malformed("response", err.to_string()))
	}

	pub fn from_slice(bytes: &[u8]) -> Result<Self> {
		let value: Value = serde_json::from_slice(bytes)
			.map_err(|err| Error::malformed("response", format!("invalid JSON: {err}")))?;

		Self::from_value(value)
	}

	pub fn total_value(&self) -> Result<u64> {
		self.hits.total_value().ok_or_else(|| Error::malformed("hits.total", "missing"))
	}
}

/// The `hits` section. Only the hit list is typed; `total`, `max_score` and anything else stay
/// as received.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitSet {
	pub hits: Vec<Hit>,
	#[serde(flatten)]
	pub extra: Ordered<Value>,
}
impl HitSet {
	pub fn total_value(&self) -> Option<u64> {
		self.extra.get("total")?.get("value")?.as_u64()
	}

	pub fn max_score(&self) -> Option<f64> {
		self.extra.get("max_score")?.as_f64()
	}
}

/// One hit, exactly as the engine sent it.
///
/// No field is required: metadata such as `_id` or `_score` may be filtered out by the query
/// and is read through accessors instead.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hit {
	pub fields: Ordered<Value>,
}
impl Hit {
	pub fn index(&self) -> Option<&str> {
		self.fields.get("_index")?.as_str()
	}

	pub fn id(&self) -> Option<&str> {
		self.fields.get("_id")?.as_str()
	}

	pub fn score(&self) -> Option<f64> {
		self.fields.get("_score")?.as_f64()
	}

	pub fn source(&self) -> Option<&Value> {
		self.fields.get("_source").filter(|source| !source.is_null())
	}

	/// The document's `eventData`, if present and not null.
	pub fn event(&self) -> Option<&Value> {
		self.source()?.get(EVENT_FIELD).filter(|event| !event.is_null())
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub buckets: Option<Buckets>,
	#[serde(flatten)]
	pub extra: Ordered<Value>,
}
impl Aggregation {
	/// The bucket sequence, when this aggregation produced a non-empty one.
	pub fn bucket_list(&self) -> Option<&[Bucket]> {
		match &self.buckets {
			Some(Buckets::List(buckets)) if !buckets.is_empty() => Some(buckets),
			_ => None,
		}
	}
}

/// Keyed bucket objects (e.g. `filters` with `keyed: true`) and arrays holding anything other
/// than objects are not a bucket sequence and land in `Other`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Buckets {
	List(Vec<Bucket>),
	Other(Value),
}

/// A single bucket. Any JSON object is accepted; `key` and `doc_count` are read on demand so a
/// bucket that lacks them still groups and still serializes unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bucket {
	pub fields: Ordered<SubAggregation>,
}
impl Bucket {
	pub fn key(&self) -> Option<&Value> {
		match self.fields.get("key")? {
			SubAggregation::Other(key) => Some(key),
			SubAggregation::TopHits(_) => None,
		}
	}

	pub fn doc_count(&self) -> Option<u64> {
		match self.fields.get("doc_count")? {
			SubAggregation::Other(count) => count.as_u64(),
			SubAggregation::TopHits(_) => None,
		}
	}

	/// The first nested result shaped like a hit set (a `top_hits` sub-aggregation).
	pub fn top_hits(&self) -> Option<&HitSet> {
		self.fields.iter().find_map(|(_, sub)| match sub {
			SubAggregation::TopHits(top) => Some(&top.hits),
			SubAggregation::Other(_) => None,
		})
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubAggregation {
	TopHits(TopHits),
	Other(Value),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopHits {
	pub hits: HitSet,
	#[serde(flatten)]
	pub extra: Ordered<Value>,
}

fn check_structure(value: &Value) -> Result<()> {
	let root = value.as_object().ok_or_else(|| Error::malformed("response", "expected an object"))?;
	let hits = root.get("hits").ok_or_else(|| Error::malformed("hits", "missing"))?;
	let hits = hits.as_object().ok_or_else(|| Error::malformed("hits", "expected an object"))?;

	match hits.get("hits") {
		Some(Value::Array(list)) if list.iter().all(Value::is_object) => {},
		Some(Value::Array(_)) => return Err(Error::malformed("hits.hits", "expected objects")),
		Some(_) => return Err(Error::malformed("hits.hits", "expected a sequence")),
		None => return Err(Error::malformed("hits.hits", "missing")),
	}

	let total = hits.get("total").ok_or_else(|| Error::malformed("hits.total", "missing"))?;

	if !total.is_object() {
		return Err(Error::malformed("hits.total", "expected an object"));
	}

	match total.get("value") {
		Some(value) if value.is_u64() => Ok(()),
		Some(_) => Err(Error::malformed("hits.total.value", "expected an unsigned integer")),
		None => Err(Error::malformed("hits.total.value", "missing")),
	}
}
