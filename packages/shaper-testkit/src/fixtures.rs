use serde_json::{Value, json};

const BY_SOURCE_RESPONSE: &str = include_str!("../fixtures/by_source_response.json");

pub fn event(event_id: &str, source_id: &str) -> Value {
	json!({
		"eventId": event_id,
		"taskId": "task-1",
		"serviceId": "service-1",
		"moduleId": "CROWD_COUNT",
		"eventSourceId": source_id,
		"eventSourceType": "live_stream",
		"eventDateTime": "2026-02-18T10:00:00Z",
		"videoTime": 0,
		"status": "unverified",
		"media": { "url": format!("https://media.local/{event_id}.jpg"), "type": "image", "mimeType": "image/jpeg" },
		"eventData": { "count": 12 }
	})
}

/// A hit whose `_source` holds `eventData` when `event` is `Some`, and only metadata otherwise.
pub fn hit(id: &str, event: Option<Value>) -> Value {
	let mut source = json!({ "metadata": { "resultId": format!("result-{id}"), "alertId": "" } });

	if let Some(event) = event {
		source["eventData"] = event;
	}

	json!({
		"_index": "analytics-events",
		"_id": id,
		"_score": 1.0,
		"_source": source
	})
}

pub fn response(total: u64, hits: Vec<Value>) -> Value {
	json!({
		"took": 4,
		"timed_out": false,
		"_shards": { "total": 1, "successful": 1, "skipped": 0, "failed": 0 },
		"hits": {
			"total": { "value": total, "relation": "eq" },
			"max_score": 1.0,
			"hits": hits
		}
	})
}

pub fn with_aggregations(mut response: Value, aggregations: Value) -> Value {
	response["aggregations"] = aggregations;

	response
}

pub fn terms_aggregation(buckets: Vec<Value>) -> Value {
	json!({
		"doc_count_error_upper_bound": 0,
		"sum_other_doc_count": 0,
		"buckets": buckets
	})
}

/// A terms bucket, optionally carrying a `latest_events` top-hits sub-aggregation.
pub fn bucket(key: &str, doc_count: u64, top_hits: Option<Vec<Value>>) -> Value {
	let mut bucket = json!({ "key": key, "doc_count": doc_count });

	if let Some(hits) = top_hits {
		bucket["latest_events"] = json!({
			"hits": {
				"total": { "value": hits.len(), "relation": "eq" },
				"max_score": null,
				"hits": hits
			}
		});
	}

	bucket
}

/// A captured `by_source` response: two live cameras, latest event per camera.
pub fn by_source_response() -> Value {
	serde_json::from_str(BY_SOURCE_RESPONSE).unwrap_or_else(|err| {
		panic!("Fixture by_source_response.json must be valid JSON: {err}.")
	})
}
