use serde_json::{Value, json};

use rmcp::model::{CallToolResult, JsonObject};
use shaper_client::SearchClient;
use shaper_config::Search;
use shaper_mcp::server::ShaperMcp;
use shaper_testkit::{MockSearchEngine, fixtures};

fn server_for(url: &str) -> ShaperMcp {
	let search = Search {
		url: url.to_string(),
		username: "admin".to_string(),
		password: None,
		verify_tls: true,
		timeout_ms: 5_000,
		default_index: "analytics-events".to_string(),
	};
	let client = SearchClient::new(&search).expect("Failed to build client.");

	ShaperMcp::new(client, search.default_index)
}

fn params(value: Value) -> JsonObject {
	value.as_object().cloned().expect("Params must be an object.")
}

fn structured(result: &CallToolResult) -> &Value {
	result.structured_content.as_ref().expect("Tool result must carry structured content.")
}

fn is_error(result: &CallToolResult) -> bool {
	result.is_error.unwrap_or(false)
}

#[tokio::test]
async fn defaults_to_analytics_on_the_configured_index() {
	let engine = MockSearchEngine::start(200, fixtures::by_source_response())
		.await
		.expect("Failed to start mock.");
	let server = server_for(engine.base_url());
	let result =
		server.execute_opensearch_query(params(json!({}))).await.expect("Tool call must succeed.");

	assert!(!is_error(&result));
	assert_eq!(structured(&result)["count"], json!(42));
	assert_eq!(structured(&result)["groupedEvents"].as_array().map(Vec::len), Some(2));

	let requests = engine.requests();

	assert_eq!(requests[0].path, "/analytics-events/_search");
	assert_eq!(requests[0].body, Some(json!({})));
}

#[tokio::test]
async fn dto_format_and_explicit_index_are_honored() {
	let engine = MockSearchEngine::start(200, fixtures::by_source_response())
		.await
		.expect("Failed to start mock.");
	let server = server_for(engine.base_url());
	let query = json!({ "size": 2, "query": { "term": { "eventData.moduleType": "CROWD_COUNT" } } });
	let result = server
		.execute_opensearch_query(params(json!({
			"query": query,
			"index": "analytics-events-2026",
			"format": "dto",
		})))
		.await
		.expect("Tool call must succeed.");

	assert_eq!(structured(&result)["totalValue"], json!(42));
	assert_eq!(structured(&result)["hitList"].as_array().map(Vec::len), Some(2));
	assert_eq!(engine.requests()[0].path, "/analytics-events-2026/_search");
	assert_eq!(engine.requests()[0].body, Some(query));
}

#[tokio::test]
async fn raw_format_returns_the_engine_body() {
	let reply = fixtures::by_source_response();
	let engine = MockSearchEngine::start(200, reply.clone()).await.expect("Failed to start mock.");
	let server = server_for(engine.base_url());
	let result = server
		.execute_opensearch_query(params(json!({ "format": "raw" })))
		.await
		.expect("Tool call must succeed.");

	assert_eq!(structured(&result), &reply);
}

#[tokio::test]
async fn unknown_format_is_reported_without_querying() {
	let engine = MockSearchEngine::start(200, fixtures::by_source_response())
		.await
		.expect("Failed to start mock.");
	let server = server_for(engine.base_url());
	let result = server
		.execute_opensearch_query(params(json!({ "format": "xml" })))
		.await
		.expect("Tool call must return a result.");

	assert!(is_error(&result));
	assert_eq!(
		structured(&result),
		&json!({
			"error": "Invalid format",
			"message": "Format must be one of: analytics, dto, raw",
			"received": "xml",
		})
	);
	assert!(engine.requests().is_empty());
}

#[tokio::test]
async fn rejected_query_is_a_structured_error() {
	let reply = json!({
		"error": {
			"root_cause": [{ "type": "index_not_found_exception", "reason": "no such index [nope]" }],
			"type": "index_not_found_exception",
			"reason": "no such index [nope]"
		},
		"status": 404
	});
	let engine = MockSearchEngine::start(404, reply.clone()).await.expect("Failed to start mock.");
	let server = server_for(engine.base_url());
	let result = server
		.execute_opensearch_query(params(json!({ "index": "nope" })))
		.await
		.expect("Tool call must return a result.");
	let payload = structured(&result);

	assert!(is_error(&result));
	assert_eq!(payload["error"], json!("OpenSearch query failed"));
	assert_eq!(payload["message"], json!("no such index [nope]"));
	assert_eq!(payload["status"], json!(404));
	assert_eq!(payload["details"], reply["error"]);
}

#[tokio::test]
async fn unreachable_engine_is_a_connection_error() {
	let url = shaper_testkit::unreachable_base_url().await.expect("Failed to pick a port.");
	let server = server_for(&url);
	let result = server
		.execute_opensearch_query(params(json!({})))
		.await
		.expect("Tool call must return a result.");

	assert!(is_error(&result));
	assert_eq!(structured(&result)["error"], json!("OpenSearch connection failed"));
	assert!(structured(&result)["hint"].is_string());
}

#[tokio::test]
async fn malformed_engine_body_names_the_field() {
	let engine =
		MockSearchEngine::start(200, json!({ "took": 1 })).await.expect("Failed to start mock.");
	let server = server_for(engine.base_url());
	let result = server
		.execute_opensearch_query(params(json!({ "format": "dto" })))
		.await
		.expect("Tool call must return a result.");

	assert!(is_error(&result));
	assert_eq!(structured(&result)["error"], json!("Malformed OpenSearch response"));
	assert_eq!(structured(&result)["field"], json!("hits"));
}

#[tokio::test]
async fn non_object_query_is_an_invalid_params_error() {
	let engine = MockSearchEngine::start(200, json!({})).await.expect("Failed to start mock.");
	let server = server_for(engine.base_url());
	let err = server
		.execute_opensearch_query(params(json!({ "query": [1, 2] })))
		.await
		.expect_err("Tool call must fail.");

	assert!(err.message.contains("query must be an object."), "Unexpected error: {err:?}");
	assert!(engine.requests().is_empty());
}
