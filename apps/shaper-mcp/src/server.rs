use std::{net::SocketAddr, sync::Arc};

use axum::{
	Router,
	body::Body,
	extract::State,
	http::{HeaderMap, Request, StatusCode},
	middleware::{self, Next},
	response::IntoResponse,
};
use color_eyre::Result;
use rmcp::{
	ErrorData, ServerHandler, ServiceExt,
	handler::server::router::tool::ToolRouter,
	model::{CallToolResult, JsonObject, ServerCapabilities, ServerInfo},
	transport::streamable_http_server::{
		StreamableHttpServerConfig, StreamableHttpService, session::local::LocalSessionManager,
	},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::McpAuthState;
use shaper_client::SearchClient;
use shaper_format::OutputFormat;

pub const TOOL_EXECUTE_QUERY: &str = "execute_opensearch_query";

const HEADER_AUTHORIZATION: &str = "Authorization";
const DEFAULT_FORMAT: OutputFormat = OutputFormat::Analytics;
const CONNECTION_HINT: &str = "Check OPENSEARCH_URL, OPENSEARCH_USER_NAME, and OPENSEARCH_PASSWORD or the [search] section of the config file.";

/// Tool arguments after defaults are applied. `format` stays a string so an unknown token can be
/// echoed back.
#[derive(Debug, PartialEq)]
struct QueryRequest {
	query: Value,
	index: String,
	format: String,
}
impl QueryRequest {
	fn from_params(mut params: JsonObject, default_index: &str) -> Result<Self, ErrorData> {
		let query = take_optional_object(&mut params, "query")?.unwrap_or_default();
		let index =
			take_optional_string(&mut params, "index")?.unwrap_or_else(|| default_index.to_string());
		let format = take_optional_string(&mut params, "format")?
			.unwrap_or_else(|| DEFAULT_FORMAT.as_str().to_string());

		Ok(Self { query: Value::Object(query), index, format })
	}
}

#[derive(Clone)]
pub struct ShaperMcp {
	client: SearchClient,
	default_index: String,
	tool_router: ToolRouter<Self>,
}
impl ShaperMcp {
	pub fn new(client: SearchClient, default_index: String) -> Self {
		Self { client, default_index, tool_router: Self::tool_router() }
	}
}

#[rmcp::tool_router]
impl ShaperMcp {
	#[rmcp::tool(
		name = "execute_opensearch_query",
		description = "Execute an OpenSearch query against the analytics-events index and return the result as analytics (UI-friendly event list), dto (total, grouping buckets and hit metadata) or raw (the engine response unchanged). The query is a full Query DSL body and is sent as is.",
		input_schema = execute_query_schema()
	)]
	pub async fn execute_opensearch_query(
		&self,
		params: JsonObject,
	) -> Result<CallToolResult, ErrorData> {
		let request = QueryRequest::from_params(params, &self.default_index)?;
		let Ok(format) = request.format.parse::<OutputFormat>() else {
			tracing::warn!(received = %request.format, "Rejected unknown output format.");

			return Ok(CallToolResult::structured_error(invalid_format_payload(&request.format)));
		};

		tracing::info!(index = %request.index, %format, "Executing OpenSearch query.");

		let body = match self.client.search(&request.index, &request.query).await {
			Ok(body) => body,
			Err(err) => return Ok(CallToolResult::structured_error(search_error_payload(&err))),
		};

		match shaper_format::format_json(body, format) {
			Ok(shaped) => Ok(CallToolResult::structured(shaped)),
			Err(err) => {
				tracing::warn!(error = %err, "Failed to shape OpenSearch response.");

				Ok(CallToolResult::structured_error(format_error_payload(&err)))
			},
		}
	}
}

#[rmcp::tool_handler]
impl ServerHandler for ShaperMcp {
	fn get_info(&self) -> ServerInfo {
		ServerInfo {
			instructions: Some(
				"Runs OpenSearch queries and shapes the responses into analytics, dto or raw output."
					.to_string(),
			),
			capabilities: ServerCapabilities::builder().enable_tools().build(),
			..Default::default()
		}
	}
}

/// Serves one session over stdin/stdout until the client disconnects.
pub async fn serve_stdio(client: SearchClient, default_index: String) -> Result<()> {
	let service = ShaperMcp::new(client, default_index).serve(rmcp::transport::io::stdio()).await?;

	service.waiting().await?;

	tracing::info!("MCP stdio session ended.");

	Ok(())
}

pub async fn serve_http(
	bind_addr: &str,
	auth_state: McpAuthState,
	client: SearchClient,
	default_index: String,
) -> Result<()> {
	let bind_addr: SocketAddr = bind_addr.parse()?;
	let session_manager: Arc<LocalSessionManager> = Default::default();
	let service = StreamableHttpService::new(
		move || Ok(ShaperMcp::new(client.clone(), default_index.clone())),
		session_manager,
		StreamableHttpServerConfig::default(),
	);
	let router = Router::new()
		.fallback_service(service)
		.layer(middleware::from_fn_with_state(auth_state, mcp_auth_middleware));
	let listener = TcpListener::bind(bind_addr).await?;

	axum::serve(listener, router).await?;

	Ok(())
}

fn invalid_format_payload(received: &str) -> Value {
	json!({
		"error": "Invalid format",
		"message": "Format must be one of: analytics, dto, raw",
		"received": received,
	})
}

fn search_error_payload(err: &shaper_client::Error) -> Value {
	match err {
		shaper_client::Error::QueryRejected { status, reason, details } => json!({
			"error": "OpenSearch query failed",
			"message": reason,
			"details": details,
			"status": status,
		}),
		shaper_client::Error::Connection { message } => json!({
			"error": "OpenSearch connection failed",
			"message": message,
			"hint": CONNECTION_HINT,
		}),
		shaper_client::Error::InvalidResponse { message } => json!({
			"error": "Malformed OpenSearch response",
			"field": "response",
			"message": message,
		}),
		other => json!({
			"error": "OpenSearch query failed",
			"message": other.to_string(),
		}),
	}
}

fn format_error_payload(err: &shaper_format::Error) -> Value {
	match err {
		shaper_format::Error::MalformedResponse { field, message } => json!({
			"error": "Malformed OpenSearch response",
			"field": field,
			"message": message,
		}),
		other => json!({
			"error": "Response formatting failed",
			"message": other.to_string(),
		}),
	}
}

fn take_optional_string(params: &mut JsonObject, key: &str) -> Result<Option<String>, ErrorData> {
	let Some(value) = params.remove(key).filter(|value| !value.is_null()) else { return Ok(None) };
	let text = value
		.as_str()
		.ok_or_else(|| ErrorData::invalid_params(format!("{key} must be a string."), None))?
		.trim();

	if text.is_empty() {
		return Err(ErrorData::invalid_params(format!("{key} must be non-empty."), None));
	}

	Ok(Some(text.to_string()))
}

fn take_optional_object(
	params: &mut JsonObject,
	key: &str,
) -> Result<Option<JsonObject>, ErrorData> {
	match params.remove(key) {
		None | Some(Value::Null) => Ok(None),
		Some(Value::Object(object)) => Ok(Some(object)),
		Some(_) => Err(ErrorData::invalid_params(format!("{key} must be an object."), None)),
	}
}

fn execute_query_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": [],
		"properties": {
			"query": {
				"type": "object",
				"description": "OpenSearch Query DSL object (full query body).",
				"default": {}
			},
			"index": {
				"type": "string",
				"description": "Index name to query. Defaults to the configured search.default_index."
			},
			"format": {
				"type": "string",
				"enum": ["analytics", "dto", "raw"],
				"description": "Response format: analytics (UI-friendly), dto (with metadata), or raw (OpenSearch response).",
				"default": "analytics"
			}
		}
	}))
}

fn is_authorized(headers: &HeaderMap, auth_state: &McpAuthState) -> bool {
	match auth_state {
		McpAuthState::Off => true,
		McpAuthState::Bearer { token } =>
			read_bearer_token(headers).is_some_and(|candidate| candidate == token),
	}
}

fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
	let raw = headers.get(HEADER_AUTHORIZATION)?;
	let value = raw.to_str().ok()?.trim();
	let token = value.strip_prefix("Bearer ")?.trim();

	if token.is_empty() { None } else { Some(token) }
}

async fn mcp_auth_middleware(
	State(auth_state): State<McpAuthState>,
	req: Request<Body>,
	next: Next,
) -> axum::response::Response {
	if !is_authorized(req.headers(), &auth_state) {
		return (
			StatusCode::UNAUTHORIZED,
			"Authentication required: send service.mcp_auth_token as a Bearer token.",
		)
			.into_response();
	}

	next.run(req).await
}

#[cfg(test)]
mod tests {
	use axum::http::HeaderMap;
	use serde_json::{Value, json};

	use crate::{
		McpAuthState,
		server::{self, QueryRequest},
	};

	fn params(value: Value) -> rmcp::model::JsonObject {
		value.as_object().cloned().expect("params must be an object")
	}

	#[test]
	fn registers_the_query_tool() {
		let tools = server::ShaperMcp::tool_router().list_all();
		let names: Vec<&str> = tools.iter().map(|tool| tool.name.as_ref()).collect();

		assert_eq!(names, vec![server::TOOL_EXECUTE_QUERY], "Unexpected MCP tool registration.");
	}

	#[test]
	fn schema_lists_known_formats_and_requires_nothing() {
		let schema = server::execute_query_schema();

		assert_eq!(schema["properties"]["format"]["enum"], json!(["analytics", "dto", "raw"]));
		assert_eq!(schema["properties"]["format"]["default"], json!("analytics"));
		assert_eq!(schema["required"], json!([]));
	}

	#[test]
	fn empty_params_use_defaults() {
		let request =
			QueryRequest::from_params(params(json!({})), "analytics-events").expect("request");

		assert_eq!(
			request,
			QueryRequest {
				query: json!({}),
				index: "analytics-events".to_string(),
				format: "analytics".to_string(),
			}
		);
	}

	#[test]
	fn null_params_fall_back_to_defaults() {
		let request = QueryRequest::from_params(
			params(json!({ "query": null, "index": null, "format": null })),
			"analytics-events",
		)
		.expect("request");

		assert_eq!(request.index, "analytics-events");
		assert_eq!(request.format, "analytics");
	}

	#[test]
	fn unknown_format_is_kept_for_reporting() {
		let request =
			QueryRequest::from_params(params(json!({ "format": "xml" })), "analytics-events")
				.expect("request");

		assert_eq!(request.format, "xml");
	}

	#[test]
	fn non_object_query_is_invalid_params() {
		let err = QueryRequest::from_params(params(json!({ "query": "match_all" })), "i")
			.expect_err("expected invalid params");

		assert!(err.message.contains("query must be an object."), "unexpected error: {err:?}");
	}

	#[test]
	fn non_string_index_is_invalid_params() {
		let err = QueryRequest::from_params(params(json!({ "index": 7 })), "i")
			.expect_err("expected invalid params");

		assert!(err.message.contains("index must be a string."), "unexpected error: {err:?}");
	}

	#[test]
	fn rejected_query_payload_carries_status_and_details() {
		let err = shaper_client::Error::QueryRejected {
			status: 404,
			reason: "no such index [missing]".to_string(),
			details: json!({ "type": "index_not_found_exception" }),
		};

		assert_eq!(
			server::search_error_payload(&err),
			json!({
				"error": "OpenSearch query failed",
				"message": "no such index [missing]",
				"details": { "type": "index_not_found_exception" },
				"status": 404,
			})
		);
	}

	#[test]
	fn connection_payload_names_settings_to_check() {
		let err = shaper_client::Error::Connection { message: "connection refused".to_string() };
		let payload = server::search_error_payload(&err);

		assert_eq!(payload["error"], json!("OpenSearch connection failed"));
		assert!(
			payload["hint"].as_str().is_some_and(|hint| hint.contains("OPENSEARCH_URL")),
			"unexpected payload: {payload}"
		);
	}

	#[test]
	fn malformed_response_payload_names_the_field() {
		let err = shaper_format::Error::MalformedResponse {
			field: "hits.total".to_string(),
			message: "missing".to_string(),
		};

		assert_eq!(
			server::format_error_payload(&err),
			json!({
				"error": "Malformed OpenSearch response",
				"field": "hits.total",
				"message": "missing",
			})
		);
	}

	#[test]
	fn off_mode_allows_requests_without_auth_header() {
		assert!(server::is_authorized(&HeaderMap::new(), &McpAuthState::Off));
	}

	#[test]
	fn bearer_mode_requires_matching_token() {
		let auth_state = McpAuthState::Bearer { token: "token-a".to_string() };
		let mut headers = HeaderMap::new();

		assert!(!server::is_authorized(&headers, &auth_state));

		headers.insert(server::HEADER_AUTHORIZATION, "Bearer token-b".parse().expect("valid header"));

		assert!(!server::is_authorized(&headers, &auth_state));

		headers.insert(server::HEADER_AUTHORIZATION, "Bearer token-a".parse().expect("valid header"));

		assert!(server::is_authorized(&headers, &auth_state));
	}

	#[test]
	fn bearer_mode_rejects_non_bearer_schemes() {
		let mut headers = HeaderMap::new();

		headers.insert(server::HEADER_AUTHORIZATION, "bearer token-a".parse().expect("valid header"));

		assert!(!server::is_authorized(
			&headers,
			&McpAuthState::Bearer { token: "token-a".to_string() }
		));
	}
}
