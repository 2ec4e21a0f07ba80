use serde_json::Value;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	/// The engine could not be reached or did not answer in time.
	#[error("OpenSearch connection failed: {message}")]
	Connection { message: String },
	/// The engine answered with a non-success status. `details` is the engine's own error object.
	#[error("OpenSearch rejected the request with status {status}: {reason}")]
	QueryRejected { status: u16, reason: String, details: Value },
	#[error("Invalid OpenSearch response: {message}")]
	InvalidResponse { message: String },
}
impl Error {
	pub fn is_connection(&self) -> bool {
		matches!(self, Self::Connection { .. })
	}
}
