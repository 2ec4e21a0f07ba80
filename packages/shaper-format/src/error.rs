pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid format {received:?}. Format must be one of: analytics, dto, raw.")]
	InvalidFormat { received: String },
	#[error("Malformed search response at {field}: {message}")]
	MalformedResponse { field: String, message: String },
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
}
impl Error {
	pub(crate) fn malformed(field: &str, message: impl Into<String>) -> Self {
		Self::MalformedResponse { field: field.to_string(), message: message.into() }
	}
}
