pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures that escape the pipeline. Conditions with a defined fallback (no grounding passages,
/// malformed model output) never appear here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Configuration error: {message}")]
	Configuration { message: String },
	#[error("Provider unavailable: {message}")]
	ProviderUnavailable { message: String },
	#[error("Retrieval failed: {message}")]
	Retrieval { message: String },
	#[error("Request cancelled.")]
	Cancelled,
}
impl Error {
	/// Whether retrying the same request later may succeed.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::ProviderUnavailable { .. })
	}
}

impl From<arbiter_providers::Error> for Error {
	fn from(err: arbiter_providers::Error) -> Self {
		if err.is_configuration() {
			Self::Configuration { message: err.to_string() }
		} else {
			Self::ProviderUnavailable { message: err.to_string() }
		}
	}
}

impl From<arbiter_storage::Error> for Error {
	fn from(err: arbiter_storage::Error) -> Self {
		match err {
			arbiter_storage::Error::SchemaMismatch(message) => Self::Configuration { message },
			other => Self::Retrieval { message: other.to_string() },
		}
	}
}

impl From<arbiter_domain::QueryRejectReason> for Error {
	fn from(reason: arbiter_domain::QueryRejectReason) -> Self {
		Self::InvalidRequest { message: reason.to_string() }
	}
}
