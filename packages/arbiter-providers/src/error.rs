pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
impl Error {
	/// Whether the failure is a property of the deployment rather than of the remote backend.
	pub fn is_configuration(&self) -> bool {
		matches!(
			self,
			Self::InvalidConfig { .. } | Self::InvalidHeaderName(_) | Self::InvalidHeaderValue(_)
		)
	}

	pub(crate) fn invalid_response(message: impl Into<String>) -> Self {
		Self::InvalidResponse { message: message.into() }
	}

	/// Prefixes message-carrying variants with the configured provider id.
	pub(crate) fn for_provider(self, provider_id: &str) -> Self {
		match self {
			Self::InvalidConfig { message } =>
				Self::InvalidConfig { message: format!("{provider_id}: {message}") },
			Self::InvalidResponse { message } =>
				Self::InvalidResponse { message: format!("{provider_id}: {message}") },
			other => other,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn provider_id_prefixes_response_errors() {
		let err = Error::invalid_response("Embedding response is missing data array.")
			.for_provider("openai-small");

		assert!(matches!(err, Error::InvalidResponse { .. }));
		assert_eq!(err.to_string(), "openai-small: Embedding response is missing data array.");
	}

	#[test]
	fn configuration_class_survives_provider_prefix() {
		let err = Error::InvalidConfig { message: "api_key is empty.".to_string() }
			.for_provider("local-llm");

		assert!(err.is_configuration());
		assert_eq!(err.to_string(), "local-llm: api_key is empty.");
	}
}
