use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Sends one user turn to an OpenAI-compatible chat completions endpoint and returns the raw
/// assistant text. The text is not parsed here; structure recovery belongs to the caller.
///
/// There is no retry loop. A failed or timed-out call is reported once.
pub async fn complete(
	client: &Client,
	cfg: &arbiter_config::LlmProviderConfig,
	prompt: &str,
) -> Result<String> {
	let url = crate::endpoint(&cfg.api_base, &cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": [
			{ "role": "user", "content": prompt },
		],
	});
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)
		.map_err(|err| err.for_provider(&cfg.provider_id))?;
	let res = client
		.post(url)
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.headers(headers)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_completion_text(&json).map_err(|err| err.for_provider(&cfg.provider_id))
}

fn parse_completion_text(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.ok_or_else(|| Error::invalid_response("Completion response is missing message content."))?;

	match content {
		Value::String(text) => Ok(text.clone()),
		// Some gateways return content as a list of typed parts.
		Value::Array(parts) => {
			let text = parts
				.iter()
				.filter_map(|part| part.get("text").and_then(|t| t.as_str()))
				.collect::<Vec<_>>()
				.join("");

			if text.is_empty() {
				return Err(Error::invalid_response("Completion content parts carry no text."));
			}

			Ok(text)
		},
		_ => Err(Error::invalid_response("Completion content must be text.")),
	}
}
