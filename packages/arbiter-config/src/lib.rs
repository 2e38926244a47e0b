mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, LlmProviderConfig, Postgres, Prompt, Providers, Retrieval,
	Security, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::validation("service.http_bind must be non-empty."));
	}

	let postgres = &cfg.storage.postgres;

	if postgres.vector_dim == 0 {
		return Err(Error::validation("storage.postgres.vector_dim must be greater than zero."));
	}
	if cfg.providers.embedding.dimensions != postgres.vector_dim {
		return Err(Error::validation(
			"providers.embedding.dimensions must match storage.postgres.vector_dim.",
		));
	}
	if !is_sql_identifier(&postgres.table) {
		return Err(Error::validation(
			"storage.postgres.table must be a plain SQL identifier ([A-Za-z_][A-Za-z0-9_]*).",
		));
	}
	if postgres.pool_max_conns == 0 {
		return Err(Error::validation(
			"storage.postgres.pool_max_conns must be greater than zero.",
		));
	}
	if postgres.search_timeout_ms == 0 {
		return Err(Error::validation(
			"storage.postgres.search_timeout_ms must be greater than zero.",
		));
	}

	let retrieval = &cfg.retrieval;

	if !retrieval.match_threshold.is_finite() {
		return Err(Error::validation("retrieval.match_threshold must be a finite number."));
	}
	if !(-1.0..=1.0).contains(&retrieval.match_threshold) {
		return Err(Error::validation("retrieval.match_threshold must be in the range -1.0-1.0."));
	}
	if retrieval.match_count == 0 {
		return Err(Error::validation("retrieval.match_count must be greater than zero."));
	}
	if retrieval.max_context_chars == Some(0) {
		return Err(Error::validation("retrieval.max_context_chars must be greater than zero."));
	}

	let temperature = cfg.providers.generation.temperature;

	if !temperature.is_finite() {
		return Err(Error::validation("providers.generation.temperature must be a finite number."));
	}
	if !(0.0..=2.0).contains(&temperature) {
		return Err(Error::validation(
			"providers.generation.temperature must be in the range 0.0-2.0.",
		));
	}

	for (label, key, timeout_ms) in [
		("embedding", &cfg.providers.embedding.api_key, cfg.providers.embedding.timeout_ms),
		("generation", &cfg.providers.generation.api_key, cfg.providers.generation.timeout_ms),
	] {
		if key.trim().is_empty() {
			return Err(Error::validation(format!("Provider {label} api_key must be non-empty.")));
		}
		if timeout_ms == 0 {
			return Err(Error::validation(format!(
				"Provider {label} timeout_ms must be greater than zero."
			)));
		}
	}

	if cfg.prompt.detailed_min_words == 0 {
		return Err(Error::validation("prompt.detailed_min_words must be greater than zero."));
	}
	if cfg.prompt.short_max_sentences == 0 {
		return Err(Error::validation("prompt.short_max_sentences must be greater than zero."));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.security.api_auth_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false)
	{
		cfg.security.api_auth_token = None;
	}
}

fn is_sql_identifier(name: &str) -> bool {
	let mut chars = name.chars();

	match chars.next() {
		Some(first) if first.is_ascii_alphabetic() || first == '_' => {},
		_ => return false,
	}

	chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}
