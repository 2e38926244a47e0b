use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub retrieval: Retrieval,
	#[serde(default)]
	pub prompt: Prompt,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	/// Corpus table written by the ingestion collaborator.
	#[serde(default = "default_corpus_table")]
	pub table: String,
	/// Dimension of the `vector(N)` column. Must match `providers.embedding.dimensions`.
	pub vector_dim: u32,
	#[serde(default = "default_search_timeout_ms")]
	pub search_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub generation: LlmProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Retrieval {
	/// Candidates must score strictly above this cosine similarity.
	pub match_threshold: f32,
	pub match_count: u32,
	/// Optional. Lowest-similarity passages are dropped first when the joined context is longer.
	pub max_context_chars: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Prompt {
	pub detailed_min_words: u32,
	pub short_max_sentences: u32,
}
impl Default for Prompt {
	fn default() -> Self {
		Self { detailed_min_words: 150, short_max_sentences: 2 }
	}
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
	pub api_auth_token: Option<String>,
}

fn default_corpus_table() -> String {
	"corpus_chunks".to_string()
}

fn default_search_timeout_ms() -> u64 {
	5_000
}
