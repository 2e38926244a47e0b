pub mod adapter;
pub mod context;
pub mod decide;
pub mod prompt;
pub mod repair;
pub mod retrieval;

mod error;

pub use adapter::{CanonicalField, adapt, align_recommendation};
pub use context::{AssembledContext, CONTEXT_SEPARATOR, assemble_context};
pub use decide::{DecideRequest, DecisionResult};
pub use error::{Error, Result};
pub use prompt::build_prompt;
pub use repair::{RepairOutcome, RepairStage, repair};
pub use retrieval::{RetrievedCandidate, rank_candidates};

use std::{future::Future, pin::Pin, sync::Arc};

use reqwest::Client;

use arbiter_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use arbiter_providers::{embedding, generation};
use arbiter_storage::{corpus, db::Db};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, arbiter_providers::Result<Vec<Vec<f32>>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, arbiter_providers::Result<String>>;
}

/// Read-only similarity search over the corpus owned by the ingestion collaborator.
pub trait CorpusSearch
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		query_vector: &'a [f32],
		threshold: f32,
		limit: u32,
	) -> BoxFuture<'a, arbiter_storage::Result<Vec<RetrievedCandidate>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, generation }
	}

	/// HTTP-backed providers sharing one pooled client.
	pub fn http() -> Result<Self> {
		let provider = Arc::new(HttpProviders { client: arbiter_providers::http_client()? });

		Ok(Self { embedding: provider.clone(), generation: provider })
	}
}

/// The decision pipeline. Built once at startup and shared by reference across requests; it holds
/// no per-request state.
pub struct ArbiterService {
	pub cfg: Config,
	pub corpus: Arc<dyn CorpusSearch>,
	pub providers: Providers,
}
impl ArbiterService {
	pub fn new(cfg: Config, db: Db) -> Result<Self> {
		Ok(Self { cfg, corpus: Arc::new(db), providers: Providers::http()? })
	}

	pub fn with_providers(cfg: Config, corpus: Arc<dyn CorpusSearch>, providers: Providers) -> Self {
		Self { cfg, corpus, providers }
	}
}

struct HttpProviders {
	client: Client,
}
impl EmbeddingProvider for HttpProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, arbiter_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(&self.client, cfg, texts))
	}
}
impl GenerationProvider for HttpProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, arbiter_providers::Result<String>> {
		Box::pin(generation::complete(&self.client, cfg, prompt))
	}
}

impl CorpusSearch for Db {
	fn search<'a>(
		&'a self,
		query_vector: &'a [f32],
		threshold: f32,
		limit: u32,
	) -> BoxFuture<'a, arbiter_storage::Result<Vec<RetrievedCandidate>>> {
		Box::pin(async move {
			let rows = corpus::match_chunks(self, query_vector, threshold, limit).await?;

			Ok(rows.into_iter().map(RetrievedCandidate::from).collect())
		})
	}
}
