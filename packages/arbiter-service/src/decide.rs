use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use arbiter_domain::sanitize_query;

use crate::{
	ArbiterService, Error, Result, adapter, context, prompt,
	repair::{self, RepairOutcome},
	retrieval::rank_candidates,
};

pub const NO_GROUNDING_RECOMMENDATION: &str = "Unable to analyze.";
pub const NO_GROUNDING_SHORT_REASON: &str =
	"No passages in the knowledge base were relevant enough to ground a recommendation.";
pub const NO_GROUNDING_DETAILED_REASONING: &str = "The question was compared against the knowledge base, but no passage cleared the relevance threshold. Rephrase the problem or add material covering this topic, then ask again.";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DecideRequest {
	pub problem: String,
	pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DecisionResult {
	pub recommendation: String,
	pub short_reason: String,
	pub detailed_reasoning: String,
}
impl DecisionResult {
	/// Fixed answer returned when retrieval finds nothing to ground on.
	pub fn no_grounding() -> Self {
		Self {
			recommendation: NO_GROUNDING_RECOMMENDATION.to_string(),
			short_reason: NO_GROUNDING_SHORT_REASON.to_string(),
			detailed_reasoning: NO_GROUNDING_DETAILED_REASONING.to_string(),
		}
	}
}

#[derive(Debug, Clone, Copy)]
enum Stage {
	Embedding,
	Search,
	Generation,
}
impl Stage {
	fn as_str(self) -> &'static str {
		match self {
			Self::Embedding => "embedding",
			Self::Search => "search",
			Self::Generation => "generation",
		}
	}

	/// Every external dependency that fails to answer in time is reported as unavailable.
	fn timed_out(self, origin: &str, timeout: Duration) -> Error {
		Error::ProviderUnavailable {
			message: format!(
				"{} ({origin}) timed out after {} ms.",
				self.as_str(),
				timeout.as_millis()
			),
		}
	}
}

impl ArbiterService {
	/// Runs one request through embed, search, assemble, prompt, generate, repair and adapt.
	///
	/// Stages run strictly in sequence. Each external call has its own timeout and stops early
	/// once `cancel` fires.
	pub async fn decide(
		&self,
		req: DecideRequest,
		cancel: &CancellationToken,
	) -> Result<DecisionResult> {
		let query = sanitize_query(&req.problem, &req.options)?;
		let embedding_cfg = &self.cfg.providers.embedding;
		let texts = vec![query.problem.clone()];
		let mut vectors = run_stage(
			cancel,
			Stage::Embedding,
			&embedding_cfg.provider_id,
			Duration::from_millis(embedding_cfg.timeout_ms),
			self.providers.embedding.embed(embedding_cfg, &texts),
		)
		.await?;

		if vectors.len() != 1 {
			return Err(Error::ProviderUnavailable {
				message: format!(
					"Embedding provider {} returned {} vectors for 1 input.",
					embedding_cfg.provider_id,
					vectors.len()
				),
			});
		}

		let query_vector = vectors.remove(0);
		let expected_dim = self.cfg.storage.postgres.vector_dim as usize;

		if query_vector.len() != expected_dim {
			tracing::error!(
				provider_id = %embedding_cfg.provider_id,
				expected = expected_dim,
				actual = query_vector.len(),
				"Embedding dimension does not match the corpus."
			);

			return Err(Error::Configuration {
				message: format!(
					"Embedding dimension {} does not match configured vector_dim {expected_dim}.",
					query_vector.len()
				),
			});
		}

		let retrieval_cfg = &self.cfg.retrieval;
		let candidates = run_stage(
			cancel,
			Stage::Search,
			&self.cfg.storage.postgres.table,
			Duration::from_millis(self.cfg.storage.postgres.search_timeout_ms),
			self.corpus.search(
				&query_vector,
				retrieval_cfg.match_threshold,
				retrieval_cfg.match_count,
			),
		)
		.await?;
		let candidates =
			rank_candidates(candidates, retrieval_cfg.match_threshold, retrieval_cfg.match_count);
		let Some(top) = candidates.first() else {
			tracing::info!(
				threshold = retrieval_cfg.match_threshold,
				"No passage cleared the threshold; returning the no-grounding result."
			);

			return Ok(DecisionResult::no_grounding());
		};

		tracing::info!(
			candidates = candidates.len(),
			top_similarity = top.similarity,
			"Retrieved grounding passages."
		);

		let assembled = context::assemble_context(&candidates, retrieval_cfg.max_context_chars);

		if assembled.dropped > 0 {
			tracing::debug!(
				used = assembled.used,
				dropped = assembled.dropped,
				"Context cap dropped passages."
			);
		}

		let prompt = prompt::build_prompt(&query, &assembled.text, &self.cfg.prompt);
		let generation_cfg = &self.cfg.providers.generation;
		let raw = run_stage(
			cancel,
			Stage::Generation,
			&generation_cfg.provider_id,
			Duration::from_millis(generation_cfg.timeout_ms),
			self.providers.generation.complete(generation_cfg, &prompt),
		)
		.await?;
		let result = match repair::repair(&raw) {
			RepairOutcome::Parsed { fields, .. } =>
				adapter::align_recommendation(adapter::adapt(&fields), &query.options),
			RepairOutcome::Failed { raw } => DecisionResult::degraded(raw),
		};

		Ok(result)
	}
}

/// `origin` names the provider or table behind the stage and is carried into logs and timeout
/// errors.
async fn run_stage<F, T, E>(
	cancel: &CancellationToken,
	stage: Stage,
	origin: &str,
	timeout: Duration,
	fut: F,
) -> Result<T>
where
	F: Future<Output = std::result::Result<T, E>>,
	Error: From<E>,
{
	let result = tokio::select! {
		biased;
		_ = cancel.cancelled() => Err(Error::Cancelled),
		outcome = tokio::time::timeout(timeout, fut) => match outcome {
			Ok(result) => result.map_err(Error::from),
			Err(_) => Err(stage.timed_out(origin, timeout)),
		},
	};

	match &result {
		Err(Error::Cancelled) => {
			tracing::info!(stage = stage.as_str(), origin, "Request cancelled.");
		},
		Err(err) => {
			tracing::error!(stage = stage.as_str(), origin, error = %err, "Pipeline stage failed.");
		},
		Ok(_) => {},
	}

	result
}
