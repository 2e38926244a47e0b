use serde_json::Value;
use uuid::Uuid;

use arbiter_storage::models::MatchedChunk;

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedCandidate {
	pub id: Uuid,
	pub content: String,
	pub metadata: Value,
	/// Cosine similarity to the query vector, in [-1, 1].
	pub similarity: f32,
}
impl From<MatchedChunk> for RetrievedCandidate {
	fn from(row: MatchedChunk) -> Self {
		Self { id: row.id, content: row.content, metadata: row.metadata, similarity: row.similarity }
	}
}

/// Enforces the retrieval contract on whatever the store returned: strictly above `threshold`,
/// similarity non-increasing, at most `limit` entries.
///
/// The sort is stable, so equal similarities keep the store's order (insertion order for the
/// Postgres corpus).
pub fn rank_candidates(
	mut candidates: Vec<RetrievedCandidate>,
	threshold: f32,
	limit: u32,
) -> Vec<RetrievedCandidate> {
	candidates.retain(|candidate| candidate.similarity.is_finite() && candidate.similarity > threshold);
	candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
	candidates.truncate(limit as usize);

	candidates
}
