use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

/// A corpus passage as returned by a similarity search. The embedding itself is not read back.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchedChunk {
	pub id: Uuid,
	pub content: String,
	pub metadata: Value,
	pub created_at: OffsetDateTime,
	/// `1 - cosine_distance`, in [-1, 1].
	pub similarity: f32,
}

/// A passage as written by the ingestion collaborator.
#[derive(Debug, Clone)]
pub struct NewChunk {
	pub content: String,
	pub metadata: Value,
	pub embedding: Vec<f32>,
}
