use uuid::Uuid;

use crate::{
	Error, Result,
	db::Db,
	models::{MatchedChunk, NewChunk},
};

/// Returns passages whose cosine similarity to `query_vector` is strictly greater than
/// `threshold`, most similar first, at most `limit` rows.
///
/// Equal similarities resolve by insertion time, then id, so a fixed table state and a fixed
/// vector always yield the same ordered rows.
pub async fn match_chunks(
	db: &Db,
	query_vector: &[f32],
	threshold: f32,
	limit: u32,
) -> Result<Vec<MatchedChunk>> {
	if query_vector.is_empty() {
		return Err(Error::InvalidArgument("Query vector must be non-empty.".to_string()));
	}

	let sql = format!(
		"\
SELECT
	id,
	content,
	metadata,
	created_at,
	(1 - (embedding <=> $1::text::vector))::real AS similarity
FROM {table}
WHERE 1 - (embedding <=> $1::text::vector) > $2
ORDER BY embedding <=> $1::text::vector ASC, created_at ASC, id ASC
LIMIT $3",
		table = db.table
	);
	let rows = sqlx::query_as::<_, MatchedChunk>(&sql)
		.bind(vector_to_pg(query_vector))
		.bind(f64::from(threshold))
		.bind(i64::from(limit))
		.fetch_all(&db.pool)
		.await?;

	Ok(rows)
}

/// Writes one passage. Only the ingestion collaborator and tests call this.
pub async fn insert_chunk(db: &Db, chunk: &NewChunk) -> Result<Uuid> {
	let sql = format!(
		"\
INSERT INTO {table} (content, metadata, embedding)
VALUES ($1, $2, $3::text::vector)
RETURNING id",
		table = db.table
	);
	let id = sqlx::query_scalar::<_, Uuid>(&sql)
		.bind(chunk.content.as_str())
		.bind(&chunk.metadata)
		.bind(vector_to_pg(&chunk.embedding))
		.fetch_one(&db.pool)
		.await?;

	Ok(id)
}

pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

#[cfg(test)]
mod tests {
	use super::vector_to_pg;

	#[test]
	fn renders_pgvector_literal() {
		assert_eq!(vector_to_pg(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
		assert_eq!(vector_to_pg(&[]), "[]");
	}
}
