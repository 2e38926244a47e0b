use serde_json::json;

use arbiter_config::Postgres;
use arbiter_storage::{
	Error,
	corpus::{self, match_chunks},
	db::Db,
	models::NewChunk,
};
use arbiter_testkit::{TestDatabase, basis_vector, vector_with_similarity};

const DIM: u32 = 8;

fn postgres_cfg(dsn: &str) -> Postgres {
	Postgres {
		dsn: dsn.to_string(),
		pool_max_conns: 2,
		table: "corpus_chunks".to_string(),
		vector_dim: DIM,
		search_timeout_ms: 5_000,
	}
}

async fn seeded_db(test_db: &TestDatabase, similarities: &[(&str, f32)]) -> Db {
	let db = Db::connect(&postgres_cfg(test_db.dsn())).await.expect("Failed to connect.");

	db.ensure_schema(DIM).await.expect("Failed to ensure schema.");

	for (content, similarity) in similarities {
		let chunk = NewChunk {
			content: content.to_string(),
			metadata: json!({ "source": "test" }),
			embedding: vector_with_similarity(DIM as usize, *similarity),
		};

		corpus::insert_chunk(&db, &chunk).await.expect("Failed to insert chunk.");
	}

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set ARBITER_PG_DSN to run."]
async fn matches_above_threshold_in_descending_similarity() {
	let Some(base_dsn) = arbiter_testkit::env_dsn() else {
		eprintln!("Skipping corpus search test; set ARBITER_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = seeded_db(&test_db, &[("low", 0.2), ("high", 0.9), ("below", 0.05), ("mid", 0.5)])
		.await;
	let rows = match_chunks(&db, &basis_vector(DIM as usize), 0.1, 10)
		.await
		.expect("Search failed.");
	let contents = rows.iter().map(|row| row.content.as_str()).collect::<Vec<_>>();

	assert_eq!(contents, vec!["high", "mid", "low"]);
	assert!(rows.windows(2).all(|pair| pair[0].similarity >= pair[1].similarity));
	assert!((rows[0].similarity - 0.9).abs() < 1e-3);

	let top = match_chunks(&db, &basis_vector(DIM as usize), 0.1, 2).await.expect("Search failed.");

	assert_eq!(top.len(), 2);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set ARBITER_PG_DSN to run."]
async fn ties_resolve_in_insertion_order() {
	let Some(base_dsn) = arbiter_testkit::env_dsn() else {
		eprintln!("Skipping corpus tie test; set ARBITER_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = seeded_db(&test_db, &[("first", 0.7), ("second", 0.7), ("third", 0.7)]).await;
	let rows = match_chunks(&db, &basis_vector(DIM as usize), 0.1, 10)
		.await
		.expect("Search failed.");
	let contents = rows.iter().map(|row| row.content.as_str()).collect::<Vec<_>>();

	assert_eq!(contents, vec!["first", "second", "third"]);

	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres with pgvector. Set ARBITER_PG_DSN to run."]
async fn empty_corpus_yields_no_rows_and_dimension_is_verified() {
	let Some(base_dsn) = arbiter_testkit::env_dsn() else {
		eprintln!("Skipping empty corpus test; set ARBITER_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = seeded_db(&test_db, &[]).await;
	let rows = match_chunks(&db, &basis_vector(DIM as usize), 0.1, 5)
		.await
		.expect("Search failed.");

	assert!(rows.is_empty());

	db.verify_vector_dim(DIM).await.expect("Declared dimension must match.");

	let err = db.verify_vector_dim(DIM * 2).await.expect_err("Mismatch must be reported.");

	assert!(matches!(err, Error::SchemaMismatch(_)), "Unexpected error: {err:?}");

	test_db.cleanup().await.expect("Failed to clean up test database.");
}
