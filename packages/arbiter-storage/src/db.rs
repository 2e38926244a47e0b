use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Error, Result, schema};

pub struct Db {
	pub pool: PgPool,
	pub table: String,
}
impl Db {
	pub async fn connect(cfg: &arbiter_config::Postgres) -> Result<Self> {
		let pool = PgPoolOptions::new()
			.max_connections(cfg.pool_max_conns)
			.acquire_timeout(Duration::from_millis(cfg.search_timeout_ms))
			.connect(&cfg.dsn)
			.await?;

		Ok(Self { pool, table: cfg.table.clone() })
	}

	/// Creates the corpus table and its indexes when absent. Used by ingestion tooling and tests;
	/// the query pipeline itself never writes to the corpus.
	pub async fn ensure_schema(&self, vector_dim: u32) -> Result<()> {
		let sql = schema::render_schema(&self.table, vector_dim);
		let lock_id: i64 = 4_180_227;
		// Advisory locks are held per connection. Use a single transaction so the lock is scoped to
		// one connection and automatically released when the transaction ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in schema::statements(&sql) {
			sqlx::query(&statement).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}

	/// Fails unless the corpus embedding column is declared as `vector(<vector_dim>)`.
	pub async fn verify_vector_dim(&self, vector_dim: u32) -> Result<()> {
		let declared: Option<String> = sqlx::query_scalar(
			"\
SELECT format_type(a.atttypid, a.atttypmod)
FROM pg_attribute a
WHERE a.attrelid = to_regclass($1)
	AND a.attname = 'embedding'
	AND NOT a.attisdropped",
		)
		.bind(self.table.as_str())
		.fetch_optional(&self.pool)
		.await?;
		let Some(declared) = declared else {
			return Err(Error::NotFound(format!(
				"Corpus table {} has no embedding column.",
				self.table
			)));
		};
		let expected = format!("vector({vector_dim})");

		if declared != expected {
			return Err(Error::SchemaMismatch(format!(
				"Corpus column {}.embedding is {declared}, expected {expected}.",
				self.table
			)));
		}

		Ok(())
	}
}
