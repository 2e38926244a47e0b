mod error;

pub use error::{Error, Result};

use std::{env, str::FromStr};

use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use uuid::Uuid;

const DSN_VAR: &str = "ARBITER_PG_DSN";
const MAINTENANCE_DB: &str = "postgres";

/// Scratch database on the server named by `ARBITER_PG_DSN`.
///
/// Tests end with [`TestDatabase::cleanup`]. A database left behind by a failed test is named on
/// stderr so it can be dropped by hand.
pub struct TestDatabase {
	name: String,
	dsn: String,
	maintenance: PgConnectOptions,
	dropped: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| Error::Message(format!("Invalid {DSN_VAR}: {err}.")))?;
		let maintenance = base.clone().database(MAINTENANCE_DB);
		let name = format!("arbiter_test_{}", Uuid::new_v4().simple());

		run_on(&maintenance, &format!(r#"CREATE DATABASE "{name}""#)).await?;

		let dsn = base.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, maintenance, dropped: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub async fn cleanup(mut self) -> Result<()> {
		run_on(&self.maintenance, &format!(r#"DROP DATABASE IF EXISTS "{}" WITH (FORCE)"#, self.name))
			.await?;

		self.dropped = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if !self.dropped {
			eprintln!("Test database {} was left behind; drop it manually.", self.name);
		}
	}
}

/// Base DSN for database-backed tests, if one is configured.
pub fn env_dsn() -> Option<String> {
	env::var(DSN_VAR).ok().filter(|dsn| !dsn.trim().is_empty())
}

/// Unit vector of length `dim` whose cosine similarity with the first basis vector is `cosine`.
///
/// Seeding chunks with these lets a test pin exact similarities against a query of
/// `basis_vector(dim)`.
pub fn vector_with_similarity(dim: usize, cosine: f32) -> Vec<f32> {
	assert!(dim >= 2, "Need at least two dimensions to place a vector at a given angle.");

	let cosine = cosine.clamp(-1.0, 1.0);
	let mut vec = vec![0.0; dim];

	vec[0] = cosine;
	vec[1] = (1.0 - cosine * cosine).max(0.0).sqrt();

	vec
}

pub fn basis_vector(dim: usize) -> Vec<f32> {
	let mut vec = vec![0.0; dim];

	if let Some(first) = vec.first_mut() {
		*first = 1.0;
	}

	vec
}

// Database DDL cannot run inside a transaction, so each statement gets its own connection.
async fn run_on(options: &PgConnectOptions, sql: &str) -> Result<()> {
	let mut conn = PgConnection::connect_with(options).await?;

	conn.execute(sql).await?;
	conn.close().await?;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn seeded_vectors_have_requested_cosine() {
		let query = basis_vector(4);

		for cosine in [0.8_f32, 0.1, -0.5] {
			let vec = vector_with_similarity(4, cosine);
			let dot: f32 = query.iter().zip(&vec).map(|(a, b)| a * b).sum();
			let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();

			assert!((dot / norm - cosine).abs() < 1e-5);
		}
	}
}
