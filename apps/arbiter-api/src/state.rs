use std::sync::Arc;

use arbiter_service::ArbiterService;
use arbiter_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ArbiterService>,
}
impl AppState {
	/// Connects to the corpus and refuses to start when its vector column disagrees with the config.
	pub async fn new(config: arbiter_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.verify_vector_dim(config.storage.postgres.vector_dim).await?;

		let service = ArbiterService::new(config, db)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: ArbiterService) -> Self {
		Self { service: Arc::new(service) }
	}

	pub(crate) fn auth_token(&self) -> Option<&str> {
		self.service.cfg.security.api_auth_token.as_deref()
	}
}
