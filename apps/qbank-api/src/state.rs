use std::sync::Arc;

use qbank_service::QbankService;
use qbank_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<QbankService>,
}
impl AppState {
	pub async fn new(config: qbank_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = QbankService::new(config, db);

		Ok(Self { service: Arc::new(service) })
	}
}
