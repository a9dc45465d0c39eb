use std::sync::Arc;
use crate::{
    config::Config,
    infrastructure::{
        document_store::DocumentStore,
        sqlite_document_store::SqliteDocumentStore,
    },
    services::idea_service::IdeaService,
};

#[derive(Clone)]
pub struct AppState {
    pub idea_service: IdeaService,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize document store
        let store = SqliteDocumentStore::connect(
            config.database.url_or_default(),
            config.database.name_or_default(),
        )
        .await?;

        Ok(Self::with_store(Arc::new(store), config))
    }

    pub fn with_store(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        Self {
            idea_service: IdeaService::new(store),
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        self.idea_service.store()
    }
}
