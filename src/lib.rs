pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod quiz;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use sqlx::PgPool;

use crate::quiz::registry::ActiveSessions;
use crate::quiz::store::{PgPracticeStore, PracticeStore};
use crate::services::{
    access_service::AccessService, catalog_service::CatalogService,
    progress_service::ProgressService, question_bank_service::QuestionBankService,
    session_service::SessionService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub catalog_service: CatalogService,
    pub access_service: AccessService,
    pub session_service: SessionService,
    pub progress_service: ProgressService,
    pub question_bank: QuestionBankService,
    pub store: Arc<PgPracticeStore>,
    pub sessions: ActiveSessions,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let catalog_service = CatalogService::new(pool.clone());
        let access_service = AccessService::new(pool.clone());
        let session_service = SessionService::new(pool.clone());
        let progress_service = ProgressService::new(pool.clone());
        let question_bank = QuestionBankService::new(config.question_bank_url.clone());
        let store = Arc::new(PgPracticeStore::new(pool.clone()));

        Self {
            pool,
            catalog_service,
            access_service,
            session_service,
            progress_service,
            question_bank,
            store,
            sessions: ActiveSessions::new(),
        }
    }

    pub fn practice_store(&self) -> Arc<dyn PracticeStore> {
        self.store.clone()
    }
}
