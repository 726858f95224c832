//! Shared application state.
//!
//! One `AppState` is built at startup and cloned into every handler. All
//! fields are cheap `Arc` clones; stores and cache sit behind trait objects
//! so tests can swap in-memory implementations without touching handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cache::{cache_from_config, CachePort};
use crate::config::{self, ProviderConfig};
use crate::database::stores::Stores;
use crate::email::providers::{
    build_http_client, BulkMailVerifierClient, CatchallResolver, IcyPeasClient, ProviderError,
    TruelistClient, VerificationProvider,
};
use crate::email::VerificationOrchestrator;
use crate::services::{ChatService, CreditService, ExportService, FinderService, UsageService};

#[derive(Clone)]
pub struct AppState {
    pub stores: Stores,
    pub cache: Arc<dyn CachePort>,
    /// Probing strategies over the configured finder/verifier provider.
    pub orchestrator: Arc<VerificationOrchestrator>,
    /// Always BulkMailVerifier: the one provider whose raw payload is worth
    /// exposing on the detailed single-email endpoint.
    pub detail_verifier: Arc<BulkMailVerifierClient>,
    pub finder: Arc<FinderService>,
    pub usage: Arc<UsageService>,
    pub credits: Arc<CreditService>,
    pub exports: Arc<ExportService>,
    pub chat: Arc<ChatService>,
    /// Present when running against Postgres; health checks ping it.
    pub pool: Option<PgPool>,
}

impl AppState {
    /// Wire the full provider stack from configuration.
    pub fn from_config(stores: Stores, pool: Option<PgPool>) -> Result<Self, ProviderError> {
        let cfg = config::config();
        let client = build_http_client(cfg.providers.http_timeout_secs)?;

        let provider: Arc<dyn VerificationProvider> = match cfg.providers.verifier.as_str() {
            "bulkmailverifier" => {
                Arc::new(BulkMailVerifierClient::new(client.clone(), &cfg.providers))
            }
            _ => Arc::new(TruelistClient::new(client.clone(), &cfg.providers)),
        };

        let resolver: Option<Arc<dyn CatchallResolver>> = if icypeas_credentialed(&cfg.providers)
        {
            Some(Arc::new(IcyPeasClient::new(client.clone(), &cfg.providers)))
        } else {
            None
        };

        let orchestrator = Arc::new(VerificationOrchestrator::new(
            provider,
            resolver,
            cfg.finder.clone(),
        ));
        let detail_verifier = Arc::new(BulkMailVerifierClient::new(client, &cfg.providers));

        Self::assemble(
            stores,
            cache_from_config(&cfg.cache),
            orchestrator,
            detail_verifier,
            Arc::new(ExportService::from_config()),
            pool,
        )
    }

    /// Assemble state from pre-built parts. Tests use this to pair in-memory
    /// stores with scripted providers and a temp export directory.
    pub fn assemble(
        stores: Stores,
        cache: Arc<dyn CachePort>,
        orchestrator: Arc<VerificationOrchestrator>,
        detail_verifier: Arc<BulkMailVerifierClient>,
        exports: Arc<ExportService>,
        pool: Option<PgPool>,
    ) -> Result<Self, ProviderError> {
        let credits = Arc::new(CreditService::new(stores.clone(), cache.clone()));
        let finder = Arc::new(FinderService::new(
            stores.clone(),
            orchestrator.clone(),
            credits.clone(),
        ));
        let usage = Arc::new(UsageService::new(stores.clone()));
        let chat = Arc::new(ChatService::new()?);

        Ok(Self {
            stores,
            cache,
            orchestrator,
            detail_verifier,
            finder,
            usage,
            credits,
            exports,
            chat,
            pool,
        })
    }
}

fn icypeas_credentialed(providers: &ProviderConfig) -> bool {
    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
    present(&providers.icypeas_api_key) && present(&providers.icypeas_api_secret)
}
