//! Service wiring: stores, ledger, notifier, chat router and the
//! notification worker, assembled from [`AppConfig`].

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::Mutex;
use tracing::{info, warn};

use storefront_infra::catalog_store::{CatalogStore, InMemoryCatalogStore, PostgresCatalogStore};
use storefront_infra::chat::{ChatCollaborators, ChatRouter};
use storefront_infra::config::AppConfig;
use storefront_infra::conversation_store::{
    ConversationStore, InMemoryConversationStore, PostgresConversationStore,
};
use storefront_infra::link_fetcher::{HttpLinkFetcher, InMemoryLinkFetcher, LinkFetcher};
use storefront_infra::media::{
    BlobStore, InMemoryBlobStore, InMemoryMediaSource, MediaSource, SupabaseBlobStore,
    WhatsAppMediaSource,
};
use storefront_infra::messaging::{InMemoryGateway, MessagingGateway, WhatsAppCloudGateway};
use storefront_infra::notifier::OrderNotifier;
use storefront_infra::order_store::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
use storefront_infra::phone_check::PhoneValidator;
use storefront_infra::rate_limit::RateLimiter;
use storefront_infra::workers::{NotificationWorker, WorkerHandle};
use storefront_infra::{InventoryReservationEngine, OrderEventBus, OrderLedger};

/// Persistence backends.
pub struct Stores {
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: Arc<dyn OrderStore>,
    pub conversations: Arc<dyn ConversationStore>,
}

impl Stores {
    /// Postgres when `DATABASE_URL` is set, in-memory otherwise.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let currency = config.orders.currency.clone();

        if let Some(url) = &config.database_url {
            let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
            storefront_infra::schema::ensure_schema(&pool).await?;
            info!("using postgres stores");
            return Ok(Self {
                catalog: Arc::new(PostgresCatalogStore::new(pool.clone(), currency)),
                orders: Arc::new(PostgresOrderStore::new(pool.clone())),
                conversations: Arc::new(PostgresConversationStore::new(pool)),
            });
        }

        let catalog = match &config.catalog_fixture {
            Some(path) => {
                info!(fixture = %path, "using in-memory stores seeded from fixture");
                InMemoryCatalogStore::from_fixture_file(path, currency)?
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory stores");
                InMemoryCatalogStore::new(currency)
            }
        };
        Ok(Self {
            catalog: Arc::new(catalog),
            orders: Arc::new(InMemoryOrderStore::new()),
            conversations: Arc::new(InMemoryConversationStore::new()),
        })
    }

    pub fn in_memory(currency: &str) -> Self {
        Self {
            catalog: Arc::new(InMemoryCatalogStore::new(currency)),
            orders: Arc::new(InMemoryOrderStore::new()),
            conversations: Arc::new(InMemoryConversationStore::new()),
        }
    }
}

/// Outbound collaborators: messaging provider, media download, blob
/// storage and link fetching.
pub struct Outbound {
    pub gateway: Arc<dyn MessagingGateway>,
    pub media: Arc<dyn MediaSource>,
    pub blobs: Arc<dyn BlobStore>,
    pub links: Arc<dyn LinkFetcher>,
}

impl Outbound {
    pub fn from_config(config: &AppConfig) -> Self {
        let client = reqwest::Client::new();
        let wa = &config.whatsapp;

        let blobs: Arc<dyn BlobStore> = match &config.storage {
            Some(storage) => Arc::new(SupabaseBlobStore::new(
                client.clone(),
                storage.url.clone(),
                storage.service_role_key.clone(),
            )),
            None => {
                warn!("SUPABASE_URL not set; uploaded images are kept in memory");
                Arc::new(InMemoryBlobStore::new())
            }
        };

        Self {
            gateway: Arc::new(WhatsAppCloudGateway::new(
                client.clone(),
                wa.api_base.clone(),
                wa.phone_number_id.clone(),
                wa.access_token.clone(),
            )),
            media: Arc::new(WhatsAppMediaSource::new(
                client.clone(),
                wa.api_base.clone(),
                wa.access_token.clone(),
                config.fetch_timeout,
            )),
            blobs,
            links: Arc::new(HttpLinkFetcher::new(client, config.fetch_timeout)),
        }
    }

    /// Nothing leaves the process; sends are recorded on the returned gateway.
    pub fn in_memory() -> (Self, Arc<InMemoryGateway>) {
        let gateway = Arc::new(InMemoryGateway::new());
        let outbound = Self {
            gateway: gateway.clone(),
            media: Arc::new(InMemoryMediaSource::new()),
            blobs: Arc::new(InMemoryBlobStore::new()),
            links: Arc::new(InMemoryLinkFetcher::new()),
        };
        (outbound, gateway)
    }
}

/// Phone checks allowed per client address per minute.
pub const PHONE_CHECKS_PER_MINUTE: u32 = 30;

/// Shared state handed to every handler.
pub struct AppServices {
    pub catalog: Arc<dyn CatalogStore>,
    pub ledger: Arc<OrderLedger>,
    pub notifier: Arc<OrderNotifier>,
    pub chat: ChatRouter,
    pub phones: PhoneValidator,
    pub phone_limiter: RateLimiter<String>,
    pub verify_token: String,
    worker: Mutex<Option<WorkerHandle>>,
}

impl AppServices {
    /// Wire everything from configuration. Must run inside a tokio runtime.
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Arc<Self>> {
        let stores = Stores::from_config(config).await?;
        Ok(Self::assemble(config, stores, Outbound::from_config(config)))
    }

    /// Wire the given backends and start the notification worker.
    pub fn assemble(config: &AppConfig, stores: Stores, outbound: Outbound) -> Arc<Self> {
        let engine = Arc::new(InventoryReservationEngine::new(stores.catalog.clone()));
        let ledger = Arc::new(OrderLedger::new(
            stores.orders,
            engine,
            Arc::new(OrderEventBus::new()),
            config.orders.delivery_fee,
            config.orders.currency.clone(),
        ));

        let notifier = Arc::new(OrderNotifier::new(
            ledger.clone(),
            outbound.gateway.clone(),
            config.whatsapp.group_id.clone(),
        ));
        let worker = NotificationWorker::spawn(notifier.clone(), ledger.subscribe());
        let phones = PhoneValidator::new(outbound.gateway.clone());

        let chat = ChatRouter::new(
            ChatCollaborators {
                catalog: stores.catalog.clone(),
                ledger: ledger.clone(),
                conversations: stores.conversations,
                gateway: outbound.gateway,
                media: outbound.media,
                blobs: outbound.blobs,
                links: outbound.links,
            },
            config.whatsapp.authorized_numbers.clone(),
        );

        Arc::new(Self {
            catalog: stores.catalog,
            ledger,
            notifier,
            chat,
            phones,
            phone_limiter: RateLimiter::new(PHONE_CHECKS_PER_MINUTE, Duration::from_secs(60)),
            verify_token: config.whatsapp.verify_token.clone(),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Stop the notification worker. Later calls do nothing.
    pub async fn shutdown(&self) {
        if let Some(worker) = self.worker.lock().await.take() {
            worker.shutdown().await;
        }
    }
}
