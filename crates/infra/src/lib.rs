//! Infrastructure layer: stores, reservation, ledger, chat and outbound
//! collaborators (messaging provider, blob storage, page fetching).

pub mod catalog_store;
pub mod chat;
pub mod config;
pub mod conversation_store;
pub mod error;
pub mod ledger;
pub mod link_fetcher;
pub mod locks;
pub mod media;
pub mod messaging;
pub mod notifier;
pub mod order_store;
pub mod phone_check;
pub mod rate_limit;
pub mod reservation;
pub mod retry;
pub mod schema;
pub mod workers;

mod integration_tests;

pub use error::StoreError;
pub use ledger::{CreateOrderOutcome, LedgerError, OrderEventBus, OrderLedger, StatusUpdate};
pub use reservation::InventoryReservationEngine;
