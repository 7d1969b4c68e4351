use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use storefront_catalog::{Product, ProductDraft, ProductStatus, SourceType};
use storefront_conversation::{
    ChatCommand, CommandVerb, ConversationState, IngestionAttempt, Notice, Step, contact_link,
    extract_link_metadata, extract_url, parse_command, parse_product_text,
};
use storefront_core::DomainError;
use storefront_orders::{OrderNumber, OrderStatus, TransitionMode};

use super::message::{InboundMessage, MessageKind};
use crate::catalog_store::CatalogStore;
use crate::config::AllowList;
use crate::conversation_store::ConversationStore;
use crate::ledger::{LedgerError, OrderLedger, StatusUpdate};
use crate::link_fetcher::LinkFetcher;
use crate::locks::KeyedLocks;
use crate::media::{BlobStore, MediaSource};
use crate::messaging::MessagingGateway;

/// Where an inbound message ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Routed {
    GroupCommand,
    Link,
    Manual,
    Instructions,
    Unauthorized,
    Ignored,
}

impl Routed {
    pub fn as_str(self) -> &'static str {
        match self {
            Routed::GroupCommand => "group_command",
            Routed::Link => "link",
            Routed::Manual => "manual",
            Routed::Instructions => "instructions",
            Routed::Unauthorized => "unauthorized",
            Routed::Ignored => "ignored",
        }
    }
}

/// Everything the router talks to.
#[derive(Clone)]
pub struct ChatCollaborators {
    pub catalog: Arc<dyn CatalogStore>,
    pub ledger: Arc<OrderLedger>,
    pub conversations: Arc<dyn ConversationStore>,
    pub gateway: Arc<dyn MessagingGateway>,
    pub media: Arc<dyn MediaSource>,
    pub blobs: Arc<dyn BlobStore>,
    pub links: Arc<dyn LinkFetcher>,
}

pub struct ChatRouter {
    deps: ChatCollaborators,
    allow_list: AllowList,
    senders: KeyedLocks<String>,
}

impl ChatRouter {
    pub fn new(deps: ChatCollaborators, allow_list: AllowList) -> Self {
        Self {
            deps,
            allow_list,
            senders: KeyedLocks::new(),
        }
    }

    /// Handle one inbound message. Failures end up as notices to the sender,
    /// never as errors to the caller.
    #[instrument(skip(self, message), fields(sender = %message.sender))]
    pub async fn handle(&self, message: InboundMessage) -> Routed {
        if message.sender.trim().is_empty() {
            return Routed::Ignored;
        }

        if !self.allow_list.contains(&message.sender) {
            debug!("sender not on allow list");
            self.reply(&message.sender, Notice::Unauthorized).await;
            return Routed::Unauthorized;
        }

        let body = message.body();

        if let Some(command) = parse_command(body) {
            let notice = self.run_command(&command, message.actor()).await;
            self.reply(&message.sender, notice).await;
            return Routed::GroupCommand;
        }

        if let Some(url) = extract_url(body) {
            let notice = self.ingest_link(&message.sender, url).await;
            self.reply(&message.sender, notice).await;
            return Routed::Link;
        }

        match message.kind {
            MessageKind::Text | MessageKind::Image => {
                self.converse(&message).await;
                Routed::Manual
            }
            MessageKind::Other => {
                self.reply(&message.sender, Notice::Usage).await;
                Routed::Instructions
            }
        }
    }

    async fn reply(&self, to: &str, notice: Notice) {
        debug!(notice = notice.code(), "replying");
        if let Err(err) = self.deps.gateway.send_text(to, &notice.text()).await {
            warn!(notice = notice.code(), error = %err, "chat reply not delivered");
        }
    }

    async fn run_command(&self, command: &ChatCommand, actor: &str) -> Notice {
        let Ok(number) = command.order_number.parse::<OrderNumber>() else {
            return Notice::UnknownOrder;
        };
        let ledger = &self.deps.ledger;

        let result = match command.verb {
            CommandVerb::Status => {
                return match ledger.get_by_order_number(number).await {
                    Ok(order) => Notice::status_summary(&order),
                    Err(err) => command_failure(command, err),
                };
            }
            CommandVerb::Claim => {
                ledger
                    .update_status(number, OrderStatus::Claimed, Some(actor.to_string()), TransitionMode::FirstWins)
                    .await
            }
            CommandVerb::Contact => {
                ledger
                    .update_status(
                        number,
                        OrderStatus::CustomerContacted,
                        Some(actor.to_string()),
                        TransitionMode::Idempotent,
                    )
                    .await
            }
            CommandVerb::Deliver => {
                ledger
                    .update_status(number, OrderStatus::Delivered, Some(actor.to_string()), TransitionMode::Idempotent)
                    .await
            }
        };

        let order_number = number.to_string();
        match (command.verb, result) {
            (CommandVerb::Claim, Ok(StatusUpdate::Updated(_))) => {
                info!(%order_number, claimed_by = actor, "order claimed from chat");
                Notice::OrderClaimed { order_number }
            }
            (CommandVerb::Contact, Ok(update)) => Notice::ContactLink {
                link: contact_link(update.order()),
            },
            (CommandVerb::Deliver, Ok(StatusUpdate::Updated(_))) => {
                info!(%order_number, "order delivered from chat");
                Notice::OrderDelivered { order_number }
            }
            (_, Ok(_)) => Notice::AlreadyDone,
            (_, Err(err)) => command_failure(command, err),
        }
    }

    #[instrument(skip(self), err(level = "debug"))]
    async fn ingest_link_inner(&self, url: &str) -> Result<Product, LinkFailure> {
        let html = self
            .deps
            .links
            .fetch_html(url)
            .await
            .map_err(|e| LinkFailure::new(e.code(), e))?;

        let metadata = extract_link_metadata(url, &html);
        if !metadata.is_usable() {
            return Err(LinkFailure::new("scrape_failed", "page has no product name and price"));
        }

        let draft = ProductDraft {
            name: metadata.name.unwrap_or_default(),
            description: metadata.description,
            price: metadata.price.unwrap_or_default(),
            stock_quantity: 1,
            status: Some(ProductStatus::Active),
            images: metadata.image.into_iter().collect(),
            source_type: Some(SourceType::Link),
            source_url: Some(url.to_string()),
            slug_suffix: Some(millis_suffix()),
            ..ProductDraft::default()
        };
        self.deps
            .catalog
            .create_product(draft)
            .await
            .map_err(|e| LinkFailure::new("creation_failed", e))
    }

    async fn ingest_link(&self, sender: &str, url: &str) -> Notice {
        match self.ingest_link_inner(url).await {
            Ok(product) => {
                self.record(IngestionAttempt::success(
                    sender,
                    SourceType::Link,
                    url,
                    snapshot(&product),
                    Utc::now(),
                ))
                .await;
                Notice::ProductCreated {
                    name: product.name,
                    price: product.price,
                }
            }
            Err(failure) => {
                self.record(IngestionAttempt::failure(
                    sender,
                    SourceType::Link,
                    url,
                    failure.code,
                    Utc::now(),
                ))
                .await;
                match failure.code {
                    "invalid_url" => Notice::InvalidUrl,
                    "creation_failed" => Notice::CreationFailed,
                    _ => Notice::ScrapeFailed,
                }
            }
        }
    }

    /// Manual conversation, serialized per sender.
    async fn converse(&self, message: &InboundMessage) {
        let sender = message.sender.as_str();
        let _guard = self.senders.lock(&sender.to_string()).await;
        let now = Utc::now();

        let mut state = match self.deps.conversations.load(sender).await {
            Ok(Some(state)) => state,
            Ok(None) => ConversationState::idle(sender, now),
            Err(err) => {
                warn!(error = %err, "conversation state unavailable");
                self.reply(sender, Notice::CreationFailed).await;
                return;
            }
        };

        let image = match message.media_id.as_deref() {
            Some(media_id) => self.store_image(sender, media_id).await,
            None => None,
        };

        let step = state.advance(parse_product_text(message.body()), image.clone(), now);
        if let Some(url) = image.filter(|url| !state.pending.images.contains(url)) {
            self.discard_image(&url).await;
        }

        let notice = match step {
            Step::AskForName => Notice::MissingName,
            Step::AskForPrice => Notice::MissingPrice,
            Step::Ready => self.create_from_conversation(&mut state).await,
        };

        if let Err(err) = self.deps.conversations.save(&state).await {
            warn!(error = %err, phase = %state.phase, "conversation state not saved");
        }
        self.reply(sender, notice).await;
    }

    async fn create_from_conversation(&self, state: &mut ConversationState) -> Notice {
        let Some(draft) = state.pending.to_draft(SourceType::ManualWhatsapp, millis_suffix()) else {
            return Notice::MissingName;
        };

        match self.deps.catalog.create_product(draft).await {
            Ok(product) => {
                info!(product_id = %product.id, "product created from chat");
                self.record(IngestionAttempt::success(
                    state.sender.clone(),
                    SourceType::ManualWhatsapp,
                    product.name.clone(),
                    snapshot(&product),
                    Utc::now(),
                ))
                .await;
                state.clear(Utc::now());
                Notice::ProductCreated {
                    name: product.name,
                    price: product.price,
                }
            }
            Err(err) => {
                // Pending fields are kept; the next message retries creation.
                warn!(error = %err, "chat product not created");
                Notice::CreationFailed
            }
        }
    }

    /// Download and re-host an image. Failures are reported and swallowed.
    async fn store_image(&self, sender: &str, media_id: &str) -> Option<String> {
        let uploaded = match self.deps.media.download(media_id).await {
            Ok(blob) => {
                let folder = format!("manual-{}", millis_suffix());
                self.deps.blobs.upload(&folder, &blob).await
            }
            Err(err) => Err(err),
        };

        match uploaded {
            Ok(url) => Some(url),
            Err(err) => {
                warn!(%media_id, error = %err, "chat image not stored");
                self.reply(sender, Notice::ImageFailed).await;
                None
            }
        }
    }

    /// Remove an upload the pending payload did not keep (image cap reached).
    async fn discard_image(&self, url: &str) {
        debug!(%url, "discarding image over the cap");
        if let Err(err) = self.deps.blobs.delete(url).await {
            warn!(%url, error = %err, "discarded image not deleted");
        }
    }

    async fn record(&self, attempt: IngestionAttempt) {
        if let Err(err) = self.deps.conversations.record_attempt(&attempt).await {
            warn!(error = %err, status = attempt.status.as_str(), "ingestion attempt not recorded");
        }
    }
}

#[derive(Debug)]
struct LinkFailure {
    code: &'static str,
    detail: String,
}

impl LinkFailure {
    fn new(code: &'static str, detail: impl core::fmt::Display) -> Self {
        Self {
            code,
            detail: detail.to_string(),
        }
    }
}

impl core::fmt::Display for LinkFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code, self.detail)
    }
}

fn command_failure(command: &ChatCommand, err: LedgerError) -> Notice {
    match err.domain() {
        Some(DomainError::AlreadyClaimed { claimed_by }) => Notice::AlreadyClaimed {
            claimed_by: claimed_by.clone(),
        },
        Some(DomainError::OrderNotFound) => Notice::UnknownOrder,
        Some(DomainError::InvalidTransition { .. } | DomainError::Conflict(_)) => Notice::AlreadyDone,
        _ => {
            warn!(verb = command.verb.as_str(), order_number = %command.order_number, error = %err, "chat command failed");
            Notice::UnknownOrder
        }
    }
}

fn millis_suffix() -> String {
    Utc::now().timestamp_millis().to_string()
}

fn snapshot(product: &Product) -> Value {
    serde_json::to_value(product).unwrap_or(Value::Null)
}
