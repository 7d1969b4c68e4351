//! Per-sender ingestion dialog.
//!
//! One [`ConversationState`] exists per sender phone number. Every inbound
//! message is folded in with [`ConversationState::advance`], which decides
//! whether to ask for the name, ask for the price, or hand back a draft
//! ready to become a product.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_catalog::{MAX_IMAGES, ProductDraft, ProductStatus, SourceType};
use storefront_core::{DomainError, Money};

use crate::text_parser::ParsedProduct;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    #[default]
    Idle,
    AwaitingName,
    AwaitingPrice,
    AwaitingImage,
    /// Name and price are known but creation has not gone through yet.
    Collecting,
}

impl ConversationPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingName => "awaiting_name",
            Self::AwaitingPrice => "awaiting_price",
            Self::AwaitingImage => "awaiting_image",
            Self::Collecting => "collecting",
        }
    }
}

impl fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationPhase {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "awaiting_name" => Ok(Self::AwaitingName),
            "awaiting_price" => Ok(Self::AwaitingPrice),
            "awaiting_image" => Ok(Self::AwaitingImage),
            "collecting" => Ok(Self::Collecting),
            other => Err(DomainError::validation(
                "invalid_phase",
                format!("unknown conversation phase: {other}"),
            )),
        }
    }
}

/// Fields collected so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl PendingPayload {
    /// Fold newly parsed fields in. Absent fields never erase known ones.
    pub fn merge(&mut self, parsed: ParsedProduct) {
        if parsed.name.is_some() {
            self.name = parsed.name;
        }
        if parsed.price.is_some() {
            self.price = parsed.price;
        }
        if parsed.description.is_some() {
            self.description = parsed.description;
        }
    }

    /// Append an image reference; ignored once [`MAX_IMAGES`] are held.
    pub fn push_image(&mut self, url: String) {
        if self.images.len() < MAX_IMAGES && !self.images.contains(&url) {
            self.images.push(url);
        }
    }

    /// Build a product draft when both name and price are known.
    pub fn to_draft(&self, source_type: SourceType, slug_suffix: String) -> Option<ProductDraft> {
        let name = self.name.clone()?;
        let price = self.price?;
        Some(ProductDraft {
            name,
            description: self.description.clone(),
            price,
            stock_quantity: 1,
            status: Some(ProductStatus::Active),
            images: self.images.clone(),
            source_type: Some(source_type),
            slug_suffix: Some(slug_suffix),
            ..ProductDraft::default()
        })
    }
}

/// What the engine should do after a message was folded in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    AskForName,
    AskForPrice,
    /// Name and price are present; create the product.
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub sender: String,
    pub phase: ConversationPhase,
    pub pending: PendingPayload,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn idle(sender: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            sender: sender.into(),
            phase: ConversationPhase::Idle,
            pending: PendingPayload::default(),
            updated_at: now,
        }
    }

    /// Merge one inbound message and move to the next phase.
    pub fn advance(
        &mut self,
        parsed: ParsedProduct,
        image: Option<String>,
        now: DateTime<Utc>,
    ) -> Step {
        self.pending.merge(parsed);
        if let Some(url) = image {
            self.pending.push_image(url);
        }
        self.updated_at = now;

        let (phase, step) = if self.pending.name.is_none() {
            (ConversationPhase::AwaitingName, Step::AskForName)
        } else if self.pending.price.is_none() {
            (ConversationPhase::AwaitingPrice, Step::AskForPrice)
        } else {
            (ConversationPhase::Collecting, Step::Ready)
        };
        self.phase = phase;
        step
    }

    /// Reset after the product was created.
    pub fn clear(&mut self, now: DateTime<Utc>) {
        self.phase = ConversationPhase::Idle;
        self.pending = PendingPayload::default();
        self.updated_at = now;
    }
}
