//! Conversational ingestion domain.
//!
//! Per-sender dialog state for building a product out of chat messages, the
//! pure parsers feeding it (free text, product page metadata, fulfillment
//! commands) and the catalogue of outbound notices. No IO happens here; the
//! infrastructure layer persists state and talks to the messaging gateway.

pub mod attempt;
pub mod command;
pub mod link_parser;
pub mod notice;
pub mod state;
pub mod text_parser;

pub use attempt::{AttemptStatus, IngestionAttempt};
pub use command::{ChatCommand, CommandVerb, extract_url, parse_command};
pub use link_parser::{LinkMetadata, extract_link_metadata};
pub use notice::{Notice, contact_link, group_alert_text};
pub use state::{ConversationPhase, ConversationState, PendingPayload, Step};
pub use text_parser::{ParsedProduct, parse_product_text};
