//! Inbound chat handling.
//!
//! Routing order for an inbound message:
//!
//! ```text
//! sender on allow list?      no  → unauthorized notice
//! fulfillment command?       yes → command router
//! URL in text?               yes → one-shot link ingestion
//! text or image message?     yes → per-sender product conversation
//! otherwise                       → usage instructions
//! ```

pub mod message;
pub mod router;

pub use message::{InboundMessage, MessageKind, parse_webhook};
pub use router::{ChatCollaborators, ChatRouter, Routed};
