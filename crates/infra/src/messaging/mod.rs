//! Outbound chat messaging.
//!
//! Sends are keyed to a recipient phone number (or group id). Callers treat
//! them as fire-and-forget relative to the state change that triggered them.

pub mod in_memory;
pub mod r#trait;
pub mod whatsapp_cloud;

pub use in_memory::{InMemoryGateway, OutboundMessage};
pub use r#trait::{ContactStatus, GatewayError, MessagingGateway};
pub use whatsapp_cloud::WhatsAppCloudGateway;
