//! HTTP API: storefront, back office and WhatsApp webhook.

pub mod app;
pub mod middleware;
