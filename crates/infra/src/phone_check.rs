//! Checkout phone validation: format first, then a WhatsApp contacts lookup.
//!
//! A lookup that fails (provider down, bad credentials) falls back to the
//! format verdict so checkout is never blocked by the provider.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use storefront_orders::is_egyptian_mobile;

use crate::messaging::MessagingGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckSource {
    MetaContacts,
    FallbackFormatOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhoneCheck {
    pub valid: bool,
    pub wa_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<CheckSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl PhoneCheck {
    pub fn rejected(error: &'static str) -> Self {
        Self {
            valid: false,
            wa_id: None,
            source: None,
            error: Some(error),
        }
    }
}

pub struct PhoneValidator {
    gateway: Arc<dyn MessagingGateway>,
}

impl PhoneValidator {
    pub fn new(gateway: Arc<dyn MessagingGateway>) -> Self {
        Self { gateway }
    }

    pub async fn check(&self, phone: &str) -> PhoneCheck {
        let phone = phone.trim();
        if !is_egyptian_mobile(phone) {
            return PhoneCheck::rejected("invalid_format");
        }

        match self.gateway.check_contact(phone).await {
            Ok(contact) => PhoneCheck {
                valid: contact.valid,
                wa_id: contact.wa_id,
                source: Some(CheckSource::MetaContacts),
                error: None,
            },
            Err(err) => {
                warn!(error = %err, "contacts lookup failed, accepting on format");
                PhoneCheck {
                    valid: true,
                    wa_id: None,
                    source: Some(CheckSource::FallbackFormatOnly),
                    error: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::InMemoryGateway;

    fn validator() -> (PhoneValidator, Arc<InMemoryGateway>) {
        let gateway = Arc::new(InMemoryGateway::new());
        (PhoneValidator::new(gateway.clone()), gateway)
    }

    #[tokio::test]
    async fn malformed_numbers_never_reach_the_provider() {
        let (validator, gateway) = validator();
        gateway.set_failing(true);

        for phone in ["01001234567", "+2010012345", "+20100123456a", ""] {
            assert_eq!(validator.check(phone).await, PhoneCheck::rejected("invalid_format"));
        }
    }

    #[tokio::test]
    async fn lookup_result_is_reported() {
        let (validator, gateway) = validator();
        gateway.register_contact("+201001234567", "201001234567");

        let known = validator.check(" +201001234567 ").await;
        assert!(known.valid);
        assert_eq!(known.wa_id.as_deref(), Some("201001234567"));
        assert_eq!(known.source, Some(CheckSource::MetaContacts));

        let unknown = validator.check("+201009999999").await;
        assert!(!unknown.valid);
        assert_eq!(unknown.source, Some(CheckSource::MetaContacts));
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_format() {
        let (validator, gateway) = validator();
        gateway.set_failing(true);

        let check = validator.check("+201001234567").await;
        assert!(check.valid);
        assert_eq!(check.wa_id, None);
        assert_eq!(check.source, Some(CheckSource::FallbackFormatOnly));

        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["source"], "fallback_format_only");
        assert!(json.get("error").is_none());
    }
}
