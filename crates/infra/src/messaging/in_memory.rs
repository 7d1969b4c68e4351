use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::r#trait::{ContactStatus, GatewayError, MessagingGateway};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Text { to: String, body: String },
    Template { to: String, template: String, params: Vec<String> },
    Image { to: String, image_url: String, caption: String },
}

impl OutboundMessage {
    pub fn recipient(&self) -> &str {
        match self {
            OutboundMessage::Text { to, .. }
            | OutboundMessage::Template { to, .. }
            | OutboundMessage::Image { to, .. } => to,
        }
    }
}

/// Gateway that records every send instead of delivering it.
///
/// Used when no provider is reachable (tests, local runs). Can be switched
/// to fail every call. Contact lookups only know registered numbers.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    sent: Mutex<Vec<OutboundMessage>>,
    contacts: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Mark `phone` as a WhatsApp account with the given `wa_id`.
    pub fn register_contact(&self, phone: &str, wa_id: &str) {
        if let Ok(mut contacts) = self.contacts.lock() {
            contacts.insert(phone.to_string(), wa_id.to_string());
        }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_to(&self, recipient: &str) -> Vec<OutboundMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.recipient() == recipient)
            .collect()
    }

    fn ensure_up(&self) -> Result<(), GatewayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected {
                status: 503,
                body: "gateway switched off".to_string(),
            });
        }
        Ok(())
    }

    fn record(&self, message: OutboundMessage) -> Result<(), GatewayError> {
        self.ensure_up()?;
        self.sent
            .lock()
            .map_err(|_| GatewayError::Request("lock poisoned".to_string()))?
            .push(message);
        Ok(())
    }
}

#[async_trait::async_trait]
impl MessagingGateway for InMemoryGateway {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), GatewayError> {
        self.record(OutboundMessage::Text {
            to: to.to_string(),
            body: body.to_string(),
        })
    }

    async fn send_template(&self, to: &str, template: &str, params: &[String]) -> Result<(), GatewayError> {
        self.record(OutboundMessage::Template {
            to: to.to_string(),
            template: template.to_string(),
            params: params.to_vec(),
        })
    }

    async fn send_image(&self, to: &str, image_url: &str, caption: &str) -> Result<(), GatewayError> {
        self.record(OutboundMessage::Image {
            to: to.to_string(),
            image_url: image_url.to_string(),
            caption: caption.to_string(),
        })
    }

    async fn check_contact(&self, phone: &str) -> Result<ContactStatus, GatewayError> {
        self.ensure_up()?;
        let wa_id = self
            .contacts
            .lock()
            .map_err(|_| GatewayError::Request("lock poisoned".to_string()))?
            .get(phone)
            .cloned();
        Ok(ContactStatus {
            valid: wa_id.is_some(),
            wa_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_until_switched_off() {
        let gw = InMemoryGateway::new();
        gw.send_text("2010", "hi").await.unwrap();

        gw.set_failing(true);
        assert!(gw.send_text("2010", "again").await.is_err());

        assert_eq!(
            gw.sent_to("2010"),
            vec![OutboundMessage::Text { to: "2010".into(), body: "hi".into() }]
        );
    }

    #[tokio::test]
    async fn contact_lookup_knows_registered_numbers() {
        let gw = InMemoryGateway::new();
        gw.register_contact("+201001234567", "201001234567");

        let known = gw.check_contact("+201001234567").await.unwrap();
        assert!(known.valid);
        assert_eq!(known.wa_id.as_deref(), Some("201001234567"));
        assert!(!gw.check_contact("+201009999999").await.unwrap().valid);

        gw.set_failing(true);
        assert!(gw.check_contact("+201001234567").await.is_err());
    }
}
