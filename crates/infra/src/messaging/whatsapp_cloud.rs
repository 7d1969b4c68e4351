use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use super::r#trait::{ContactStatus, GatewayError, MessagingGateway};

/// Template language for customer-facing templates.
const TEMPLATE_LANGUAGE: &str = "ar";

/// WhatsApp Cloud API sender (`POST {base}/{phone_number_id}/messages`).
#[derive(Clone)]
pub struct WhatsAppCloudGateway {
    client: Client,
    api_base: String,
    phone_number_id: String,
    access_token: String,
}

impl WhatsAppCloudGateway {
    pub fn new(
        client: Client,
        api_base: impl Into<String>,
        phone_number_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            phone_number_id: phone_number_id.into(),
            access_token: access_token.into(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.api_base, self.phone_number_id)
    }

    fn contacts_url(&self) -> String {
        format!("{}/{}/contacts", self.api_base, self.phone_number_id)
    }

    async fn post(&self, payload: Value) -> Result<(), GatewayError> {
        self.post_to(self.messages_url(), payload).await?;
        debug!("message accepted");
        Ok(())
    }

    async fn post_to(&self, url: String, payload: Value) -> Result<reqwest::Response, GatewayError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

pub(crate) fn text_payload(to: &str, body: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "text",
        "text": { "body": body },
    })
}

pub(crate) fn template_payload(to: &str, template: &str, params: &[String]) -> Value {
    let parameters: Vec<Value> = params
        .iter()
        .map(|p| json!({ "type": "text", "text": p }))
        .collect();
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "template",
        "template": {
            "name": template,
            "language": { "code": TEMPLATE_LANGUAGE },
            "components": [{ "type": "body", "parameters": parameters }],
        },
    })
}

pub(crate) fn contacts_payload(phone: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "blocking": "wait",
        "contacts": [phone],
    })
}

/// Reads `contacts[0]`; a missing entry means the number is not valid.
pub(crate) fn parse_contacts(body: &Value) -> ContactStatus {
    let contact = &body["contacts"][0];
    ContactStatus {
        valid: contact["status"].as_str() == Some("valid"),
        wa_id: contact["wa_id"].as_str().map(str::to_string),
    }
}

pub(crate) fn image_payload(to: &str, image_url: &str, caption: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "image",
        "image": { "link": image_url, "caption": caption },
    })
}

#[async_trait::async_trait]
impl MessagingGateway for WhatsAppCloudGateway {
    #[instrument(skip(self, body), err)]
    async fn send_text(&self, to: &str, body: &str) -> Result<(), GatewayError> {
        self.post(text_payload(to, body)).await
    }

    #[instrument(skip(self, params), err)]
    async fn send_template(&self, to: &str, template: &str, params: &[String]) -> Result<(), GatewayError> {
        self.post(template_payload(to, template, params)).await
    }

    #[instrument(skip(self, caption), err)]
    async fn send_image(&self, to: &str, image_url: &str, caption: &str) -> Result<(), GatewayError> {
        self.post(image_payload(to, image_url, caption)).await
    }

    #[instrument(skip(self), err)]
    async fn check_contact(&self, phone: &str) -> Result<ContactStatus, GatewayError> {
        let response = self.post_to(self.contacts_url(), contacts_payload(phone)).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(parse_contacts(&body))
    }
}
