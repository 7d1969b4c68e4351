use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Image,
    Other,
}

/// One inbound chat message, reduced to what routing needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub sender: String,
    /// Profile name; recorded as `claimed_by` on claims.
    pub sender_name: Option<String>,
    pub kind: MessageKind,
    /// Text body, or the caption of an image.
    pub text: Option<String>,
    pub media_id: Option<String>,
}

impl InboundMessage {
    pub fn text(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            sender_name: None,
            kind: MessageKind::Text,
            text: Some(body.into()),
            media_id: None,
        }
    }

    pub fn image(sender: impl Into<String>, media_id: impl Into<String>, caption: Option<String>) -> Self {
        Self {
            sender: sender.into(),
            sender_name: None,
            kind: MessageKind::Image,
            text: caption,
            media_id: Some(media_id.into()),
        }
    }

    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    /// Trimmed text, empty when there is none.
    pub fn body(&self) -> &str {
        self.text.as_deref().map(str::trim).unwrap_or("")
    }

    /// Name to record for the sender.
    pub fn actor(&self) -> &str {
        self.sender_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.sender)
    }
}

/// First message of a Cloud API webhook envelope
/// (`entry[0].changes[0].value.messages[0]`). `None` for status callbacks
/// and empty envelopes.
pub fn parse_webhook(payload: &Value) -> Option<InboundMessage> {
    let value = &payload["entry"][0]["changes"][0]["value"];
    let message = value["messages"].get(0)?;

    let sender = message["from"].as_str().unwrap_or_default().trim().to_string();
    if sender.is_empty() {
        return None;
    }

    let sender_name = value["contacts"][0]["profile"]["name"]
        .as_str()
        .map(str::to_string)
        .filter(|n| !n.trim().is_empty());

    let (kind, text, media_id) = match message["type"].as_str() {
        Some("text") => (
            MessageKind::Text,
            message["text"]["body"].as_str().map(str::to_string),
            None,
        ),
        Some("image") => (
            MessageKind::Image,
            message["image"]["caption"].as_str().map(str::to_string),
            message["image"]["id"].as_str().map(str::to_string),
        ),
        _ => (MessageKind::Other, None, None),
    };

    Some(InboundMessage {
        sender,
        sender_name,
        kind,
        text,
        media_id,
    })
}
