//! Fulfillment command parsing (`استلام FS-0001` and friends).

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(استلام|تواصل|حالة|تسليم)\s+(FS-[0-9]{4,})$").expect("command pattern is valid")
});
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(https?://[^\s]+)").expect("url pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandVerb {
    /// `استلام`: take ownership of an order.
    Claim,
    /// `تواصل`: get a prefilled chat link to the customer.
    Contact,
    /// `حالة`: read-only summary.
    Status,
    /// `تسليم`: mark delivered.
    Deliver,
}

impl CommandVerb {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "استلام" => Some(Self::Claim),
            "تواصل" => Some(Self::Contact),
            "حالة" => Some(Self::Status),
            "تسليم" => Some(Self::Deliver),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Claim => "claim",
            Self::Contact => "contact",
            Self::Status => "status",
            Self::Deliver => "deliver",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCommand {
    pub verb: CommandVerb,
    /// Order number exactly as typed; resolved by the ledger lookup.
    pub order_number: String,
}

/// Parse a whole message as a single command line.
pub fn parse_command(text: &str) -> Option<ChatCommand> {
    let caps = COMMAND.captures(text.trim())?;
    let verb = CommandVerb::from_keyword(caps.get(1)?.as_str())?;
    Some(ChatCommand {
        verb,
        order_number: caps.get(2)?.as_str().to_ascii_uppercase(),
    })
}

/// First `http(s)://` URL in `text`.
pub fn extract_url(text: &str) -> Option<&str> {
    URL.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}
