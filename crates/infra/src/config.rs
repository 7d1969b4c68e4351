//! Process configuration loaded from environment variables.
//!
//! Required values that are missing or malformed are reported as
//! [`ConfigError`]; the binary aborts before binding a socket.

use std::collections::BTreeSet;
use std::time::Duration;

use thiserror::Error;

use storefront_core::Money;

pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v21.0";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// `None` selects the in-memory stores.
    pub database_url: Option<String>,
    /// Seed for the in-memory catalog.
    pub catalog_fixture: Option<String>,
    pub whatsapp: WhatsAppConfig,
    /// `None` selects the in-memory blob store.
    pub storage: Option<StorageConfig>,
    pub orders: OrderConfig,
    /// Bound for link scraping and media downloads.
    pub fetch_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Bearer token guarding `/admin/*`.
    pub admin_token: String,
}

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub phone_number_id: String,
    pub access_token: String,
    /// Webhook challenge token.
    pub verify_token: String,
    /// Senders allowed to ingest products and run commands.
    pub authorized_numbers: AllowList,
    /// Recipient of new-order alerts.
    pub group_id: String,
    pub api_base: String,
}

/// Phone numbers permitted to drive ingestion and commands.
///
/// Numbers are compared digits-only, so `+20 100 123 4567` and
/// `201001234567` match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList(BTreeSet<String>);

impl AllowList {
    /// Comma separated list; blanks are skipped.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(digits_only)
                .filter(|n| !n.is_empty())
                .collect(),
        )
    }

    pub fn contains(&self, sender: &str) -> bool {
        let sender = digits_only(sender);
        !sender.is_empty() && self.0.contains(&sender)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub url: String,
    pub service_role_key: String,
}

#[derive(Debug, Clone)]
pub struct OrderConfig {
    pub delivery_fee: Money,
    pub currency: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));

        let delivery_fee = match optional("DELIVERY_FEE") {
            Some(raw) => Money::parse(&raw).map_err(|e| ConfigError::Invalid {
                name: "DELIVERY_FEE",
                reason: e.to_string(),
            })?,
            None => Money::default(),
        };

        let fetch_timeout = match optional("FETCH_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                    name: "FETCH_TIMEOUT_SECS",
                    reason: format!("not a number of seconds: {raw:?}"),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        name: "FETCH_TIMEOUT_SECS",
                        reason: "must be at least 1".to_string(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(10),
        };

        let storage = match (optional("SUPABASE_URL"), optional("SUPABASE_SERVICE_ROLE_KEY")) {
            (Some(url), Some(service_role_key)) => Some(StorageConfig {
                url: url.trim_end_matches('/').to_string(),
                service_role_key,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY")),
            (None, Some(_)) => return Err(ConfigError::Missing("SUPABASE_URL")),
        };

        Ok(Self {
            server: ServerConfig {
                bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
                admin_token: required("ADMIN_TOKEN")?,
            },
            database_url: optional("DATABASE_URL"),
            catalog_fixture: optional("CATALOG_FIXTURE"),
            whatsapp: WhatsAppConfig {
                phone_number_id: required("WA_PHONE_NUMBER_ID")?,
                access_token: required("WA_ACCESS_TOKEN")?,
                verify_token: required("WA_VERIFY_TOKEN")?,
                authorized_numbers: optional("WA_AUTHORIZED_NUMBERS")
                    .map(|raw| AllowList::parse(&raw))
                    .unwrap_or_default(),
                group_id: required("WA_GROUP_ID")?,
                api_base: optional("WA_API_BASE")
                    .unwrap_or_else(|| DEFAULT_GRAPH_API_BASE.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
            storage,
            orders: OrderConfig {
                delivery_fee,
                currency: optional("CURRENCY").unwrap_or_else(|| "EGP".to_string()),
            },
            fetch_timeout,
        })
    }

    /// Configuration for tests: in-memory everything, one authorized sender.
    pub fn for_tests() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "127.0.0.1:0".to_string(),
                admin_token: "test-admin-token".to_string(),
            },
            database_url: None,
            catalog_fixture: None,
            whatsapp: WhatsAppConfig {
                phone_number_id: "test-phone-id".to_string(),
                access_token: "test-access-token".to_string(),
                verify_token: "test-verify-token".to_string(),
                authorized_numbers: AllowList::parse("201000000001"),
                group_id: "120363000000000000@g.us".to_string(),
                api_base: DEFAULT_GRAPH_API_BASE.to_string(),
            },
            storage: None,
            orders: OrderConfig {
                delivery_fee: Money::from_minor(5000),
                currency: "EGP".to_string(),
            },
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}
