//! Product metadata extraction from a fetched product page.
//!
//! Looks at OpenGraph / `<meta>` tags, the first JSON-LD `Product` block and
//! the `<title>`. Fetching the page is the caller's job.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use storefront_core::Money;

static TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").expect("title pattern is valid")
});
static JSON_LD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type=["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("json-ld pattern is valid")
});
static FREE_TEXT_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+(?:\.[0-9]{1,2})?)\s*(?:جنيه|ج\.م|EGP|LE)")
        .expect("free text price pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMetadata {
    pub source_url: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<Money>,
}

impl LinkMetadata {
    /// A link can become a product only with both a name and a price.
    pub fn is_usable(&self) -> bool {
        self.name.is_some() && self.price.is_some()
    }
}

pub fn extract_link_metadata(source_url: &str, html: &str) -> LinkMetadata {
    let json_ld = json_ld_product(html);

    let name = meta(html, "og:title")
        .or_else(|| json_ld.as_ref().and_then(|p| json_str(p.get("name"))))
        .or_else(|| {
            TITLE
                .captures(html)
                .and_then(|c| c.get(1))
                .and_then(|m| non_empty(m.as_str()))
        });

    let description = meta(html, "og:description")
        .or_else(|| meta(html, "description"))
        .or_else(|| json_ld.as_ref().and_then(|p| json_str(p.get("description"))));

    let image = meta(html, "og:image").or_else(|| {
        json_ld.as_ref().and_then(|p| match p.get("image") {
            Some(Value::Array(items)) => json_str(items.first()),
            other => json_str(other),
        })
    });

    LinkMetadata {
        source_url: source_url.to_string(),
        name,
        description,
        image,
        price: price(html, json_ld.as_ref()),
    }
}

/// Content of `<meta property|name="{name}" content="...">`, either attribute order.
fn meta(html: &str, name: &str) -> Option<String> {
    let name = regex::escape(name);
    let patterns = [
        format!(r#"(?i)<meta[^>]+property=["']{name}["'][^>]+content=["']([^"']+)["']"#),
        format!(r#"(?i)<meta[^>]+content=["']([^"']+)["'][^>]+property=["']{name}["']"#),
        format!(r#"(?i)<meta[^>]+name=["']{name}["'][^>]+content=["']([^"']+)["']"#),
        format!(r#"(?i)<meta[^>]+content=["']([^"']+)["'][^>]+name=["']{name}["']"#),
    ];

    patterns.iter().find_map(|p| {
        Regex::new(p)
            .ok()?
            .captures(html)
            .and_then(|c| c.get(1))
            .and_then(|m| non_empty(m.as_str()))
    })
}

fn json_ld_product(html: &str) -> Option<Value> {
    JSON_LD.captures_iter(html).find_map(|block| {
        let value: Value = serde_json::from_str(block.get(1)?.as_str().trim()).ok()?;
        let entries = match value {
            Value::Array(items) => items,
            single => vec![single],
        };
        entries.into_iter().find(is_product)
    })
}

fn is_product(entry: &Value) -> bool {
    match entry.get("@type") {
        Some(Value::String(t)) => t == "Product",
        Some(Value::Array(types)) => types.iter().any(|t| t == "Product"),
        _ => false,
    }
}

/// First non-zero price from JSON-LD, then meta tags, then page text.
fn price(html: &str, json_ld: Option<&Value>) -> Option<Money> {
    let offers = json_ld.and_then(|p| match p.get("offers") {
        Some(Value::Array(items)) => items.first(),
        other => other,
    });
    let from_json_ld = match offers.and_then(|o| o.get("price")) {
        Some(Value::Number(n)) => n.as_f64().and_then(|v| Money::from_major(v).ok()),
        Some(Value::String(s)) => Money::parse(s).ok(),
        _ => None,
    }
    .filter(|m| !m.is_zero());
    if from_json_ld.is_some() {
        return from_json_ld;
    }

    let from_meta = meta(html, "product:price:amount")
        .or_else(|| meta(html, "price"))
        .and_then(|raw| {
            let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
            Money::parse(&cleaned).ok()
        })
        .filter(|m| !m.is_zero());
    if from_meta.is_some() {
        return from_meta;
    }

    FREE_TEXT_PRICE
        .captures(html)
        .and_then(|c| c.get(1))
        .and_then(|m| Money::parse(m.as_str()).ok())
        .filter(|m| !m.is_zero())
}

fn json_str(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(s),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
