//! Free-text product description parser.
//!
//! Accepts `name / price`, labelled lines (`الاسم:`, `السعر:`, `الوصف:`) or
//! loose text where the first line is the name and the first number is the
//! price. Every field may come back empty.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use storefront_core::Money;

static PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+(?:\.[0-9]{1,2})?)\s*(?:جنيه|ج\.م|egp|le)?")
        .expect("price pattern is valid")
});
static NAME_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"الاسم\s*:\s*([^\n]+)").expect("name label pattern is valid"));
static PRICE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"السعر\s*:\s*([^\n]+)").expect("price label pattern is valid"));
static PRICE_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[0-9]+(?:\.[0-9]{1,2})?\s*(?:جنيه|ج\.م|egp|le)?$")
        .expect("price-only pattern is valid")
});
static LABEL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:الاسم|السعر|الوصف)\s*:").expect("label pattern is valid"));
static DESCRIPTION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"الوصف\s*:\s*([^\n]+)").expect("description label pattern is valid")
});

/// Fields recovered from a chat message. `None` means "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedProduct {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub description: Option<String>,
}

impl ParsedProduct {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.description.is_none()
    }
}

pub fn parse_product_text(text: &str) -> ParsedProduct {
    let normalized = text.replace("\r\n", "\n");
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return ParsedProduct::default();
    }

    // A bare amount answers a price prompt; it is not a name.
    if PRICE_ONLY.is_match(normalized) {
        return ParsedProduct {
            price: first_price(normalized),
            ..ParsedProduct::default()
        };
    }

    let slash = normalized.split_once('/').map(|(name, rest)| {
        (
            non_empty(name.trim()),
            first_price(rest.trim()),
        )
    });

    let name = label(&NAME_LABEL, normalized)
        .or_else(|| slash.as_ref().and_then(|(name, _)| name.clone()))
        .or_else(|| {
            normalized
                .lines()
                .find(|l| !LABEL_LINE.is_match(l))
                .and_then(|l| non_empty(l.trim()))
        });

    let price = label(&PRICE_LABEL, normalized)
        .and_then(|raw| first_price(&raw))
        .or_else(|| slash.as_ref().and_then(|(_, price)| *price))
        .or_else(|| first_price(normalized));

    let description = label(&DESCRIPTION_LABEL, normalized).or_else(|| {
        let rest: Vec<&str> = normalized
            .lines()
            .skip(1)
            .filter(|l| !LABEL_LINE.is_match(l))
            .collect();
        non_empty(rest.join("\n").trim())
    });

    ParsedProduct {
        name,
        price,
        description,
    }
}

/// First amount in `text`. Zero is treated as absent.
pub(crate) fn first_price(text: &str) -> Option<Money> {
    let raw = PRICE.captures(text)?.get(1)?.as_str();
    Money::parse(raw).ok().filter(|m| !m.is_zero())
}

fn label(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| non_empty(m.as_str().trim()))
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_format_yields_name_and_price() {
        let parsed = parse_product_text("ساعة يد / 350 جنيه");
        assert_eq!(parsed.name.as_deref(), Some("ساعة يد"));
        assert_eq!(parsed.price, Some(Money::from_minor(35_000)));
        assert_eq!(parsed.description, None);
    }

    #[test]
    fn labels_win_over_fallbacks() {
        let text = "منتج جديد\nالاسم: حقيبة جلد\nالسعر: 1200.50 ج.م\nالوصف: جلد طبيعي";
        let parsed = parse_product_text(text);
        assert_eq!(parsed.name.as_deref(), Some("حقيبة جلد"));
        assert_eq!(parsed.price, Some(Money::from_minor(120_050)));
        assert_eq!(parsed.description.as_deref(), Some("جلد طبيعي"));
    }

    #[test]
    fn loose_text_uses_first_line_and_first_number() {
        let parsed = parse_product_text("Desk lamp\r\nwarm light, 40 EGP\nmetal base");
        assert_eq!(parsed.name.as_deref(), Some("Desk lamp"));
        assert_eq!(parsed.price, Some(Money::from_minor(4_000)));
        assert_eq!(parsed.description.as_deref(), Some("warm light, 40 EGP\nmetal base"));
    }

    #[test]
    fn name_only_message_has_no_price() {
        let parsed = parse_product_text("كوب قهوة");
        assert_eq!(parsed.name.as_deref(), Some("كوب قهوة"));
        assert_eq!(parsed.price, None);
    }

    #[test]
    fn bare_amount_is_price_only() {
        let parsed = parse_product_text("250 جنيه");
        assert_eq!(parsed.price, Some(Money::from_minor(25_000)));
        assert_eq!(parsed.name, None);
        assert_eq!(parsed.description, None);
    }

    #[test]
    fn label_lines_are_not_taken_as_name() {
        let parsed = parse_product_text("السعر: 99\nشنطة ظهر");
        assert_eq!(parsed.name.as_deref(), Some("شنطة ظهر"));
        assert_eq!(parsed.price, Some(Money::from_minor(9_900)));
    }

    #[test]
    fn empty_text_parses_to_nothing() {
        assert!(parse_product_text("   \r\n ").is_empty());
    }

    #[test]
    fn zero_price_counts_as_missing() {
        assert_eq!(parse_product_text("hat / 0").price, None);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 300,
                ..ProptestConfig::default()
            })]

            /// Property: the parser never panics and never returns blank strings.
            #[test]
            fn never_returns_blank_fields(text in "\\PC{0,120}") {
                let parsed = parse_product_text(&text);
                if let Some(name) = parsed.name {
                    prop_assert!(!name.trim().is_empty());
                }
                if let Some(desc) = parsed.description {
                    prop_assert!(!desc.trim().is_empty());
                }
            }

            /// Property: `name / price` round trips the whole-unit price.
            #[test]
            fn slash_price_is_recovered(name in "[a-z]{3,12}", price in 1u64..100_000) {
                let parsed = parse_product_text(&format!("{name} / {price}"));
                prop_assert_eq!(parsed.name, Some(name));
                prop_assert_eq!(parsed.price, Some(Money::from_minor(price * 100)));
            }
        }
    }
}
