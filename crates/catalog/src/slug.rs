//! URL slug derivation.

/// Maximum slug length (in characters) before any disambiguating suffix.
pub const MAX_SLUG_LEN: usize = 80;

/// Derive a slug from a display name.
///
/// Lower-cases, keeps letters and digits (Arabic included), collapses every
/// other run of characters into a single `-`, trims separators and truncates
/// to [`MAX_SLUG_LEN`]. A name with no letters or digits yields `"product"`.
///
/// Uniqueness is not checked here; callers append a disambiguator with
/// [`slug_with_suffix`].
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(ch);
        } else {
            pending_sep = true;
        }
    }

    let truncated: String = out.chars().take(MAX_SLUG_LEN).collect();
    let trimmed = truncated.trim_end_matches('-');
    if trimmed.is_empty() {
        "product".to_string()
    } else {
        trimmed.to_string()
    }
}

/// `slugify(name)` followed by `-{suffix}`.
pub fn slug_with_suffix(name: &str, suffix: impl core::fmt::Display) -> String {
    format!("{}-{}", slugify(name), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_separators_and_lowercases() {
        assert_eq!(slugify("  Red -- T-Shirt!! XL "), "red-t-shirt-xl");
    }

    #[test]
    fn keeps_arabic_letters() {
        assert_eq!(slugify("قميص أحمر"), "قميص-أحمر");
    }

    #[test]
    fn empty_or_symbol_only_names_fall_back() {
        assert_eq!(slugify("***"), "product");
        assert_eq!(slugify(""), "product");
    }

    #[test]
    fn suffix_is_appended_after_truncation() {
        let long = "a".repeat(200);
        let slug = slug_with_suffix(&long, 1700000000000u64);
        assert!(slug.starts_with(&"a".repeat(80)));
        assert!(slug.ends_with("-1700000000000"));
        assert_eq!(slug.chars().count(), 80 + 1 + 13);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 1000,
                ..ProptestConfig::default()
            })]

            /// Property: slugs are bounded, lower-case and never start/end with or double a separator.
            #[test]
            fn slug_shape(name in "\\PC{0,200}") {
                let slug = slugify(&name);
                prop_assert!(!slug.is_empty());
                prop_assert!(slug.chars().count() <= MAX_SLUG_LEN);
                prop_assert!(!slug.starts_with('-'));
                prop_assert!(!slug.ends_with('-'));
                prop_assert!(!slug.contains("--"));
                prop_assert!(slug.chars().all(|c| c == '-' || c.is_alphanumeric()));
            }

            /// Property: slugify is idempotent.
            #[test]
            fn slugify_is_idempotent(name in "[A-Za-z0-9 _!\\-]{1,120}") {
                let once = slugify(&name);
                prop_assert_eq!(slugify(&once), once);
            }
        }
    }
}
