use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult};

/// Customer details captured at order time.
///
/// A snapshot: later edits to any customer account never touch it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub city: String,
    pub address: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CustomerInfo {
    /// Trim every field and check the checkout rules.
    ///
    /// - name: at least 3 characters
    /// - phone: `+20` followed by exactly 10 digits
    /// - city: non-empty
    /// - address: at least 10 characters
    pub fn validated(self) -> DomainResult<Self> {
        let info = Self {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            city: self.city.trim().to_string(),
            address: self.address.trim().to_string(),
            notes: self
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        };

        if info.name.chars().count() < 3 {
            return Err(DomainError::validation(
                "name_required",
                "name must be at least 3 characters",
            ));
        }
        if !is_egyptian_mobile(&info.phone) {
            return Err(DomainError::validation(
                "phone_required",
                "phone must look like +20XXXXXXXXXX",
            ));
        }
        if info.city.is_empty() {
            return Err(DomainError::validation("city_required", "city is required"));
        }
        if info.address.chars().count() < 10 {
            return Err(DomainError::validation(
                "address_required",
                "address must be at least 10 characters",
            ));
        }

        Ok(info)
    }
}

/// `+20` followed by exactly 10 digits.
pub fn is_egyptian_mobile(phone: &str) -> bool {
    match phone.strip_prefix("+20") {
        Some(rest) => rest.len() == 10 && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}
