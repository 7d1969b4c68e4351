use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, DomainError, DomainResult, Entity, Money, ProductId};

use crate::slug::{slug_with_suffix, slugify};

/// Maximum number of image references a product keeps.
pub const MAX_IMAGES: usize = 5;

/// Product status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Active,
    Inactive,
    OutOfStock,
    Archived,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
            ProductStatus::OutOfStock => "out_of_stock",
            ProductStatus::Archived => "archived",
        }
    }
}

impl core::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ProductStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            "out_of_stock" => Ok(ProductStatus::OutOfStock),
            "archived" => Ok(ProductStatus::Archived),
            other => Err(DomainError::validation(
                "invalid_status",
                format!("unknown product status: {other}"),
            )),
        }
    }
}

/// Where a product record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    #[default]
    Dashboard,
    Link,
    ManualWhatsapp,
}

impl SourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Dashboard => "dashboard",
            SourceType::Link => "link",
            SourceType::ManualWhatsapp => "manual_whatsapp",
        }
    }
}

impl core::str::FromStr for SourceType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dashboard" => Ok(SourceType::Dashboard),
            "link" => Ok(SourceType::Link),
            "manual_whatsapp" => Ok(SourceType::ManualWhatsapp),
            other => Err(DomainError::validation(
                "invalid_source_type",
                format!("unknown source type: {other}"),
            )),
        }
    }
}

/// Lookup key for a single product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductKey {
    Id(ProductId),
    Slug(String),
}

impl ProductKey {
    /// Interpret a path segment: a UUID is an id, anything else a slug.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<ProductId>() {
            Ok(id) => ProductKey::Id(id),
            Err(_) => ProductKey::Slug(raw.to_string()),
        }
    }
}

/// Catalog product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub currency: String,
    pub stock_quantity: u32,
    pub status: ProductStatus,
    pub is_featured: bool,
    pub category_id: Option<CategoryId>,
    pub images: Vec<String>,
    pub source_type: SourceType,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Product {
    /// Visible in customer-facing listings.
    pub fn is_listed(&self) -> bool {
        self.status != ProductStatus::Archived
    }

    /// Check that `quantity` units can be sold right now.
    pub fn ensure_sellable(&self, quantity: u32) -> DomainResult<()> {
        if self.status != ProductStatus::Active || quantity > self.stock_quantity {
            return Err(DomainError::OutOfStock { product_id: self.id });
        }
        Ok(())
    }

    /// Keep `status` coherent with `stock_quantity`.
    ///
    /// An active product with nothing on hand is out of stock; an out-of-stock
    /// product that received units is active again. Inactive and archived
    /// products are left alone.
    fn reconcile_status(&mut self) {
        match self.status {
            ProductStatus::Active if self.stock_quantity == 0 => {
                self.status = ProductStatus::OutOfStock
            }
            ProductStatus::OutOfStock if self.stock_quantity > 0 => {
                self.status = ProductStatus::Active
            }
            _ => {}
        }
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub status: Option<ProductStatus>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub source_type: Option<SourceType>,
    #[serde(default)]
    pub source_url: Option<String>,
    /// Appended to the slug (`{slug}-{suffix}`) to disambiguate equal names.
    #[serde(default)]
    pub slug_suffix: Option<String>,
}

impl ProductDraft {
    /// Validate and normalize into a full record.
    pub fn into_product(
        self,
        id: ProductId,
        default_currency: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Product> {
        let name = normalize_name(&self.name)?;
        let stock_quantity = normalize_stock(self.stock_quantity)?;

        let slug = match self.slug_suffix.as_deref().map(str::trim) {
            Some(suffix) if !suffix.is_empty() => slug_with_suffix(&name, suffix),
            _ => slugify(&name),
        };

        let mut images = self.images;
        images.retain(|i| !i.trim().is_empty());
        images.truncate(MAX_IMAGES);

        let mut product = Product {
            id,
            slug,
            name,
            description: non_empty(self.description),
            price: self.price,
            currency: self
                .currency
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| default_currency.to_string()),
            stock_quantity,
            status: self.status.unwrap_or(ProductStatus::Active),
            is_featured: self.is_featured,
            category_id: self.category_id,
            images,
            source_type: self.source_type.unwrap_or_default(),
            source_url: non_empty(self.source_url),
            created_at: now,
            updated_at: now,
        };
        product.reconcile_status();
        Ok(product)
    }
}

/// Partial update for a product. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock_quantity: Option<i64>,
    pub status: Option<ProductStatus>,
    pub is_featured: Option<bool>,
    pub category_id: Option<CategoryId>,
    pub images: Option<Vec<String>>,
}

impl ProductPatch {
    pub fn apply_to(self, product: &mut Product, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = self.name {
            product.name = normalize_name(&name)?;
        }
        if let Some(qty) = self.stock_quantity {
            product.stock_quantity = normalize_stock(qty)?;
        }
        if let Some(description) = self.description {
            product.description = non_empty(Some(description));
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(status) = self.status {
            product.status = status;
        }
        if let Some(featured) = self.is_featured {
            product.is_featured = featured;
        }
        if let Some(category_id) = self.category_id {
            product.category_id = Some(category_id);
        }
        if let Some(mut images) = self.images {
            images.retain(|i| !i.trim().is_empty());
            images.truncate(MAX_IMAGES);
            product.images = images;
        }

        product.reconcile_status();
        product.updated_at = now;
        Ok(())
    }
}

fn normalize_name(raw: &str) -> DomainResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name_required", "product name is required"));
    }
    Ok(name.to_string())
}

fn normalize_stock(raw: i64) -> DomainResult<u32> {
    u32::try_from(raw).map_err(|_| {
        DomainError::validation(
            "invalid_stock",
            format!("stock quantity must be between 0 and {}", u32::MAX),
        )
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
