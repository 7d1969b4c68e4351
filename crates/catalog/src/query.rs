//! Listing query model shared by every catalog store implementation.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use storefront_core::{CategoryId, DomainError};

use crate::product::{Product, ProductStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 8;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Product listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    pub status: Option<ProductStatus>,
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring of name or description.
    pub q: Option<String>,
    pub in_stock_only: bool,
    pub featured_only: bool,
    /// Back-office listings see archived products; customers never do.
    pub include_archived: bool,
}

impl ProductFilter {
    /// Filter for customer-facing listings.
    pub fn customer() -> Self {
        Self::default()
    }

    /// Filter for back-office listings.
    pub fn admin() -> Self {
        Self {
            include_archived: true,
            ..Self::default()
        }
    }

    /// Trimmed, lower-cased search needle (if any).
    pub fn needle(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, product: &Product) -> bool {
        if !self.include_archived && product.status == ProductStatus::Archived {
            return false;
        }
        if let Some(status) = self.status {
            if product.status != status {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if product.category_id != Some(category_id) {
                return false;
            }
        }
        if self.in_stock_only && product.stock_quantity == 0 {
            return false;
        }
        if self.featured_only && !product.is_featured {
            return false;
        }
        if let Some(needle) = self.needle() {
            let in_name = product.name.to_lowercase().contains(&needle);
            let in_description = product
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_name && !in_description {
                return false;
            }
        }
        true
    }
}

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    pub fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            ProductSort::Newest => b.created_at.cmp(&a.created_at),
            ProductSort::PriceAsc => a.price.cmp(&b.price),
            ProductSort::PriceDesc => b.price.cmp(&a.price),
            ProductSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        }
        .then_with(|| a.id.cmp(&b.id))
    }

    /// SQL `ORDER BY` clause for this sort.
    pub fn order_by(self) -> &'static str {
        match self {
            ProductSort::Newest => "created_at DESC, id ASC",
            ProductSort::PriceAsc => "price_minor ASC, id ASC",
            ProductSort::PriceDesc => "price_minor DESC, id ASC",
            ProductSort::Name => "lower(name) ASC, id ASC",
        }
    }
}

impl core::str::FromStr for ProductSort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" | "" => Ok(ProductSort::Newest),
            "price_asc" => Ok(ProductSort::PriceAsc),
            "price_desc" => Ok(ProductSort::PriceDesc),
            "name" => Ok(ProductSort::Name),
            other => Err(DomainError::validation(
                "invalid_sort",
                format!("unknown sort: {other}"),
            )),
        }
    }
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

/// One page of results plus the total count across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        let pages = total.div_ceil(u64::from(request.page_size)).max(1);
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
            total_pages: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }

    /// Filter, sort and slice an in-memory collection.
    pub fn from_unsorted(
        mut all: Vec<T>,
        keep: impl Fn(&T) -> bool,
        order: impl Fn(&T, &T) -> Ordering,
        request: PageRequest,
    ) -> Self {
        all.retain(|p| keep(p));
        all.sort_by(|a, b| order(a, b));
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(request.page_size as usize)
            .collect();
        Self::new(items, total, request)
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total: u64,
    pub active: u64,
    pub out_of_stock: u64,
}

impl CatalogStats {
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        products.into_iter().fold(Self::default(), |mut acc, p| {
            acc.total += 1;
            match p.status {
                ProductStatus::Active => acc.active += 1,
                ProductStatus::OutOfStock => acc.out_of_stock += 1,
                _ => {}
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductDraft;
    use chrono::{Duration, Utc};
    use storefront_core::{Money, ProductId};

    fn product(name: &str, price: u64, stock: i64, age_minutes: i64) -> Product {
        ProductDraft {
            name: name.to_string(),
            description: Some(format!("{name} description")),
            price: Money::from_minor(price),
            stock_quantity: stock,
            ..ProductDraft::default()
        }
        .into_product(
            ProductId::new(),
            "EGP",
            Utc::now() - Duration::minutes(age_minutes),
        )
        .unwrap()
    }

    fn fixture() -> Vec<Product> {
        let mut archived = product("Old Lamp", 500, 3, 50);
        archived.status = ProductStatus::Archived;
        vec![
            product("Red Shirt", 2000, 4, 10),
            product("Blue Shirt", 1500, 0, 5),
            product("Mug", 300, 9, 1),
            archived,
        ]
    }

    fn list(filter: &ProductFilter, sort: ProductSort, req: PageRequest) -> Page<Product> {
        Page::from_unsorted(fixture(), |p| filter.matches(p), |a, b| sort.compare(a, b), req)
    }

    #[test]
    fn customer_listing_hides_archived() {
        let page = list(&ProductFilter::customer(), ProductSort::Newest, PageRequest::default());
        assert_eq!(page.total, 3);
        assert!(page.items.iter().all(|p| p.status != ProductStatus::Archived));
        assert_eq!(page.items[0].name, "Mug");
    }

    #[test]
    fn admin_listing_includes_archived() {
        let page = list(&ProductFilter::admin(), ProductSort::Name, PageRequest::default());
        assert_eq!(page.total, 4);
    }

    #[test]
    fn search_matches_name_or_description_case_insensitively() {
        let filter = ProductFilter {
            q: Some("  SHIRT ".into()),
            ..ProductFilter::default()
        };
        let page = list(&filter, ProductSort::PriceAsc, PageRequest::default());
        let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Blue Shirt", "Red Shirt"]);
    }

    #[test]
    fn in_stock_only_drops_empty_products() {
        let filter = ProductFilter {
            in_stock_only: true,
            ..ProductFilter::default()
        };
        let page = list(&filter, ProductSort::PriceDesc, PageRequest::default());
        let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Red Shirt", "Mug"]);
    }

    #[test]
    fn paging_reports_totals() {
        let req = PageRequest::new(Some(2), Some(2));
        let page = list(&ProductFilter::customer(), ProductSort::Name, req);
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Red Shirt");
    }

    #[test]
    fn page_request_clamps() {
        let req = PageRequest::new(Some(0), Some(10_000));
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(None, None).page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn empty_page_still_has_one_page() {
        let page: Page<Product> = Page::new(vec![], 0, PageRequest::default());
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn stats_count_by_status() {
        let products = fixture();
        let stats = CatalogStats::from_products(&products);
        assert_eq!(stats, CatalogStats { total: 4, active: 2, out_of_stock: 1 });
    }

    #[test]
    fn sort_parses() {
        assert_eq!("price_desc".parse::<ProductSort>().unwrap(), ProductSort::PriceDesc);
        assert!("cheapest".parse::<ProductSort>().is_err());
    }
}
