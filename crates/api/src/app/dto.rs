//! Request/response DTOs and mapping to/from domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_catalog::{PageRequest, ProductFilter, ProductSort, ProductStatus};
use storefront_core::{CategoryId, DomainError, DomainResult, Money};
use storefront_orders::{
    CustomerInfo, LineRequest, Order, OrderLine, OrderNumber, OrderStatus, PaymentMethod,
    StatusChange,
};

/// `GET /products` and `GET /admin/products` query string.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub q: Option<String>,
    pub category_id: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    #[serde(default)]
    pub in_stock_only: bool,
    #[serde(default)]
    pub featured_only: bool,
}

impl ProductListQuery {
    /// Resolve into filter, sort and page. `base` decides archived visibility.
    pub fn resolve(self, base: ProductFilter) -> DomainResult<(ProductFilter, ProductSort, PageRequest)> {
        let category_id = self
            .category_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<CategoryId>()
                    .map_err(|_| DomainError::invalid_id(format!("invalid category id: {s}")))
            })
            .transpose()?;
        let status = self
            .status
            .as_deref()
            .map(str::parse::<ProductStatus>)
            .transpose()?;
        let sort = self.sort.as_deref().unwrap_or_default().parse::<ProductSort>()?;

        let filter = ProductFilter {
            status,
            category_id,
            q: self.q,
            in_stock_only: self.in_stock_only,
            featured_only: self.featured_only,
            ..base
        };
        Ok((filter, sort, PageRequest::new(self.page, self.page_size)))
    }
}

/// `POST /orders` body.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub customer: CustomerInfo,
    pub items: Vec<LineRequest>,
    /// Used when no `Idempotency-Key` header is sent.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Order as shown to customers and staff.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order_number: Option<OrderNumber>,
    pub status: OrderStatus,
    pub customer: CustomerInfo,
    pub items: Vec<OrderLine>,
    pub delivery_fee: Money,
    pub total: Money,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub confirmation_sent: bool,
    pub group_alert_sent: bool,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub customer_contacted_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub status_history: Vec<StatusChange>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            order_number: order.order_number(),
            status: order.status(),
            customer: order.customer().clone(),
            items: order.lines().to_vec(),
            delivery_fee: order.delivery_fee(),
            total: order.total(),
            currency: order.currency().to_string(),
            payment_method: order.payment_method(),
            confirmation_sent: order.confirmation_sent(),
            group_alert_sent: order.group_alert_sent(),
            claimed_by: order.claimed_by().map(str::to_string),
            claimed_at: order.claimed_at(),
            confirmed_at: order.confirmed_at(),
            customer_contacted_at: order.customer_contacted_at(),
            delivered_at: order.delivered_at(),
            status_history: order.status_history().to_vec(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

/// `POST /orders` response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub duplicate: bool,
}

/// `GET /admin/orders` query string.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl OrderListQuery {
    pub fn resolve(self) -> DomainResult<(Option<OrderStatus>, PageRequest)> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<OrderStatus>)
            .transpose()?;
        Ok((status, PageRequest::new(self.page, self.page_size)))
    }
}

/// `POST /admin/orders/{order_number}/status` body.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
    #[serde(default)]
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// `PUT /admin/categories/order` body: category ids in display order.
#[derive(Debug, Deserialize)]
pub struct ReorderCategoriesRequest {
    pub ids: Vec<CategoryId>,
}

/// `POST /validate-whatsapp` body. A missing or unreadable body is an empty phone.
#[derive(Debug, Default, Deserialize)]
pub struct PhoneCheckRequest {
    #[serde(default)]
    pub phone: Option<String>,
}

/// Cloud API webhook verification query (`hub.*`).
#[derive(Debug, Default, Deserialize)]
pub struct WebhookVerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_query_resolves_filters() {
        let query = ProductListQuery {
            q: Some("shirt".into()),
            status: Some("out_of_stock".into()),
            sort: Some("price_desc".into()),
            page: Some(0),
            page_size: Some(500),
            in_stock_only: true,
            ..ProductListQuery::default()
        };
        let (filter, sort, page) = query.resolve(ProductFilter::admin()).unwrap();
        assert_eq!(filter.status, Some(ProductStatus::OutOfStock));
        assert!(filter.include_archived);
        assert!(filter.in_stock_only);
        assert_eq!(sort, ProductSort::PriceDesc);
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 100);
    }

    #[test]
    fn bad_category_id_is_rejected() {
        let query = ProductListQuery {
            category_id: Some("not-a-uuid".into()),
            ..ProductListQuery::default()
        };
        match query.resolve(ProductFilter::customer()) {
            Err(DomainError::InvalidId(_)) => {}
            other => panic!("expected InvalidId, got {other:?}"),
        }
    }

    #[test]
    fn unknown_order_status_is_a_validation_error() {
        let query = OrderListQuery {
            status: Some("shipped".into()),
            ..OrderListQuery::default()
        };
        match query.resolve() {
            Err(err) => assert_eq!(err.code(), "invalid_status"),
            other => panic!("expected invalid_status, got {other:?}"),
        }
    }

    #[test]
    fn webhook_query_reads_hub_fields() {
        let query: WebhookVerifyQuery = serde_json::from_value(serde_json::json!({
            "hub.mode": "subscribe",
            "hub.verify_token": "abc",
            "hub.challenge": "42",
        }))
        .unwrap();
        assert_eq!(query.mode.as_deref(), Some("subscribe"));
        assert_eq!(query.verify_token.as_deref(), Some("abc"));
        assert_eq!(query.challenge.as_deref(), Some("42"));
    }
}
