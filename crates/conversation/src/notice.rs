//! Outbound chat texts.
//!
//! Every notice has a stable `code` for logs and tests, and an Arabic
//! `text` for the sender. Raw error detail never reaches a chat.

use storefront_core::Money;
use storefront_orders::Order;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Unauthorized,
    UnknownOrder,
    AlreadyClaimed { claimed_by: String },
    AlreadyDone,
    MissingName,
    MissingPrice,
    ImageFailed,
    ScrapeFailed,
    InvalidUrl,
    CreationFailed,
    ProductCreated { name: String, price: Money },
    OrderClaimed { order_number: String },
    ContactLink { link: String },
    OrderDelivered { order_number: String },
    StatusSummary(String),
    Usage,
}

impl Notice {
    pub fn code(&self) -> &'static str {
        match self {
            Notice::Unauthorized => "unauthorized",
            Notice::UnknownOrder => "unknown_order",
            Notice::AlreadyClaimed { .. } => "already_claimed",
            Notice::AlreadyDone => "already_done",
            Notice::MissingName => "missing_name",
            Notice::MissingPrice => "missing_price",
            Notice::ImageFailed => "image_failed",
            Notice::ScrapeFailed => "scrape_failed",
            Notice::InvalidUrl => "invalid_url",
            Notice::CreationFailed => "creation_failed",
            Notice::ProductCreated { .. } => "product_created",
            Notice::OrderClaimed { .. } => "order_claimed",
            Notice::ContactLink { .. } => "order_contact",
            Notice::OrderDelivered { .. } => "order_delivered",
            Notice::StatusSummary(_) => "order_status",
            Notice::Usage => "usage",
        }
    }

    pub fn text(&self) -> String {
        match self {
            Notice::Unauthorized => "عذراً، هذا الرقم غير مصرح له باستخدام الخدمة.".to_string(),
            Notice::UnknownOrder => "لم يتم العثور على الطلب أو الأمر غير معروف.".to_string(),
            Notice::AlreadyClaimed { claimed_by } => {
                format!("هذا الطلب تم استلامه بالفعل بواسطة {claimed_by}.")
            }
            Notice::AlreadyDone => "تم تنفيذ هذا الإجراء مسبقاً على الطلب.".to_string(),
            Notice::MissingName => "من فضلك أرسل اسم المنتج.".to_string(),
            Notice::MissingPrice => "من فضلك أرسل سعر المنتج.".to_string(),
            Notice::ImageFailed => "تعذر حفظ الصورة، يمكنك إرسالها مرة أخرى.".to_string(),
            Notice::ScrapeFailed => "تعذر قراءة بيانات المنتج من الرابط.".to_string(),
            Notice::InvalidUrl => "الرابط غير صالح.".to_string(),
            Notice::CreationFailed => "تعذر إضافة المنتج، حاول مرة أخرى.".to_string(),
            Notice::ProductCreated { name, price } => {
                format!("تمت إضافة المنتج: {name}\nالسعر: {price} ج.م")
            }
            Notice::OrderClaimed { order_number } => {
                format!("تم استلام الطلب {order_number} باسمك.")
            }
            Notice::ContactLink { link } => format!("تواصل مع العميل من هنا:\n{link}"),
            Notice::OrderDelivered { order_number } => {
                format!("تم تسليم الطلب {order_number}.")
            }
            Notice::StatusSummary(summary) => summary.clone(),
            Notice::Usage => [
                "لإضافة منتج أرسل: الاسم / السعر، أو صورة مع وصف، أو رابط المنتج.",
                "أوامر الطلبات: استلام FS-0001، تواصل FS-0001، حالة FS-0001، تسليم FS-0001",
            ]
            .join("\n"),
        }
    }

    /// Read-only snapshot for the `حالة` command.
    pub fn status_summary(order: &Order) -> Self {
        let lines = [
            format!("رقم الطلب: {}", order_number(order)),
            format!("الحالة: {}", order.status()),
            format!("العميل: {}", order.customer().name),
            format!("الإجمالي: {} ج.م", order.total()),
            format!("المستلم: {}", order.claimed_by().unwrap_or("-")),
        ];
        Notice::StatusSummary(lines.join("\n"))
    }
}

/// `wa.me` link to the customer with a prefilled greeting.
pub fn contact_link(order: &Order) -> String {
    let customer = order.customer();
    let prefilled = [
        format!("السلام عليكم {}", customer.name),
        format!("طلبك رقم {}", order_number(order)),
        "موعد التوصيل المتوقع: ____".to_string(),
    ]
    .join("\n");

    let phone = customer.phone.trim_start_matches('+');
    format!(
        "https://wa.me/{}?text={}",
        urlencoding::encode(phone),
        urlencoding::encode(&prefilled)
    )
}

/// New-order alert for the staff group.
pub fn group_alert_text(order: &Order) -> String {
    let number = order_number(order);
    let mut lines = vec![
        "🆕 طلب جديد!".to_string(),
        String::new(),
        format!("رقم: {number}"),
        format!("العميل: {}", order.customer().name),
        format!("المنطقة: {}", order.customer().city),
        format!("الإجمالي: {} ج.م", order.total()),
        String::new(),
        "المنتجات:".to_string(),
    ];
    lines.extend(order.lines().iter().map(|line| {
        format!(
            "• {} × {} - {} ج.م",
            line.product_name, line.quantity, line.subtotal
        )
    }));
    lines.push(String::new());
    lines.push(format!("للاستلام أرسل: استلام {number}"));
    lines.join("\n")
}

fn order_number(order: &Order) -> String {
    order
        .order_number()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string())
}
