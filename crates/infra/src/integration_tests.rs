//! End-to-end flows over the in-memory stores.
//!
//! Checkout → reservation → ledger → event bus → notification worker, and
//! chat message → router → ledger / catalog / conversation store.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use storefront_catalog::{Product, ProductDraft, ProductKey, ProductStatus, SourceType};
    use storefront_conversation::{AttemptStatus, ConversationPhase, Notice};
    use storefront_core::{Money, ProductId};
    use storefront_orders::{CustomerInfo, LineRequest, OrderStatus, TransitionMode};

    use crate::catalog_store::{CatalogStore, InMemoryCatalogStore};
    use crate::chat::{ChatCollaborators, ChatRouter, InboundMessage, Routed};
    use crate::config::AllowList;
    use crate::conversation_store::{ConversationStore, InMemoryConversationStore};
    use crate::ledger::{OrderEventBus, OrderLedger};
    use crate::link_fetcher::InMemoryLinkFetcher;
    use crate::media::{InMemoryBlobStore, InMemoryMediaSource, MediaBlob};
    use crate::messaging::{ContactStatus, GatewayError, InMemoryGateway, MessagingGateway, OutboundMessage};
    use crate::notifier::{CONFIRMATION_TEMPLATE, OrderNotifier};
    use crate::order_store::InMemoryOrderStore;
    use crate::reservation::InventoryReservationEngine;
    use crate::workers::NotificationWorker;

    const STAFF: &str = "201000000001";
    const GROUP: &str = "staff-group";

    struct Harness {
        catalog: Arc<dyn CatalogStore>,
        ledger: Arc<OrderLedger>,
        conversations: Arc<InMemoryConversationStore>,
        gateway: Arc<InMemoryGateway>,
        media: Arc<InMemoryMediaSource>,
        blobs: Arc<InMemoryBlobStore>,
        links: Arc<InMemoryLinkFetcher>,
        router: ChatRouter,
    }

    fn harness() -> Harness {
        let catalog: Arc<dyn CatalogStore> = Arc::new(InMemoryCatalogStore::new("EGP"));
        let engine = Arc::new(InventoryReservationEngine::new(catalog.clone()));
        let ledger = Arc::new(OrderLedger::new(
            Arc::new(InMemoryOrderStore::new()),
            engine,
            Arc::new(OrderEventBus::new()),
            Money::from_minor(5000),
            "EGP",
        ));
        let conversations = Arc::new(InMemoryConversationStore::new());
        let gateway = Arc::new(InMemoryGateway::new());
        let media = Arc::new(InMemoryMediaSource::new());
        let blobs = Arc::new(InMemoryBlobStore::new());
        let links = Arc::new(InMemoryLinkFetcher::new());

        let router = ChatRouter::new(
            ChatCollaborators {
                catalog: catalog.clone(),
                ledger: ledger.clone(),
                conversations: conversations.clone(),
                gateway: gateway.clone(),
                media: media.clone(),
                blobs: blobs.clone(),
                links: links.clone(),
            },
            AllowList::parse(STAFF),
        );

        Harness {
            catalog,
            ledger,
            conversations,
            gateway,
            media,
            blobs,
            links,
            router,
        }
    }

    async fn product(h: &Harness, name: &str, price_minor: u64, stock: i64) -> Product {
        h.catalog
            .create_product(ProductDraft {
                name: name.into(),
                price: Money::from_minor(price_minor),
                stock_quantity: stock,
                ..ProductDraft::default()
            })
            .await
            .unwrap()
    }

    async fn reload(h: &Harness, id: ProductId) -> Product {
        h.catalog.get_product(&ProductKey::Id(id)).await.unwrap().unwrap()
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            name: "Mona Adel".into(),
            phone: "+201001234567".into(),
            city: "Cairo".into(),
            address: "12 Tahrir Street, Downtown".into(),
            notes: Some("ring twice".into()),
        }
    }

    fn last_text_to(h: &Harness, to: &str) -> String {
        h.gateway
            .sent_to(to)
            .into_iter()
            .rev()
            .find_map(|m| match m {
                OutboundMessage::Text { body, .. } => Some(body),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn checkout_scenario_totals_and_stock() {
        let h = harness();
        let prd = product(&h, "Brass Lamp", 1000, 5).await;

        let outcome = h
            .ledger
            .create_order(customer(), &[LineRequest { product_id: prd.id, quantity: 2 }], "checkout-1")
            .await
            .unwrap();

        assert!(!outcome.duplicate);
        assert_eq!(outcome.order.total(), Money::from_minor(2000 + 5000));
        assert_eq!(outcome.order.status(), OrderStatus::Pending);
        assert_eq!(outcome.order.lines()[0].unit_price, Money::from_minor(1000));
        assert_eq!(reload(&h, prd.id).await.stock_quantity, 3);
    }

    #[tokio::test]
    async fn idempotent_replay_decrements_once() {
        let h = harness();
        let prd = product(&h, "Brass Lamp", 1000, 5).await;
        let lines = [LineRequest { product_id: prd.id, quantity: 1 }];

        let (a, b) = tokio::join!(
            h.ledger.create_order(customer(), &lines, "same-key"),
            h.ledger.create_order(customer(), &lines, "same-key"),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.order.order_number(), b.order.order_number());
        assert_eq!(a.order.total(), b.order.total());
        assert!(a.duplicate ^ b.duplicate);
        assert_eq!(reload(&h, prd.id).await.stock_quantity, 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn last_unit_is_sold_once() {
        let h = harness();
        let prd = product(&h, "Last Vase", 4500, 1).await;
        let ledger = h.ledger.clone();

        let mut tasks = Vec::new();
        for i in 0..2 {
            let ledger = ledger.clone();
            let id = prd.id;
            tasks.push(tokio::spawn(async move {
                ledger
                    .create_order(customer(), &[LineRequest { product_id: id, quantity: 1 }], &format!("race-{i}"))
                    .await
            }));
        }

        let mut ok = 0;
        let mut out_of_stock = 0;
        for t in tasks {
            match t.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) if e.code() == "out_of_stock" => out_of_stock += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!((ok, out_of_stock), (1, 1));

        let stored = reload(&h, prd.id).await;
        assert_eq!(stored.stock_quantity, 0);
        assert_eq!(stored.status, ProductStatus::OutOfStock);
    }

    #[tokio::test]
    async fn worker_sends_each_notification_once() {
        let h = harness();
        let prd = product(&h, "Brass Lamp", 1000, 5).await;
        let notifier = Arc::new(OrderNotifier::new(h.ledger.clone(), h.gateway.clone(), GROUP));
        let worker = NotificationWorker::spawn(notifier.clone(), h.ledger.subscribe());

        let placed = h
            .ledger
            .create_order(customer(), &[LineRequest { product_id: prd.id, quantity: 1 }], "notify-1")
            .await
            .unwrap();
        let number = placed.order.order_number().unwrap();

        let mut tries = 0;
        let order = loop {
            let order = h.ledger.get_by_order_number(number).await.unwrap();
            tries += 1;
            if (order.confirmation_sent() && order.group_alert_sent()) || tries == 100 {
                break order;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        };
        assert!(order.confirmation_sent());
        assert!(order.group_alert_sent());
        assert_eq!(order.status(), OrderStatus::Confirmed);

        // A manual re-trigger changes nothing.
        let report = notifier.notify(number).await.unwrap();
        assert_eq!(report.confirmation, crate::notifier::Delivery::AlreadySent);
        worker.shutdown().await;

        let templates: Vec<_> = h
            .gateway
            .sent_to("201001234567")
            .into_iter()
            .filter(|m| matches!(m, OutboundMessage::Template { template, .. } if template == CONFIRMATION_TEMPLATE))
            .collect();
        assert_eq!(templates.len(), 1);
        match &templates[0] {
            OutboundMessage::Template { params, .. } => {
                assert_eq!(params, &vec![number.to_string(), "60.00".to_string()])
            }
            other => panic!("expected template, got {other:?}"),
        }
        assert_eq!(h.gateway.sent_to(GROUP).len(), 1);
    }

    /// Records through an [`InMemoryGateway`] after a fixed delay per call.
    struct SlowGateway {
        inner: Arc<InMemoryGateway>,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl MessagingGateway for SlowGateway {
        async fn send_text(&self, to: &str, body: &str) -> Result<(), GatewayError> {
            tokio::time::sleep(self.delay).await;
            self.inner.send_text(to, body).await
        }

        async fn send_template(&self, to: &str, template: &str, params: &[String]) -> Result<(), GatewayError> {
            tokio::time::sleep(self.delay).await;
            self.inner.send_template(to, template, params).await
        }

        async fn send_image(&self, to: &str, image_url: &str, caption: &str) -> Result<(), GatewayError> {
            tokio::time::sleep(self.delay).await;
            self.inner.send_image(to, image_url, caption).await
        }

        async fn check_contact(&self, phone: &str) -> Result<ContactStatus, GatewayError> {
            self.inner.check_contact(phone).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_notify_sends_each_notification_once() {
        let h = harness();
        let prd = product(&h, "Brass Lamp", 1000, 5).await;
        let slow = Arc::new(SlowGateway {
            inner: h.gateway.clone(),
            delay: Duration::from_millis(50),
        });
        let notifier = Arc::new(OrderNotifier::new(h.ledger.clone(), slow, GROUP));
        let number = h
            .ledger
            .create_order(customer(), &[LineRequest { product_id: prd.id, quantity: 1 }], "race-1")
            .await
            .unwrap()
            .order
            .order_number()
            .unwrap();

        let a = tokio::spawn({
            let notifier = notifier.clone();
            async move { notifier.notify(number).await }
        });
        let b = tokio::spawn({
            let notifier = notifier.clone();
            async move { notifier.notify(number).await }
        });
        let reports = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];

        let templates = h
            .gateway
            .sent_to("201001234567")
            .into_iter()
            .filter(|m| matches!(m, OutboundMessage::Template { .. }))
            .count();
        assert_eq!(templates, 1, "confirmation sent more than once");
        assert_eq!(h.gateway.sent_to(GROUP).len(), 1, "group alert sent more than once");

        let sent = reports
            .iter()
            .filter(|r| r.confirmation == crate::notifier::Delivery::Sent)
            .count();
        assert_eq!(sent, 1);
        assert!(
            reports
                .iter()
                .any(|r| r.confirmation == crate::notifier::Delivery::AlreadySent)
        );
    }

    #[tokio::test]
    async fn failed_send_leaves_flag_unset() {
        let h = harness();
        let prd = product(&h, "Brass Lamp", 1000, 5).await;
        let notifier = OrderNotifier::new(h.ledger.clone(), h.gateway.clone(), GROUP);
        let number = h
            .ledger
            .create_order(customer(), &[LineRequest { product_id: prd.id, quantity: 1 }], "k")
            .await
            .unwrap()
            .order
            .order_number()
            .unwrap();

        h.gateway.set_failing(true);
        let report = notifier.notify(number).await.unwrap();
        assert!(matches!(report.confirmation, crate::notifier::Delivery::Failed(_)));
        let order = h.ledger.get_by_order_number(number).await.unwrap();
        assert!(!order.confirmation_sent());
        assert_eq!(order.status(), OrderStatus::Pending);

        h.gateway.set_failing(false);
        let report = notifier.notify(number).await.unwrap();
        assert_eq!(report.group_alert, crate::notifier::Delivery::Sent);
    }

    #[tokio::test]
    async fn name_then_price_creates_one_product() {
        let h = harness();

        let routed = h.router.handle(InboundMessage::text(STAFF, "الاسم: مج سيراميك")).await;
        assert_eq!(routed, Routed::Manual);
        assert_eq!(last_text_to(&h, STAFF), Notice::MissingPrice.text());
        let state = h.conversations.load(STAFF).await.unwrap().unwrap();
        assert_eq!(state.phase, ConversationPhase::AwaitingPrice);

        h.router.handle(InboundMessage::text(STAFF, "السعر: 75")).await;

        let state = h.conversations.load(STAFF).await.unwrap().unwrap();
        assert_eq!(state.phase, ConversationPhase::Idle);
        assert!(state.pending.name.is_none());

        let listing = h
            .catalog
            .list_products(&Default::default(), Default::default(), Default::default())
            .await
            .unwrap();
        assert_eq!(listing.total, 1);
        let created = &listing.items[0];
        assert_eq!(created.name, "مج سيراميك");
        assert_eq!(created.price, Money::from_minor(7500));
        assert_eq!(created.stock_quantity, 1);
        assert_eq!(created.source_type, SourceType::ManualWhatsapp);

        let attempts = h.conversations.attempts_for(STAFF).await.unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].status, AttemptStatus::Success);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_sender_messages_are_handled_one_at_a_time() {
        let h = harness();

        let (first, second) = tokio::join!(
            h.router.handle(InboundMessage::text(STAFF, "الاسم: مج سيراميك")),
            h.router.handle(InboundMessage::text(STAFF, "السعر: 75")),
        );
        assert_eq!(first, Routed::Manual);
        assert_eq!(second, Routed::Manual);

        let listing = h
            .catalog
            .list_products(&Default::default(), Default::default(), Default::default())
            .await
            .unwrap();
        assert_eq!(listing.total, 1);
        assert_eq!(listing.items[0].name, "مج سيراميك");
        assert_eq!(listing.items[0].price, Money::from_minor(7500));

        let state = h.conversations.load(STAFF).await.unwrap().unwrap();
        assert_eq!(state.phase, ConversationPhase::Idle);
    }

    #[tokio::test]
    async fn image_failure_does_not_block_creation() {
        let h = harness();
        h.media.insert(
            "media-ok",
            MediaBlob {
                bytes: vec![1, 2, 3],
                content_type: "image/webp".into(),
            },
        );

        h.router
            .handle(InboundMessage::image(STAFF, "media-missing", Some("Mug / 75".into())))
            .await;
        let texts: Vec<String> = h
            .gateway
            .sent_to(STAFF)
            .into_iter()
            .filter_map(|m| match m {
                OutboundMessage::Text { body, .. } => Some(body),
                _ => None,
            })
            .collect();
        assert_eq!(texts[0], Notice::ImageFailed.text());
        assert!(texts[1].contains("Mug"));

        h.router.handle(InboundMessage::image(STAFF, "media-ok", None)).await;
        let state = h.conversations.load(STAFF).await.unwrap().unwrap();
        assert_eq!(state.pending.images.len(), 1);
        assert_eq!(state.phase, ConversationPhase::AwaitingName);
    }

    #[tokio::test]
    async fn images_over_the_cap_are_removed_from_storage() {
        let h = harness();
        h.media.insert(
            "media-ok",
            MediaBlob {
                bytes: vec![9, 9],
                content_type: "image/jpeg".into(),
            },
        );

        for _ in 0..7 {
            h.router.handle(InboundMessage::image(STAFF, "media-ok", None)).await;
        }

        let state = h.conversations.load(STAFF).await.unwrap().unwrap();
        assert_eq!(state.pending.images.len(), 5);
        assert_eq!(h.blobs.len(), 5);
        for url in &state.pending.images {
            assert!(h.blobs.get(url).is_some());
        }

        // Completing the product keeps every stored image.
        h.router.handle(InboundMessage::text(STAFF, "Mug / 75")).await;
        let listing = h
            .catalog
            .list_products(&Default::default(), Default::default(), Default::default())
            .await
            .unwrap();
        assert_eq!(listing.items[0].images.len(), 5);
        assert_eq!(h.blobs.len(), 5);
    }

    #[tokio::test]
    async fn claim_of_claimed_order_is_refused_without_mutation() {
        let h = harness();
        let prd = product(&h, "Brass Lamp", 1000, 5).await;
        let number = h
            .ledger
            .create_order(customer(), &[LineRequest { product_id: prd.id, quantity: 1 }], "k")
            .await
            .unwrap()
            .order
            .order_number()
            .unwrap();

        h.ledger
            .update_status(number, OrderStatus::Claimed, Some("Omar".into()), TransitionMode::FirstWins)
            .await
            .unwrap();
        let before = h.ledger.get_by_order_number(number).await.unwrap();

        let routed = h
            .router
            .handle(InboundMessage::text(STAFF, format!("استلام {number}")).with_sender_name("Ali"))
            .await;

        assert_eq!(routed, Routed::GroupCommand);
        assert_eq!(
            last_text_to(&h, STAFF),
            Notice::AlreadyClaimed { claimed_by: "Omar".into() }.text()
        );
        assert_eq!(h.ledger.get_by_order_number(number).await.unwrap(), before);
    }

    #[tokio::test]
    async fn contact_then_deliver_from_chat() {
        let h = harness();
        let prd = product(&h, "Brass Lamp", 1000, 5).await;
        let number = h
            .ledger
            .create_order(customer(), &[LineRequest { product_id: prd.id, quantity: 1 }], "k")
            .await
            .unwrap()
            .order
            .order_number()
            .unwrap();

        h.router.handle(InboundMessage::text(STAFF, format!("تواصل {number}"))).await;
        assert!(last_text_to(&h, STAFF).contains("https://wa.me/201001234567?text="));
        assert_eq!(
            h.ledger.get_by_order_number(number).await.unwrap().status(),
            OrderStatus::CustomerContacted
        );

        h.router.handle(InboundMessage::text(STAFF, format!("تسليم {number}"))).await;
        let delivered = h.ledger.get_by_order_number(number).await.unwrap();
        assert_eq!(delivered.status(), OrderStatus::Delivered);

        h.router.handle(InboundMessage::text(STAFF, format!("تسليم {number}"))).await;
        assert_eq!(last_text_to(&h, STAFF), Notice::AlreadyDone.text());
        assert_eq!(
            h.ledger.get_by_order_number(number).await.unwrap().delivered_at(),
            delivered.delivered_at()
        );
    }

    #[tokio::test]
    async fn unknown_order_and_unauthorized_sender() {
        let h = harness();

        h.router.handle(InboundMessage::text(STAFF, "حالة FS-0042")).await;
        assert_eq!(last_text_to(&h, STAFF), Notice::UnknownOrder.text());

        let routed = h.router.handle(InboundMessage::text("201099999999", "حالة FS-0042")).await;
        assert_eq!(routed, Routed::Unauthorized);
        assert_eq!(last_text_to(&h, "201099999999"), Notice::Unauthorized.text());
    }

    #[tokio::test]
    async fn link_ingestion_success_and_failure() {
        let h = harness();
        h.links.insert(
            "https://shop.example/p/1",
            r#"<html><head>
                <meta property="og:title" content="Copper Kettle">
                <meta property="og:image" content="https://shop.example/k.jpg">
                <meta property="product:price:amount" content="320">
            </head></html>"#,
        );

        let routed = h
            .router
            .handle(InboundMessage::text(STAFF, "شوف ده https://shop.example/p/1"))
            .await;
        assert_eq!(routed, Routed::Link);
        let created = h
            .catalog
            .list_products(&Default::default(), Default::default(), Default::default())
            .await
            .unwrap();
        assert_eq!(created.items[0].name, "Copper Kettle");
        assert_eq!(created.items[0].source_type, SourceType::Link);
        assert_eq!(created.items[0].images, vec!["https://shop.example/k.jpg".to_string()]);

        h.router.handle(InboundMessage::text(STAFF, "https://shop.example/missing")).await;
        assert_eq!(last_text_to(&h, STAFF), Notice::ScrapeFailed.text());

        let attempts = h.conversations.attempts_for(STAFF).await.unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[1].status, AttemptStatus::Error);
        assert_eq!(attempts[1].error_code.as_deref(), Some("scrape_failed"));
        // Links never touch the conversation.
        assert!(h.conversations.load(STAFF).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_priced_page_is_not_ingested() {
        let h = harness();
        h.links.insert(
            "https://shop.example/free",
            r#"<meta property="og:title" content="Free Thing">
               <meta property="product:price:amount" content="0">"#,
        );

        let routed = h
            .router
            .handle(InboundMessage::text(STAFF, "https://shop.example/free"))
            .await;
        assert_eq!(routed, Routed::Link);
        assert_eq!(last_text_to(&h, STAFF), Notice::ScrapeFailed.text());

        let listing = h
            .catalog
            .list_products(&Default::default(), Default::default(), Default::default())
            .await
            .unwrap();
        assert_eq!(listing.total, 0);
        let attempts = h.conversations.attempts_for(STAFF).await.unwrap();
        assert_eq!(attempts[0].error_code.as_deref(), Some("scrape_failed"));
    }

    #[tokio::test]
    async fn non_text_message_gets_usage() {
        let h = harness();
        let mut msg = InboundMessage::text(STAFF, "");
        msg.kind = crate::chat::MessageKind::Other;
        msg.text = None;

        assert_eq!(h.router.handle(msg).await, Routed::Instructions);
        assert_eq!(last_text_to(&h, STAFF), Notice::Usage.text());
    }
}
