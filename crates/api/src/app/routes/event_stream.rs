//! Live order feed for the back office.
//!
//! Every committed order event is pushed as an SSE `event` message; idle
//! connections get a `heartbeat` every 15 seconds.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    response::{
        sse::{Event as SseEvent, KeepAlive, Sse},
        IntoResponse,
    },
};
use serde_json::json;
use tokio::sync::mpsc::unbounded_channel;
use tokio_stream::wrappers::UnboundedReceiverStream;

use storefront_events::{Event, EventEnvelope};
use storefront_orders::OrderEvent;

use crate::app::services::AppServices;

/// GET /admin/stream
pub async fn stream_events(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let (tx, rx) = unbounded_channel::<Result<SseEvent, Infallible>>();
    let mut subscription = services.ledger.subscribe();

    tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(Duration::from_secs(15));
        heartbeat.tick().await;
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                _ = heartbeat.tick() => {
                    let beat = SseEvent::default().event("heartbeat").data("{}");
                    if tx.send(Ok(beat)).is_err() {
                        break;
                    }
                }
                next = subscription.recv() => {
                    let Some(envelope) = next else { break };
                    let Some(event) = to_sse(&envelope) else { continue };
                    if tx.send(Ok(event)).is_err() {
                        break;
                    }
                    heartbeat.reset();
                }
            }
        }
    });

    Sse::new(UnboundedReceiverStream::new(rx))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
        .into_response()
}

fn to_sse(envelope: &EventEnvelope<OrderEvent>) -> Option<SseEvent> {
    let event = envelope.payload();
    let data = json!({
        "event_id": envelope.event_id().to_string(),
        "aggregate_id": envelope.aggregate_id().to_string(),
        "aggregate_type": envelope.aggregate_type(),
        "sequence_number": envelope.sequence_number(),
        "event_type": event.event_type(),
        "order_number": event.order_number(),
        "occurred_at": event.occurred_at().to_rfc3339(),
        "payload": event,
    });
    let data = serde_json::to_string(&data).ok()?;
    Some(SseEvent::default().event("event").data(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use storefront_core::OrderId;
    use storefront_orders::{ConfirmationSent, OrderNumber};

    #[test]
    fn envelopes_render_as_sse_events() {
        let order_id = OrderId::new();
        let envelope = EventEnvelope::new(
            *order_id.as_uuid(),
            "orders.order",
            2,
            OrderEvent::ConfirmationSent(ConfirmationSent {
                order_id,
                order_number: OrderNumber::new(3).unwrap(),
                occurred_at: Utc::now(),
            }),
        );
        assert!(to_sse(&envelope).is_some());
    }
}
