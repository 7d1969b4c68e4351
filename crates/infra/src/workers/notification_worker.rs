use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use storefront_events::{EventEnvelope, Subscription};
use storefront_orders::OrderEvent;

use crate::notifier::OrderNotifier;

/// Handle to stop and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.join.await;
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Sends confirmation and group alert for every placed order.
///
/// Events arrive at least once; the notifier's flag checks make repeats
/// harmless.
#[derive(Debug)]
pub struct NotificationWorker;

impl NotificationWorker {
    pub fn spawn(
        notifier: Arc<OrderNotifier>,
        events: Subscription<EventEnvelope<OrderEvent>>,
    ) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let join = tokio::spawn(worker_loop(notifier, events, shutdown_rx));
        WorkerHandle {
            shutdown: Some(shutdown_tx),
            join,
        }
    }
}

async fn worker_loop(
    notifier: Arc<OrderNotifier>,
    mut events: Subscription<EventEnvelope<OrderEvent>>,
    mut shutdown: oneshot::Receiver<()>,
) {
    info!("notification worker started");
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            next = events.recv() => {
                let Some(envelope) = next else { break };
                let OrderEvent::OrderPlaced(placed) = envelope.payload() else {
                    continue;
                };
                match notifier.notify(placed.order_number).await {
                    Ok(report) => debug!(?report, "order notifications processed"),
                    Err(err) => {
                        warn!(order_number = %placed.order_number, error = %err, "notification handling failed")
                    }
                }
            }
        }
    }
    info!("notification worker stopped");
}
