use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events raised by the order and payment lifecycle. Consumed in-process by
/// `process_events`; there is no external queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    PaymentInitiated {
        order_id: Uuid,
        gateway_order_id: String,
    },
    PaymentSucceeded {
        order_id: Uuid,
        payment_id: String,
    },
    PaymentFailed(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event; delivery is best-effort and never fails the caller's
    /// request path.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.sender.send(event).await {
            warn!("Failed to send event: {}", e);
        }
    }
}

/// Drains the event channel, logging each event. Runs for the lifetime of
/// the process.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderCreated(order_id) => {
                info!(order_id = %order_id, "Order created");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(order_id = %order_id, %old_status, %new_status, "Order status changed");
            }
            Event::PaymentInitiated {
                order_id,
                gateway_order_id,
            } => {
                info!(order_id = %order_id, %gateway_order_id, "Payment initiated");
            }
            Event::PaymentSucceeded {
                order_id,
                payment_id,
            } => {
                info!(order_id = %order_id, %payment_id, "Payment succeeded");
            }
            Event::PaymentFailed(order_id) => {
                warn!(order_id = %order_id, "Payment failed");
            }
        }
    }
}
