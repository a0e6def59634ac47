//! Change notifications published after an order commits.
//!
//! Delivery is fire-and-forget: the intake transaction never waits on, and
//! is never rolled back by, anything in this module. Publish failures are
//! logged and swallowed.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};
use uuid::Uuid;

/// Events describing a committed state change, one per dashboard topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    NewOrder {
        order_id: Uuid,
        order_date: NaiveDate,
        user_id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    RevenueUpdate {
        order_date: NaiveDate,
        order_amount: Decimal,
    },
    #[serde(rename_all = "camelCase")]
    SalesUpdate {
        order_id: Uuid,
        total_amount: Decimal,
    },
}

impl Event {
    /// Topic the event is published under, as consumed by the dashboard
    /// subscribers.
    pub fn topic(&self) -> &'static str {
        match self {
            Event::NewOrder { .. } => "ecommerce/new-order",
            Event::RevenueUpdate { .. } => "ecommerce/revenue-update",
            Event::SalesUpdate { .. } => "ecommerce/sales-update",
        }
    }

    pub fn payload(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Queues an event for publication.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel and re-broadcasts each event to whatever
/// dashboard subscribers are currently listening. A send with no active
/// receivers is not an error.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, subscribers: broadcast::Sender<Event>) {
    info!("Starting change notifier loop");

    while let Some(event) = rx.recv().await {
        info!(topic = event.topic(), payload = %event.payload(), "Publishing dashboard update");

        if subscribers.send(event).is_err() {
            debug!("No active dashboard subscribers; update dropped");
        }
    }

    info!("Event channel closed; change notifier stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn topics_match_the_dashboard_contract() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let new_order = Event::NewOrder {
            order_id: Uuid::new_v4(),
            order_date: date,
            user_id: Uuid::new_v4(),
        };
        let revenue = Event::RevenueUpdate {
            order_date: date,
            order_amount: dec!(99.50),
        };
        let sales = Event::SalesUpdate {
            order_id: Uuid::new_v4(),
            total_amount: dec!(99.50),
        };

        assert_eq!(new_order.topic(), "ecommerce/new-order");
        assert_eq!(revenue.topic(), "ecommerce/revenue-update");
        assert_eq!(sales.topic(), "ecommerce/sales-update");
    }

    #[test]
    fn payload_uses_camel_case_fields() {
        let event = Event::RevenueUpdate {
            order_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            order_amount: dec!(150),
        };
        let payload = event.payload();
        assert!(payload["revenueUpdate"]["orderAmount"].is_string());
        assert_eq!(payload["revenueUpdate"]["orderDate"], "2025-03-01");
    }

    #[tokio::test]
    async fn broadcast_reaches_subscribers() {
        let (tx, rx) = mpsc::channel(8);
        let (btx, mut brx) = broadcast::channel(8);
        tokio::spawn(process_events(rx, btx));

        let sender = EventSender::new(tx);
        sender
            .send(Event::SalesUpdate {
                order_id: Uuid::new_v4(),
                total_amount: dec!(10),
            })
            .await
            .unwrap();

        let received = brx.recv().await.unwrap();
        assert_eq!(received.topic(), "ecommerce/sales-update");
    }
}
