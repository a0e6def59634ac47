use crate::{
    db::DbPool,
    entities::{order, order_item},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{inventory::InventoryService, rollups},
};
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Bounded retry budget for transient storage conflicts.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    /// Calendar date of the order; defaults to the current UTC date.
    pub order_date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "At least one item is required"))]
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderItem {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Price captured at order time; stored as a historical snapshot.
    pub unit_price: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_date: NaiveDate,
    pub transaction_reference: String,
    pub order_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Order intake orchestrator: stock reservation, ledger append, and rollup
/// recomputation as one atomic unit, followed by best-effort change
/// notification after the commit.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    inventory: InventoryService,
    event_sender: Option<Arc<EventSender>>,
    /// Serializes intakes per calendar date; the rollup
    /// read-recompute-write cycle loses updates otherwise.
    date_locks: Arc<DashMap<NaiveDate, Arc<Mutex<()>>>>,
}

impl OrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        inventory: InventoryService,
        event_sender: Option<Arc<EventSender>>,
    ) -> Self {
        Self {
            db_pool,
            inventory,
            event_sender,
            date_locks: Arc::new(DashMap::new()),
        }
    }

    /// Creates an order: reserves stock for every line item, appends the
    /// order and its items to the ledger, and refreshes both daily rollups,
    /// all in one transaction. Notification failures never fail the order.
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        for item in &request.items {
            if item.quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "Quantity for product {} must be positive",
                    item.product_id
                )));
            }
            if item.unit_price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Unit price for product {} must be positive",
                    item.product_id
                )));
            }
        }

        let order_date = request.order_date.unwrap_or_else(|| Utc::now().date_naive());

        let date_lock = self.date_lock(order_date);
        let result = {
            let _guard = date_lock.lock().await;

            let mut attempt = 0;
            loop {
                attempt += 1;
                match self.commit_order(&request, order_date).await {
                    Ok(result) => break Ok(result),
                    Err(e) if e.is_transient_conflict() => {
                        if attempt >= MAX_COMMIT_ATTEMPTS {
                            break Err(retries_exhausted(e));
                        }
                        warn!(attempt, error = %e, "Order commit hit a transient conflict; retrying");
                    }
                    Err(e) => break Err(e),
                }
            }
        };
        drop(date_lock);
        self.release_date_lock(order_date);

        let (saved_order, saved_items) = result?;

        info!(
            order_id = %saved_order.id,
            order_date = %order_date,
            order_amount = %saved_order.order_amount,
            "Order created"
        );

        self.publish_change_events(&saved_order).await;

        Ok(Self::to_response(saved_order, saved_items))
    }

    /// Lock serializing intakes for one calendar date.
    fn date_lock(&self, date: NaiveDate) -> Arc<Mutex<()>> {
        self.date_locks
            .entry(date)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Evicts the date's lock entry once no task holds it. A waiter still
    /// holding its clone keeps the entry alive; the map never grows beyond
    /// the dates currently in flight.
    fn release_date_lock(&self, date: NaiveDate) {
        self.date_locks
            .remove_if(&date, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// One attempt at the atomic unit of work. The transaction rolls back
    /// on drop if any step fails, undoing every stock decrement and any
    /// rollup write.
    async fn commit_order(
        &self,
        request: &CreateOrderRequest,
        order_date: NaiveDate,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await?;

        for item in &request.items {
            self.inventory
                .reserve(&txn, item.product_id, item.quantity)
                .await?;
        }

        let order_amount: Decimal = request
            .items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity))
            .sum();

        let order_id = Uuid::new_v4();
        let saved_order = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(request.user_id),
            order_date: Set(order_date),
            transaction_reference: Set(new_transaction_reference()),
            order_amount: Set(order_amount),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        let mut saved_items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let saved = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(item.product_id),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
            }
            .insert(&txn)
            .await?;
            saved_items.push(saved);
        }

        rollups::refresh_for_date(&txn, order_date, &saved_items).await?;

        txn.commit().await?;

        Ok((saved_order, saved_items))
    }

    /// Fire-and-forget dashboard notifications, published only after the
    /// commit. Failures are logged and swallowed.
    async fn publish_change_events(&self, saved_order: &order::Model) {
        let Some(sender) = &self.event_sender else {
            return;
        };

        let events = [
            Event::NewOrder {
                order_id: saved_order.id,
                order_date: saved_order.order_date,
                user_id: saved_order.user_id,
            },
            Event::RevenueUpdate {
                order_date: saved_order.order_date,
                order_amount: saved_order.order_amount,
            },
            Event::SalesUpdate {
                order_id: saved_order.id,
                total_amount: saved_order.order_amount,
            },
        ];

        for event in events {
            if let Err(e) = sender.send(event).await {
                warn!(order_id = %saved_order.id, error = %e, "Failed to publish change notification");
            }
        }
    }

    /// Retrieves a single order with its items.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;

        let found = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order with ID {} not found", order_id))
            })?;

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(db)
            .await?;

        Ok(Self::to_response(found, items))
    }

    /// Lists all orders with their items, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;
        let rows = order::Entity::find()
            .find_with_related(order_item::Entity)
            .all(db)
            .await?;
        Ok(Self::to_sorted_responses(rows))
    }

    /// Lists one user's orders with their items, newest first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_orders_by_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;
        let rows = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .find_with_related(order_item::Entity)
            .all(db)
            .await?;
        Ok(Self::to_sorted_responses(rows))
    }

    fn to_sorted_responses(
        rows: Vec<(order::Model, Vec<order_item::Model>)>,
    ) -> Vec<OrderResponse> {
        let mut responses: Vec<OrderResponse> = rows
            .into_iter()
            .map(|(o, items)| Self::to_response(o, items))
            .collect();
        responses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        responses
    }

    fn to_response(model: order::Model, items: Vec<order_item::Model>) -> OrderResponse {
        OrderResponse {
            id: model.id,
            user_id: model.user_id,
            order_date: model.order_date,
            transaction_reference: model.transaction_reference,
            order_amount: model.order_amount,
            created_at: model.created_at,
            items: items
                .into_iter()
                .map(|i| OrderItemResponse {
                    id: i.id,
                    product_id: i.product_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                })
                .collect(),
        }
    }
}

fn new_transaction_reference() -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("TXN-{}", &token[..12])
}

/// A transient conflict that survived the whole retry budget is surfaced
/// as a `Conflict`, not as the underlying storage error.
fn retries_exhausted(last: ServiceError) -> ServiceError {
    ServiceError::Conflict(format!(
        "Order commit kept conflicting after {} attempts: {}",
        MAX_COMMIT_ATTEMPTS, last
    ))
}
