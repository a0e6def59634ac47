use rust_decimal::Decimal;
use sales_dashboard_api::{
    db::{self, DbConfig},
    entities::{inventory, product, user},
    events::{process_events, Event, EventSender},
    services::{
        inventory::InventoryService, orders::OrderService, reports::RevenueReportService,
    },
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

pub struct TestApp {
    pub db: Arc<DatabaseConnection>,
    pub orders: OrderService,
    pub inventory: InventoryService,
    pub reports: RevenueReportService,
    pub events: broadcast::Receiver<Event>,
}

/// Fresh in-memory database with migrations applied and the full service
/// stack wired up. A single pooled connection keeps every statement on the
/// same in-memory database.
pub async fn setup() -> TestApp {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let pool = db::establish_connection_with_config(&config)
        .await
        .expect("db connect");
    db::run_migrations(&pool).await.expect("migrations");
    let db = Arc::new(pool);

    let (event_tx, event_rx) = mpsc::channel(64);
    let (subscriber_tx, subscriber_rx) = broadcast::channel(64);
    tokio::spawn(process_events(event_rx, subscriber_tx));
    let sender = EventSender::new(event_tx);

    let inventory = InventoryService::new(db.clone());
    let orders = OrderService::new(db.clone(), inventory.clone(), Some(Arc::new(sender)));
    let reports = RevenueReportService::new(db.clone());

    TestApp {
        db,
        orders,
        inventory,
        reports,
        events: subscriber_rx,
    }
}

pub async fn seed_user(db: &DatabaseConnection, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    user::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        email: Set(format!("{}@example.com", id.simple())),
        role: Set("customer".to_string()),
    }
    .insert(db)
    .await
    .expect("seed user");
    id
}

pub async fn seed_product(
    db: &DatabaseConnection,
    name: &str,
    price: Decimal,
    stock_level: i32,
    reorder_level: i32,
) -> Uuid {
    let product_id = Uuid::new_v4();
    product::ActiveModel {
        id: Set(product_id),
        name: Set(name.to_string()),
        category: Set("general".to_string()),
        price: Set(price),
        description: Set(None),
        image_url: Set(None),
    }
    .insert(db)
    .await
    .expect("seed product");

    inventory::ActiveModel {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        stock_level: Set(stock_level),
        reorder_level: Set(reorder_level),
    }
    .insert(db)
    .await
    .expect("seed inventory");

    product_id
}

pub async fn stock_of(db: &DatabaseConnection, product_id: Uuid) -> i32 {
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
    inventory::Entity::find()
        .filter(inventory::Column::ProductId.eq(product_id))
        .one(db)
        .await
        .expect("stock query")
        .expect("inventory row")
        .stock_level
}
