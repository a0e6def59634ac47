mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::EntityTrait;
use std::time::Duration;
use uuid::Uuid;

use sales_dashboard_api::{
    entities::{order, revenue, sales_performance},
    errors::ServiceError,
    services::orders::{CreateOrderItem, CreateOrderRequest},
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn request(user_id: Uuid, on: NaiveDate, items: Vec<CreateOrderItem>) -> CreateOrderRequest {
    CreateOrderRequest {
        user_id,
        order_date: Some(on),
        items,
    }
}

fn item(product_id: Uuid, quantity: i32, unit_price: Decimal) -> CreateOrderItem {
    CreateOrderItem {
        product_id,
        quantity,
        unit_price,
    }
}

#[tokio::test]
async fn create_order_persists_ledger_and_decrements_stock() {
    let app = common::setup().await;
    let user = common::seed_user(&app.db, "Ada").await;
    let product = common::seed_product(&app.db, "Espresso Machine", dec!(100), 10, 5).await;

    let created = app
        .orders
        .create_order(request(
            user,
            date(2025, 3, 1),
            vec![item(product, 2, dec!(100))],
        ))
        .await
        .expect("order should be accepted");

    assert_eq!(created.user_id, user);
    assert_eq!(created.order_date, date(2025, 3, 1));
    assert_eq!(created.order_amount, dec!(200));
    assert!(created.transaction_reference.starts_with("TXN-"));
    assert_eq!(created.items.len(), 1);
    assert_eq!(created.items[0].quantity, 2);

    assert_eq!(common::stock_of(&app.db, product).await, 8);

    let fetched = app.orders.get_order(created.id).await.unwrap();
    assert_eq!(fetched.order_amount, dec!(200));
    assert_eq!(fetched.items.len(), 1);
}

#[tokio::test]
async fn insufficient_stock_rejects_the_order_and_changes_nothing() {
    let app = common::setup().await;
    let user = common::seed_user(&app.db, "Ada").await;
    let product = common::seed_product(&app.db, "Espresso Machine", dec!(100), 5, 5).await;
    let on = date(2025, 3, 1);

    let result = app
        .orders
        .create_order(request(user, on, vec![item(product, 6, dec!(100))]))
        .await;

    assert_matches!(
        result,
        Err(ServiceError::InsufficientStock {
            requested: 6,
            available: 5,
            ..
        })
    );

    assert_eq!(common::stock_of(&app.db, product).await, 5);
    assert!(order::Entity::find().all(&*app.db).await.unwrap().is_empty());
    assert!(sales_performance::Entity::find_by_id(on)
        .one(&*app.db)
        .await
        .unwrap()
        .is_none());
    assert!(revenue::Entity::find_by_id(on)
        .one(&*app.db)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn failed_line_item_rolls_back_earlier_reservations() {
    let app = common::setup().await;
    let user = common::seed_user(&app.db, "Ada").await;
    let plenty = common::seed_product(&app.db, "Grinder", dec!(50), 10, 5).await;
    let scarce = common::seed_product(&app.db, "Espresso Machine", dec!(100), 1, 5).await;

    let result = app
        .orders
        .create_order(request(
            user,
            date(2025, 3, 1),
            vec![item(plenty, 3, dec!(50)), item(scarce, 2, dec!(100))],
        ))
        .await;

    assert_matches!(result, Err(ServiceError::InsufficientStock { .. }));
    assert_eq!(common::stock_of(&app.db, plenty).await, 10);
    assert_eq!(common::stock_of(&app.db, scarce).await, 1);
    assert!(order::Entity::find().all(&*app.db).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_product_is_rejected_as_not_found() {
    let app = common::setup().await;
    let user = common::seed_user(&app.db, "Ada").await;

    let result = app
        .orders
        .create_order(request(
            user,
            date(2025, 3, 1),
            vec![item(Uuid::new_v4(), 1, dec!(10))],
        ))
        .await;

    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn order_without_items_is_rejected() {
    let app = common::setup().await;
    let user = common::seed_user(&app.db, "Ada").await;

    let result = app
        .orders
        .create_order(request(user, date(2025, 3, 1), vec![]))
        .await;

    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn nonpositive_quantity_is_rejected() {
    let app = common::setup().await;
    let user = common::seed_user(&app.db, "Ada").await;
    let product = common::seed_product(&app.db, "Grinder", dec!(50), 10, 5).await;

    let result = app
        .orders
        .create_order(request(
            user,
            date(2025, 3, 1),
            vec![item(product, 0, dec!(50))],
        ))
        .await;

    assert_matches!(result, Err(ServiceError::ValidationError(_)));
    assert_eq!(common::stock_of(&app.db, product).await, 10);
}

#[tokio::test]
async fn same_day_orders_aggregate_into_one_rollup_pair() {
    let app = common::setup().await;
    let ada = common::seed_user(&app.db, "Ada").await;
    let grace = common::seed_user(&app.db, "Grace").await;
    let machine = common::seed_product(&app.db, "Espresso Machine", dec!(100), 10, 5).await;
    let grinder = common::seed_product(&app.db, "Grinder", dec!(50), 10, 5).await;
    let on = date(2025, 3, 1);

    app.orders
        .create_order(request(ada, on, vec![item(machine, 1, dec!(100))]))
        .await
        .unwrap();
    app.orders
        .create_order(request(grace, on, vec![item(grinder, 1, dec!(50))]))
        .await
        .unwrap();

    let sales = sales_performance::Entity::find_by_id(on)
        .one(&*app.db)
        .await
        .unwrap()
        .expect("sales rollup exists");
    assert_eq!(sales.total_orders, 2);
    assert_eq!(sales.average_order_value, dec!(75));
    assert_eq!(sales.count_of_ordered_users, 2);
    assert_eq!(sales.count_of_users, 2);
    assert_eq!(sales.count_of_units_sold, 2);
    // Ties on quantity resolve to the product seen first in the ledger.
    assert_eq!(sales.most_ordered_product, "Espresso Machine");

    let rev = revenue::Entity::find_by_id(on)
        .one(&*app.db)
        .await
        .unwrap()
        .expect("revenue rollup exists");
    assert_eq!(rev.total_revenue, dec!(150));
    assert_eq!(rev.average_revenue_per_order, dec!(75));

    // Remaining catalog valued at current prices: 9*100 + 9*50.
    assert_eq!(rev.total_cost, dec!(1350));
    assert_eq!(rev.average_cost_per_order, dec!(675));

    assert_eq!(
        sales_performance::Entity::find().all(&*app.db).await.unwrap().len(),
        1
    );
    assert_eq!(revenue::Entity::find().all(&*app.db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn first_day_growth_rates_are_pinned_to_100() {
    let app = common::setup().await;
    let user = common::seed_user(&app.db, "Ada").await;
    let product = common::seed_product(&app.db, "Grinder", dec!(50), 10, 5).await;
    let on = date(2025, 3, 1);

    app.orders
        .create_order(request(user, on, vec![item(product, 1, dec!(50))]))
        .await
        .unwrap();

    let sales = sales_performance::Entity::find_by_id(on)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    let rev = revenue::Entity::find_by_id(on).one(&*app.db).await.unwrap().unwrap();

    assert_eq!(sales.sales_growth_rate, dec!(100));
    assert_eq!(rev.revenue_growth_rate, dec!(100));
}

#[tokio::test]
async fn growth_rates_compare_against_the_prior_day() {
    let app = common::setup().await;
    let user = common::seed_user(&app.db, "Ada").await;
    let product = common::seed_product(&app.db, "Grinder", dec!(50), 100, 5).await;
    let day_one = date(2025, 3, 1);
    let day_two = date(2025, 3, 2);

    // Day one: a single order worth 100.
    app.orders
        .create_order(request(user, day_one, vec![item(product, 2, dec!(50))]))
        .await
        .unwrap();

    // Day two: two orders worth 150 in total.
    app.orders
        .create_order(request(user, day_two, vec![item(product, 2, dec!(50))]))
        .await
        .unwrap();
    app.orders
        .create_order(request(user, day_two, vec![item(product, 1, dec!(50))]))
        .await
        .unwrap();

    let sales = sales_performance::Entity::find_by_id(day_two)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    // 1 order -> 2 orders.
    assert_eq!(sales.sales_growth_rate, dec!(100));

    let rev = revenue::Entity::find_by_id(day_two)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    // 100 -> 150.
    assert_eq!(rev.revenue_growth_rate, dec!(50));
}

#[tokio::test]
async fn concurrent_same_day_orders_are_all_counted() {
    let app = common::setup().await;
    let user = common::seed_user(&app.db, "Ada").await;
    let product = common::seed_product(&app.db, "Grinder", dec!(10), 20, 5).await;
    let on = date(2025, 3, 1);

    let mut handles = Vec::new();
    for _ in 0..6 {
        let orders = app.orders.clone();
        handles.push(tokio::spawn(async move {
            orders
                .create_order(request(user, on, vec![item(product, 1, dec!(10))]))
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("task").expect("order accepted");
    }

    let sales = sales_performance::Entity::find_by_id(on)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sales.total_orders, 6);
    assert_eq!(sales.count_of_units_sold, 6);

    let rev = revenue::Entity::find_by_id(on).one(&*app.db).await.unwrap().unwrap();
    assert_eq!(rev.total_revenue, dec!(60));

    assert_eq!(common::stock_of(&app.db, product).await, 14);
}

#[tokio::test]
async fn most_ordered_product_follows_summed_quantities() {
    let app = common::setup().await;
    let user = common::seed_user(&app.db, "Ada").await;
    let machine = common::seed_product(&app.db, "Espresso Machine", dec!(100), 10, 5).await;
    let grinder = common::seed_product(&app.db, "Grinder", dec!(50), 10, 5).await;
    let on = date(2025, 3, 1);

    app.orders
        .create_order(request(
            user,
            on,
            vec![item(machine, 1, dec!(100)), item(grinder, 3, dec!(50))],
        ))
        .await
        .unwrap();

    let sales = sales_performance::Entity::find_by_id(on)
        .one(&*app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(sales.most_ordered_product, "Grinder");
    assert_eq!(sales.count_of_units_sold, 4);
}

#[tokio::test]
async fn list_orders_by_user_filters_and_sorts_newest_first() {
    let app = common::setup().await;
    let ada = common::seed_user(&app.db, "Ada").await;
    let grace = common::seed_user(&app.db, "Grace").await;
    let product = common::seed_product(&app.db, "Grinder", dec!(50), 20, 5).await;

    let first = app
        .orders
        .create_order(request(ada, date(2025, 3, 1), vec![item(product, 1, dec!(50))]))
        .await
        .unwrap();
    let second = app
        .orders
        .create_order(request(ada, date(2025, 3, 2), vec![item(product, 1, dec!(50))]))
        .await
        .unwrap();
    app.orders
        .create_order(request(grace, date(2025, 3, 2), vec![item(product, 1, dec!(50))]))
        .await
        .unwrap();

    let all = app.orders.list_orders().await.unwrap();
    assert_eq!(all.len(), 3);

    let ada_orders = app.orders.list_orders_by_user(ada).await.unwrap();
    assert_eq!(ada_orders.len(), 2);
    assert_eq!(ada_orders[0].id, second.id);
    assert_eq!(ada_orders[1].id, first.id);
    assert!(ada_orders.iter().all(|o| o.user_id == ada));
}

#[tokio::test]
async fn get_missing_order_is_not_found() {
    let app = common::setup().await;
    let result = app.orders.get_order(Uuid::new_v4()).await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn committed_orders_notify_every_dashboard_topic() {
    let mut app = common::setup().await;
    let user = common::seed_user(&app.db, "Ada").await;
    let product = common::seed_product(&app.db, "Grinder", dec!(50), 10, 5).await;

    app.orders
        .create_order(request(
            user,
            date(2025, 3, 1),
            vec![item(product, 1, dec!(50))],
        ))
        .await
        .unwrap();

    let mut topics = Vec::new();
    for _ in 0..3 {
        let event = tokio::time::timeout(Duration::from_secs(1), app.events.recv())
            .await
            .expect("notification within a second")
            .expect("channel open");
        topics.push(event.topic());
    }

    assert_eq!(
        topics,
        vec![
            "ecommerce/new-order",
            "ecommerce/revenue-update",
            "ecommerce/sales-update"
        ]
    );
}
