//! Daily rollup maintenance for the sales-performance and revenue rows.
//!
//! Both rows are recomputed in full from the canonical order ledger on every
//! intake, inside the intake transaction, rather than incremented in place:
//! the averages, distinct-user count, most-ordered product, and growth rates
//! cannot be maintained correctly by counters alone. Callers serialize
//! concurrent intakes for the same date (see `services::orders`).

use crate::entities::{inventory, order, order_item, product, revenue, sales_performance, user};
use crate::errors::ServiceError;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, Set,
};
use std::collections::{HashMap, HashSet};
use tracing::info;
use uuid::Uuid;

/// Percentage change versus the prior day's value. When there is no prior
/// row, or the prior value is zero, the rate is pinned to 100 — a deliberate
/// edge policy, not a natural result of the formula.
pub(crate) fn growth_rate(current: Decimal, previous: Option<Decimal>) -> Decimal {
    match previous {
        Some(prev) if prev > Decimal::ZERO => {
            (current - prev) / prev * Decimal::ONE_HUNDRED
        }
        _ => Decimal::ONE_HUNDRED,
    }
}

/// Sums quantities per product, preserving first-encounter order so the
/// descending sort below has a stable, documented tie-break.
pub(crate) fn group_quantities(
    items: impl IntoIterator<Item = (Uuid, i32)>,
) -> Vec<(Uuid, i64)> {
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut groups: Vec<(Uuid, i64)> = Vec::new();
    for (product_id, quantity) in items {
        match index.get(&product_id) {
            Some(&i) => groups[i].1 += i64::from(quantity),
            None => {
                index.insert(product_id, groups.len());
                groups.push((product_id, i64::from(quantity)));
            }
        }
    }
    groups
}

/// The product with the highest quantity sum. Ties go to the product that
/// comes first in the descending-quantity ordering, i.e. the one
/// encountered first among the tied group.
pub(crate) fn top_product(groups: &[(Uuid, i64)]) -> Option<Uuid> {
    let mut sorted: Vec<&(Uuid, i64)> = groups.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted.first().map(|(product_id, _)| *product_id)
}

/// Recomputes and upserts both rollup rows for `date` from the order
/// ledger. Must run on the intake transaction so the rollups commit or roll
/// back together with the order itself.
///
/// `current_order_items` are the items of the order being created; they are
/// only consulted as a fallback when the ledger grouping comes up empty.
pub async fn refresh_for_date<C: ConnectionTrait>(
    conn: &C,
    date: NaiveDate,
    current_order_items: &[order_item::Model],
) -> Result<(), ServiceError> {
    let orders = order::Entity::find()
        .filter(order::Column::OrderDate.eq(date))
        .all(conn)
        .await?;

    let total_orders = orders.len() as i32;
    let total_amount: Decimal = orders.iter().map(|o| o.order_amount).sum();
    let ordered_users = orders
        .iter()
        .map(|o| o.user_id)
        .collect::<HashSet<_>>()
        .len() as i32;

    // Point-in-time snapshot of all registered users, not scoped to the date.
    let count_of_users = user::Entity::find().count(conn).await? as i32;

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items = if order_ids.is_empty() {
        Vec::new()
    } else {
        order_item::Entity::find()
            .filter(order_item::Column::OrderId.is_in(order_ids))
            .all(conn)
            .await?
    };

    let units_sold: i64 = items.iter().map(|i| i64::from(i.quantity)).sum();

    let mut groups = group_quantities(items.iter().map(|i| (i.product_id, i.quantity)));
    if groups.is_empty() {
        groups = group_quantities(
            current_order_items
                .iter()
                .map(|i| (i.product_id, i.quantity)),
        );
    }
    let most_ordered_product = match top_product(&groups) {
        Some(product_id) => product::Entity::find_by_id(product_id)
            .one(conn)
            .await?
            .map(|p| p.name)
            .unwrap_or_default(),
        None => String::new(),
    };

    let previous_date = date.checked_sub_days(Days::new(1));

    let previous_sales = match previous_date {
        Some(prev) => sales_performance::Entity::find_by_id(prev).one(conn).await?,
        None => None,
    };
    let sales_growth_rate = growth_rate(
        Decimal::from(total_orders),
        previous_sales.map(|p| Decimal::from(p.total_orders)),
    );

    let average_order_value = if total_orders > 0 {
        total_amount / Decimal::from(total_orders)
    } else {
        Decimal::ZERO
    };

    match sales_performance::Entity::find_by_id(date).one(conn).await? {
        Some(existing) => {
            info!(date = %date, "Updating existing sales performance rollup");
            let mut active: sales_performance::ActiveModel = existing.into();
            active.total_orders = Set(total_orders);
            active.average_order_value = Set(average_order_value);
            active.count_of_ordered_users = Set(ordered_users);
            active.count_of_users = Set(count_of_users);
            active.count_of_units_sold = Set(units_sold as i32);
            active.most_ordered_product = Set(most_ordered_product.clone());
            active.sales_growth_rate = Set(sales_growth_rate);
            active.update(conn).await?;
        }
        None => {
            info!(date = %date, "Creating sales performance rollup");
            sales_performance::ActiveModel {
                date: Set(date),
                total_orders: Set(total_orders),
                average_order_value: Set(average_order_value),
                count_of_ordered_users: Set(ordered_users),
                count_of_users: Set(count_of_users),
                count_of_units_sold: Set(units_sold as i32),
                most_ordered_product: Set(most_ordered_product.clone()),
                sales_growth_rate: Set(sales_growth_rate),
            }
            .insert(conn)
            .await?;
        }
    }

    // Whole-catalog stock valuation at current prices. Deliberately not
    // date-scoped; see the entity doc on `revenues::total_cost`.
    let catalog = product::Entity::find()
        .find_also_related(inventory::Entity)
        .all(conn)
        .await?;
    let total_cost = catalog.iter().fold(Decimal::ZERO, |acc, (prod, inv)| {
        match inv {
            Some(i) => acc + Decimal::from(i.stock_level) * prod.price,
            None => acc,
        }
    });

    let average_revenue_per_order = average_order_value;
    let average_cost_per_order = if total_orders > 0 {
        total_cost / Decimal::from(total_orders)
    } else {
        Decimal::ZERO
    };

    let previous_revenue = match previous_date {
        Some(prev) => revenue::Entity::find_by_id(prev).one(conn).await?,
        None => None,
    };
    let revenue_growth_rate =
        growth_rate(total_amount, previous_revenue.map(|r| r.total_revenue));

    match revenue::Entity::find_by_id(date).one(conn).await? {
        Some(existing) => {
            info!(date = %date, "Updating existing revenue rollup");
            let mut active: revenue::ActiveModel = existing.into();
            active.total_revenue = Set(total_amount);
            active.average_revenue_per_order = Set(average_revenue_per_order);
            active.total_cost = Set(total_cost);
            active.average_cost_per_order = Set(average_cost_per_order);
            active.revenue_growth_rate = Set(revenue_growth_rate);
            active.update(conn).await?;
        }
        None => {
            info!(date = %date, "Creating revenue rollup");
            revenue::ActiveModel {
                date: Set(date),
                total_revenue: Set(total_amount),
                average_revenue_per_order: Set(average_revenue_per_order),
                total_cost: Set(total_cost),
                average_cost_per_order: Set(average_cost_per_order),
                revenue_growth_rate: Set(revenue_growth_rate),
            }
            .insert(conn)
            .await?;
        }
    }

    Ok(())
}
