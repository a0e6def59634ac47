use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Daily sales rollup, one row per calendar date with at least one order.
/// Recomputed from the order ledger inside the intake transaction; see
/// `services::rollups`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales_performances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub date: Date,
    pub total_orders: i32,
    pub average_order_value: Decimal,
    pub count_of_ordered_users: i32,
    /// Registered-user count at write time, not scoped to the date.
    pub count_of_users: i32,
    pub count_of_units_sold: i32,
    pub most_ordered_product: String,
    pub sales_growth_rate: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
