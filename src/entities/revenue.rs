use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Daily revenue rollup, one row per calendar date with at least one order.
///
/// `total_cost` is a whole-catalog inventory valuation (stock level times
/// current unit price) taken at write time, not a date-scoped cost of
/// goods sold.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "revenues")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub date: Date,
    pub total_revenue: Decimal,
    pub average_revenue_per_order: Decimal,
    pub total_cost: Decimal,
    pub average_cost_per_order: Decimal,
    pub revenue_growth_rate: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
