//! Read-only projections over the rollup store. These never trigger writes;
//! they group and filter existing rollup rows by calendar year.

use crate::{
    db::DbPool,
    entities::{revenue, sales_performance},
    errors::ServiceError,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Serialize, Deserialize)]
pub struct TotalRevenueRecord {
    pub date: NaiveDate,
    pub total_revenue: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevenuePerOrderRecord {
    pub date: NaiveDate,
    pub average_revenue_per_order: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RevenueGrowthRecord {
    pub date: NaiveDate,
    pub revenue_growth_rate: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TotalCostRecord {
    pub date: NaiveDate,
    pub total_cost: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CostPerOrderRecord {
    pub date: NaiveDate,
    pub average_cost_per_order: Decimal,
}

#[derive(Clone)]
pub struct RevenueReportService {
    db_pool: Arc<DbPool>,
}

impl RevenueReportService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn total_revenue_in_year(
        &self,
        year: i32,
    ) -> Result<Vec<TotalRevenueRecord>, ServiceError> {
        self.total_revenue_in_range(year, year).await
    }

    #[instrument(skip(self))]
    pub async fn total_revenue_in_range(
        &self,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<TotalRevenueRecord>, ServiceError> {
        let rows = self.revenues_between(start_year, end_year).await?;
        Ok(rows
            .into_iter()
            .map(|r| TotalRevenueRecord {
                date: r.date,
                total_revenue: r.total_revenue,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn revenue_per_order_in_year(
        &self,
        year: i32,
    ) -> Result<Vec<RevenuePerOrderRecord>, ServiceError> {
        self.revenue_per_order_in_range(year, year).await
    }

    #[instrument(skip(self))]
    pub async fn revenue_per_order_in_range(
        &self,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<RevenuePerOrderRecord>, ServiceError> {
        let rows = self.revenues_between(start_year, end_year).await?;
        Ok(rows
            .into_iter()
            .map(|r| RevenuePerOrderRecord {
                date: r.date,
                average_revenue_per_order: r.average_revenue_per_order,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn revenue_growth_in_year(
        &self,
        year: i32,
    ) -> Result<Vec<RevenueGrowthRecord>, ServiceError> {
        self.revenue_growth_in_range(year, year).await
    }

    #[instrument(skip(self))]
    pub async fn revenue_growth_in_range(
        &self,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<RevenueGrowthRecord>, ServiceError> {
        let rows = self.revenues_between(start_year, end_year).await?;
        Ok(rows
            .into_iter()
            .map(|r| RevenueGrowthRecord {
                date: r.date,
                revenue_growth_rate: r.revenue_growth_rate,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn total_cost_in_year(
        &self,
        year: i32,
    ) -> Result<Vec<TotalCostRecord>, ServiceError> {
        self.total_cost_in_range(year, year).await
    }

    #[instrument(skip(self))]
    pub async fn total_cost_in_range(
        &self,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<TotalCostRecord>, ServiceError> {
        let rows = self.revenues_between(start_year, end_year).await?;
        Ok(rows
            .into_iter()
            .map(|r| TotalCostRecord {
                date: r.date,
                total_cost: r.total_cost,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn cost_per_order_in_year(
        &self,
        year: i32,
    ) -> Result<Vec<CostPerOrderRecord>, ServiceError> {
        self.cost_per_order_in_range(year, year).await
    }

    #[instrument(skip(self))]
    pub async fn cost_per_order_in_range(
        &self,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<CostPerOrderRecord>, ServiceError> {
        let rows = self.revenues_between(start_year, end_year).await?;
        Ok(rows
            .into_iter()
            .map(|r| CostPerOrderRecord {
                date: r.date,
                average_cost_per_order: r.average_cost_per_order,
            })
            .collect())
    }

    /// Sales-performance rollups, oldest first, as consumed by the
    /// dashboard overview.
    #[instrument(skip(self))]
    pub async fn list_sales_performances(
        &self,
    ) -> Result<Vec<sales_performance::Model>, ServiceError> {
        let db = &*self.db_pool;
        let rows = sales_performance::Entity::find()
            .order_by_asc(sales_performance::Column::Date)
            .all(db)
            .await?;
        Ok(rows)
    }

    /// Rollup rows whose dates fall within the inclusive year range,
    /// oldest first. A range with no rows yields an empty vec.
    async fn revenues_between(
        &self,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<revenue::Model>, ServiceError> {
        let (from, to) = year_bounds(start_year, end_year)?;
        let db = &*self.db_pool;
        let rows = revenue::Entity::find()
            .filter(revenue::Column::Date.between(from, to))
            .order_by_asc(revenue::Column::Date)
            .all(db)
            .await?;
        Ok(rows)
    }
}

fn year_bounds(start_year: i32, end_year: i32) -> Result<(NaiveDate, NaiveDate), ServiceError> {
    if end_year < start_year {
        return Err(ServiceError::ValidationError(format!(
            "End year {} must not precede start year {}",
            end_year, start_year
        )));
    }
    let from = NaiveDate::from_ymd_opt(start_year, 1, 1)
        .ok_or_else(|| ServiceError::ValidationError(format!("Invalid year: {}", start_year)))?;
    let to = NaiveDate::from_ymd_opt(end_year, 12, 31)
        .ok_or_else(|| ServiceError::ValidationError(format!("Invalid year: {}", end_year)))?;
    Ok((from, to))
}
