use crate::{
    db::DbPool,
    entities::{inventory, product},
    errors::ServiceError,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Inventory row joined with its owning product, as served to the dashboard.
#[derive(Debug, Serialize, Deserialize)]
pub struct InventoryStatus {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_category: String,
    pub stock_level: i32,
    pub reorder_level: i32,
}

/// Service guarding the per-product stock ledger.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Atomically reserves `quantity` units for one order line item.
    ///
    /// The decrement is a single conditional UPDATE guarded by
    /// `stock_level >= quantity`, so concurrent reservations against the
    /// same product serialize at the row and the stock level can never go
    /// negative. Runs on the caller's transaction: if a later line item of
    /// the same order fails, rolling back the transaction undoes this
    /// decrement too.
    pub async fn reserve<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        let result = inventory::Entity::update_many()
            .col_expr(
                inventory::Column::StockLevel,
                Expr::col(inventory::Column::StockLevel).sub(quantity),
            )
            .filter(inventory::Column::ProductId.eq(product_id))
            .filter(inventory::Column::StockLevel.gte(quantity))
            .exec(conn)
            .await?;

        if result.rows_affected > 0 {
            return Ok(());
        }

        // Nothing matched: either the product has no inventory row, or the
        // guard rejected the decrement. Re-read to tell the two apart.
        let existing = inventory::Entity::find()
            .filter(inventory::Column::ProductId.eq(product_id))
            .one(conn)
            .await?;

        match existing {
            None => Err(ServiceError::product_not_found(product_id)),
            Some(row) => {
                let product_name = product::Entity::find_by_id(product_id)
                    .one(conn)
                    .await?
                    .map(|p| p.name)
                    .unwrap_or_else(|| product_id.to_string());
                Err(ServiceError::InsufficientStock {
                    product: product_name,
                    requested: quantity,
                    available: row.stock_level,
                })
            }
        }
    }

    /// Raises a product's stock by its configured reorder quantity.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn restock(&self, product_id: Uuid) -> Result<InventoryStatus, ServiceError> {
        let db = &*self.db_pool;

        let row = inventory::Entity::find()
            .filter(inventory::Column::ProductId.eq(product_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::product_not_found(product_id))?;

        let mut active: inventory::ActiveModel = row.clone().into();
        active.stock_level = Set(row.stock_level + row.reorder_level);
        let updated = active.update(db).await?;

        info!(
            stock_level = updated.stock_level,
            "Restocked product inventory"
        );

        self.get_by_product(product_id).await
    }

    /// Inventory status of a single product.
    pub async fn get_by_product(&self, product_id: Uuid) -> Result<InventoryStatus, ServiceError> {
        let db = &*self.db_pool;

        let pair = inventory::Entity::find()
            .filter(inventory::Column::ProductId.eq(product_id))
            .find_also_related(product::Entity)
            .one(db)
            .await?;

        match pair {
            Some((row, prod)) => Ok(Self::to_status(row, prod)),
            None => Err(ServiceError::product_not_found(product_id)),
        }
    }

    /// Lists the whole inventory ledger.
    pub async fn list_inventory(&self) -> Result<Vec<InventoryStatus>, ServiceError> {
        let db = &*self.db_pool;
        let rows = inventory::Entity::find()
            .find_also_related(product::Entity)
            .all(db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(row, prod)| Self::to_status(row, prod))
            .collect())
    }

    /// Products whose stock has fallen to or below their reorder threshold.
    pub async fn list_low_stock(&self) -> Result<Vec<InventoryStatus>, ServiceError> {
        let db = &*self.db_pool;
        let rows = inventory::Entity::find()
            .filter(
                Expr::col(inventory::Column::StockLevel)
                    .lte(Expr::col(inventory::Column::ReorderLevel)),
            )
            .find_also_related(product::Entity)
            .all(db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(row, prod)| Self::to_status(row, prod))
            .collect())
    }

    fn to_status(row: inventory::Model, prod: Option<product::Model>) -> InventoryStatus {
        let (product_name, product_category) = prod
            .map(|p| (p.name, p.category))
            .unwrap_or_else(|| (row.product_id.to_string(), String::new()));
        InventoryStatus {
            product_id: row.product_id,
            product_name,
            product_category,
            stock_level: row.stock_level,
            reorder_level: row.reorder_level,
        }
    }
}
