pub mod inventory;
pub mod order;
pub mod order_item;
pub mod product;
pub mod revenue;
pub mod sales_performance;
pub mod user;
