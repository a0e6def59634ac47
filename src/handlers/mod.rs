pub mod health;
pub mod inventory;
pub mod orders;
pub mod reports;
