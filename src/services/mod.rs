pub mod inventory;
pub mod orders;
pub mod reports;
pub mod rollups;
