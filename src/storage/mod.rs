pub mod adapter;
pub mod sqlite;
pub mod traits;
