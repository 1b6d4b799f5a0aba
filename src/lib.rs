pub mod error;
pub mod types;

pub mod collection;
pub mod config;
pub mod database;
pub mod gateway;
pub mod index;
pub mod logging;
pub mod query;
pub mod reactive;
pub mod schema;
pub mod storage;

pub use config::{GatewayConfig, StorageLocation};
pub use database::{Collection, Database};
pub use error::{Result, WalletDbError};
pub use gateway::{Wallet, WalletGateway};
pub use reactive::{ChangeEvent, ChangeOperation};
