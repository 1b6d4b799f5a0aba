pub mod builder;

pub use builder::{collection, CollectionDef};
