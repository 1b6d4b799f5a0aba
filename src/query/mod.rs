pub mod execute;
pub mod operators;
pub mod types;
