pub mod node;
pub mod validate;
