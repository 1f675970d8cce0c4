pub mod rows;
pub mod schema;
pub mod store;

pub use store::{ResultFilter, Store};
