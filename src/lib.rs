pub mod errors;
pub mod http;
pub mod models;
pub mod schedule;
pub mod store;

pub use errors::{AppError, AppResult};
