mod cancellation;
mod error;
pub mod filtering;
pub mod models;
pub mod ports;
pub mod services;
mod store;
pub mod summary;

pub use cancellation::*;
pub use error::*;
pub use store::*;
