//! Domain layer: entry model, configuration model, errors and ports.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{SharedResourceError, SharedResourceResult};
