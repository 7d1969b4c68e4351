//! Inventory domain module.
//!
//! Pure stock arithmetic for reservations: the decision of whether a
//! reservation fits and what the product looks like afterwards. Serializing
//! concurrent reservations is the infrastructure's job.

pub mod stock;

pub use stock::{Reservation, StockLevel};
