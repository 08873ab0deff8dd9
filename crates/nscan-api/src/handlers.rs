//! HTTP handlers.

pub mod health;
pub mod patients;
pub mod predict;

pub use health::{health, ready};
pub use patients::get_patient;
pub use predict::predict;
