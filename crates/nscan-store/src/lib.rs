//! Relational persistence for classification records.
//!
//! Backed by SQLite through sqlx. Records are insert-only; the patient
//! identifier sequence lives in its own one-row table and is advanced with
//! a single atomic statement so concurrent requests can never mint the
//! same identifier.

pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::RecordStore;
