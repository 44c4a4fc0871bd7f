//! Domain layer for the library offense records service.
//!
//! This crate has no database or HTTP dependencies. Storage is reached only
//! through the [`store::RecordStore`] trait so every component here can be
//! driven by the in-memory store in tests.

pub mod collection;
pub mod confirm;
pub mod csv_export;
pub mod editor;
pub mod error;
pub mod grid;
pub mod manager;
pub mod record;
pub mod row;
pub mod schema;
pub mod session;
pub mod store;
pub mod types;
