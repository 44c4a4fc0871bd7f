//! Row structs for the `records` table.

pub mod record;
