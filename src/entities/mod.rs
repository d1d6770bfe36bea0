//! SeaORM entity models for the durable store.

pub mod store_entry;
