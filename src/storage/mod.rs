// src/storage/mod.rs
pub mod registry_store;
