// src/models/mod.rs
pub mod badge;
pub mod registry;
