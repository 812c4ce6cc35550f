// src/scrape/mod.rs
pub mod extract;
pub mod fetch;
pub mod types;
