// PharmaLens - core/mod.rs
//
// Core business logic layer.
// Dependencies: data-handling crates only (serde, chrono, csv, regex).
// Must NOT depend on: ui, platform, app, or any file/network I/O.

pub mod aggregate;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod views;
