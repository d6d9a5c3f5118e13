// PharmaLens - app/mod.rs
//
// Application layer: dataset loading, session state, dashboard rendering
// and session persistence.
// Dependencies: core, platform.
// Must NOT depend on: ui.

pub mod dataset;
pub mod render;
pub mod session;
pub mod state;
