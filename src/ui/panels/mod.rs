// PharmaLens - ui/panels/mod.rs

pub mod about;
pub mod analysis;
pub mod filters;
pub mod list;
pub mod load_summary;
pub mod map;
