//! Cost routes - per-item cost overrides

pub mod api;

pub use api::api_save_cost;
