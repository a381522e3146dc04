//! Dashboard routes - order table, payables cards, report and refresh

pub mod api;
pub mod page;

pub use api::{api_refresh, api_report};
pub use page::page_dashboard;
