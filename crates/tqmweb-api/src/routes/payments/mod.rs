//! Payment routes - vendor payment recording and history

pub mod api;

pub use api::{api_get_payments, api_record_payment};
