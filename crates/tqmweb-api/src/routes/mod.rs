//! Route modules for the API server
//!
//! - dashboard: the order/payables page, JSON report and refresh
//! - costs: per-item cost overrides
//! - payments: vendor payment recording and history
//!
//! Each module has a mod.rs with its exports; api.rs holds JSON endpoints and
//! page.rs full-page rendering.

pub mod costs;
pub mod dashboard;
pub mod payments;

use serde::Deserialize;
use tqmweb_core::DateWindow;

/// `?from=YYYY-MM-DD&to=YYYY-MM-DD`; both optional
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl WindowQuery {
    pub fn window(&self) -> DateWindow {
        DateWindow::from_query(self.from.as_deref(), self.to.as_deref())
    }
}
