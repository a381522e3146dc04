//! Report structures for the dashboard and JSON API

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CoreResult;
use crate::money::{checked_sum, format_money, overflow};
use crate::view::OrderView;

/// Liability and payments for one vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorLine {
    pub vendor: String,
    pub liability: Decimal,
    pub liability_fmt: String,
    pub paid: Decimal,
    pub paid_fmt: String,
    pub net_payable: Decimal,
    pub net_payable_fmt: String,
}

/// Header card figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub vendor_lines: Vec<VendorLine>,
    pub vendor_cost_total: String,
    pub vendor_cost_total_raw: Decimal,
    pub total_paid: String,
    pub total_paid_raw: Decimal,
    pub net_payables: String,
    pub net_payables_raw: Decimal,
    pub net_profit_collected: String,
    pub net_profit_collected_raw: Decimal,
    pub order_count: usize,
    pub paid_order_count: usize,
    pub needs_cost_count: usize,
}

/// Full report for one date window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub from: String,
    pub to: String,
    pub description: String,
    /// When the order cache was last filled, RFC 3339
    pub loaded_at: Option<String>,
    pub orders: Vec<OrderView>,
    pub stats: DashboardStats,
    pub vendors: Vec<String>,
    pub currency: String,
}

/// Payment history row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEntry {
    pub date: String,
    pub vendor: String,
    pub amount_fmt: String,
}

/// Sum liabilities over `orders` and settle them against `payments`
///
/// `vendors` are listed first in their configured order even when zero; any
/// other vendor seen in items or payments follows alphabetically.
pub fn compute_stats(
    orders: &[OrderView],
    payments: &BTreeMap<String, Decimal>,
    vendors: &[String],
    currency: &str,
) -> CoreResult<DashboardStats> {
    let mut liabilities: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut net_profit_collected = Decimal::ZERO;
    let mut paid_order_count = 0;
    let mut needs_cost_count = 0;

    for order in orders {
        for item in &order.items_list {
            let liability = liabilities.entry(item.vendor.as_str()).or_insert(Decimal::ZERO);
            *liability = liability.checked_add(item.liability()?).ok_or_else(overflow)?;
        }
        if order.is_paid() {
            net_profit_collected = net_profit_collected
                .checked_add(order.net_profit_num)
                .ok_or_else(overflow)?;
            paid_order_count += 1;
        }
        if order.needs_cost() {
            needs_cost_count += 1;
        }
    }

    let mut names: Vec<&str> = vendors.iter().map(|v| v.as_str()).collect();
    let mut others: Vec<&str> = liabilities
        .keys()
        .copied()
        .chain(payments.keys().map(|v| v.as_str()))
        .filter(|v| !names.contains(v))
        .collect();
    others.sort_unstable();
    others.dedup();
    names.extend(others);

    let vendor_lines = names
        .into_iter()
        .map(|vendor| -> CoreResult<VendorLine> {
            let liability = liabilities.get(vendor).copied().unwrap_or(Decimal::ZERO);
            let paid = payments.get(vendor).copied().unwrap_or(Decimal::ZERO);
            let net_payable = liability.checked_sub(paid).ok_or_else(overflow)?;
            Ok(VendorLine {
                vendor: vendor.to_string(),
                liability,
                liability_fmt: format_money(liability, currency),
                paid,
                paid_fmt: format_money(paid, currency),
                net_payable,
                net_payable_fmt: format_money(net_payable, currency),
            })
        })
        .collect::<CoreResult<Vec<VendorLine>>>()?;

    let vendor_cost_total = checked_sum(vendor_lines.iter().map(|l| l.liability))?;
    let total_paid = checked_sum(vendor_lines.iter().map(|l| l.paid))?;
    let net_payables = checked_sum(vendor_lines.iter().map(|l| l.net_payable))?;

    Ok(DashboardStats {
        vendor_lines,
        vendor_cost_total: format_money(vendor_cost_total, currency),
        vendor_cost_total_raw: vendor_cost_total,
        total_paid: format_money(total_paid, currency),
        total_paid_raw: total_paid,
        net_payables: format_money(net_payables, currency),
        net_payables_raw: net_payables,
        net_profit_collected: format_money(net_profit_collected, currency),
        net_profit_collected_raw: net_profit_collected,
        order_count: orders.len(),
        paid_order_count,
        needs_cost_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, STATUS_NOT_PAID, STATUS_PAID};
    use crate::view::ItemView;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(vendor: &str, product: &str, packaging: &str) -> ItemView {
        ItemView {
            key: "K".to_string(),
            item_title: "Item".to_string(),
            quantity: 1,
            tracking_number: String::new(),
            status: "delivered".to_string(),
            product_cost: product.to_string(),
            packaging: packaging.to_string(),
            vendor: vendor.to_string(),
            needs_cost: dec(product) <= Decimal::ZERO,
            is_returned: false,
            effective_product_cost: dec(product),
            packaging_cost: dec(packaging),
        }
    }

    fn order(paid_status: &str, net_profit: &str, items: Vec<ItemView>) -> OrderView {
        OrderView {
            order_id: "1".to_string(),
            order_date: "2024-01-10".to_string(),
            customer: Customer::default(),
            price: String::new(),
            statuses: vec![],
            is_returned: false,
            paid_status: paid_status.to_string(),
            statement: String::new(),
            invoice_amount: String::new(),
            invoice_breakdown: vec![],
            product_cost_total: String::new(),
            packaging_total: String::new(),
            net_profit: String::new(),
            net_profit_num: dec(net_profit),
            net_received: Decimal::ZERO,
            items_list: items,
        }
    }

    fn vendors() -> Vec<String> {
        vec!["Tick Bags".to_string(), "Sleek Space".to_string()]
    }

    #[test]
    fn test_payables_per_vendor_and_total() {
        let orders = vec![
            order(STATUS_PAID, "500", vec![item("Tick Bags", "200", "30"), item("Sleek Space", "100", "10")]),
            order(STATUS_NOT_PAID, "300", vec![item("Tick Bags", "50", "5")]),
        ];
        let mut payments = BTreeMap::new();
        payments.insert("Tick Bags".to_string(), dec("100"));

        let stats = compute_stats(&orders, &payments, &vendors(), "PKR").unwrap();
        let tick = &stats.vendor_lines[0];
        assert_eq!(tick.vendor, "Tick Bags");
        assert_eq!(tick.liability, dec("285"));
        assert_eq!(tick.net_payable, dec("185"));
        assert_eq!(stats.vendor_lines[1].net_payable, dec("110"));

        let sum: Decimal = stats.vendor_lines.iter().map(|l| l.net_payable).sum();
        assert_eq!(stats.net_payables_raw, sum);
        assert_eq!(stats.net_payables, "PKR 295.00");
        assert_eq!(stats.vendor_cost_total, "PKR 395.00");
        assert_eq!(stats.total_paid, "PKR 100.00");
    }

    #[test]
    fn test_profit_collected_counts_paid_orders_only() {
        let orders = vec![
            order(STATUS_PAID, "500", vec![]),
            order(STATUS_NOT_PAID, "300", vec![]),
            order(STATUS_PAID, "-20", vec![]),
        ];
        let stats = compute_stats(&orders, &BTreeMap::new(), &vendors(), "PKR").unwrap();
        assert_eq!(stats.net_profit_collected_raw, dec("480"));
        assert_eq!(stats.paid_order_count, 2);
        assert_eq!(stats.order_count, 3);
    }

    #[test]
    fn test_vendor_line_order() {
        let orders = vec![order(STATUS_NOT_PAID, "0", vec![item("Zeta", "1", "0"), item("Other", "0", "0")])];
        let mut payments = BTreeMap::new();
        payments.insert("Alpha".to_string(), dec("10"));

        let stats = compute_stats(&orders, &payments, &vendors(), "PKR").unwrap();
        let names: Vec<&str> = stats.vendor_lines.iter().map(|l| l.vendor.as_str()).collect();
        assert_eq!(names, vec!["Tick Bags", "Sleek Space", "Alpha", "Other", "Zeta"]);
        assert_eq!(stats.vendor_lines[2].net_payable, dec("-10"));
        assert_eq!(stats.needs_cost_count, 1);
    }

    #[test]
    fn test_empty_report_lists_configured_vendors() {
        let stats = compute_stats(&[], &BTreeMap::new(), &vendors(), "PKR").unwrap();
        assert_eq!(stats.vendor_lines.len(), 2);
        assert_eq!(stats.net_payables, "PKR 0.00");
    }

    #[test]
    fn test_overflowing_liability_is_an_error() {
        let mut huge = item("Tick Bags", "1", "0");
        huge.effective_product_cost = Decimal::MAX;
        let orders = vec![order(STATUS_NOT_PAID, "0", vec![huge.clone(), huge])];
        let err = compute_stats(&orders, &BTreeMap::new(), &vendors(), "PKR").unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InternalError);
    }
}
