//! Per-order display rows joining cached orders with stored costs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::CoreResult;
use crate::models::{is_return_status, BreakdownLine, CostRecord, Customer, FinanceSummary, Order, OrderItem};
use crate::money::{checked_sum, format_money, overflow, plain_amount};

/// One item row of the order detail modal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemView {
    pub key: String,
    pub item_title: String,
    pub quantity: u32,
    pub tracking_number: String,
    pub status: String,
    /// Stored per-unit product cost, plain two-decimal form
    pub product_cost: String,
    /// Stored per-unit packaging cost, plain two-decimal form
    pub packaging: String,
    pub vendor: String,
    pub needs_cost: bool,
    pub is_returned: bool,
    /// Product cost counted against the vendor: zero when returned
    pub effective_product_cost: Decimal,
    pub packaging_cost: Decimal,
}

impl ItemView {
    /// What this item adds to its vendor's liability
    pub fn liability(&self) -> CoreResult<Decimal> {
        self.effective_product_cost
            .checked_add(self.packaging_cost)
            .ok_or_else(overflow)
    }
}

/// One row of the order table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub order_id: String,
    pub order_date: String,
    pub customer: Customer,
    pub price: String,
    pub statuses: Vec<String>,
    pub is_returned: bool,
    pub paid_status: String,
    pub statement: String,
    pub invoice_amount: String,
    pub invoice_breakdown: Vec<BreakdownLine>,
    pub product_cost_total: String,
    pub packaging_total: String,
    pub net_profit: String,
    pub net_profit_num: Decimal,
    pub net_received: Decimal,
    pub items_list: Vec<ItemView>,
}

impl OrderView {
    pub fn is_paid(&self) -> bool {
        self.paid_status == crate::models::STATUS_PAID
    }

    pub fn needs_cost(&self) -> bool {
        self.items_list.iter().any(|i| i.needs_cost)
    }
}

/// Builds views against one snapshot of the cost overrides
pub struct ViewBuilder<'a> {
    costs: &'a HashMap<String, CostRecord>,
    currency: &'a str,
    default_vendor: &'a str,
}

impl<'a> ViewBuilder<'a> {
    pub fn new(costs: &'a HashMap<String, CostRecord>, currency: &'a str, default_vendor: &'a str) -> Self {
        Self {
            costs,
            currency,
            default_vendor,
        }
    }

    pub fn item(&self, item: &OrderItem, order_returned: bool) -> CoreResult<ItemView> {
        let record = self.costs.get(&item.key);
        let unit_cost = record.map_or(Decimal::ZERO, |r| r.product_cost);
        let unit_packaging = record.map_or(Decimal::ZERO, |r| r.packaging);
        let vendor = record
            .map(|r| r.vendor.trim())
            .filter(|v| !v.is_empty())
            .unwrap_or(self.default_vendor)
            .to_string();

        let is_returned = order_returned || is_return_status(&item.status);
        let quantity = Decimal::from(item.quantity);
        let effective_product_cost = if is_returned {
            Decimal::ZERO
        } else {
            unit_cost.checked_mul(quantity).ok_or_else(overflow)?
        };
        let packaging_cost = unit_packaging.checked_mul(quantity).ok_or_else(overflow)?;

        Ok(ItemView {
            key: item.key.clone(),
            item_title: item.title.clone(),
            quantity: item.quantity,
            tracking_number: item.tracking_number.clone(),
            status: item.status.clone(),
            product_cost: plain_amount(unit_cost),
            packaging: plain_amount(unit_packaging),
            vendor,
            needs_cost: unit_cost <= Decimal::ZERO,
            is_returned,
            effective_product_cost,
            packaging_cost,
        })
    }

    /// View of one order; `finance` falls back to the cached summary, then to "Not Paid"
    pub fn order(&self, order: &Order, finance: Option<&FinanceSummary>) -> CoreResult<OrderView> {
        let fallback;
        let finance = match finance.or(order.finance.as_ref()) {
            Some(summary) => summary,
            None => {
                fallback = FinanceSummary::not_paid(self.currency);
                &fallback
            }
        };

        let is_returned = order.is_returned();
        let items_list = order
            .items
            .iter()
            .map(|i| self.item(i, is_returned))
            .collect::<CoreResult<Vec<ItemView>>>()?;

        let product_cost = checked_sum(items_list.iter().map(|i| i.effective_product_cost))?;
        let packaging = checked_sum(items_list.iter().map(|i| i.packaging_cost))?;
        let net_profit = finance
            .net_total
            .checked_sub(product_cost)
            .and_then(|n| n.checked_sub(packaging))
            .ok_or_else(overflow)?;

        Ok(OrderView {
            order_id: order.order_id.clone(),
            order_date: order.order_date.to_string(),
            customer: order.customer.clone(),
            price: format_money(order.price, self.currency),
            statuses: order.statuses.clone(),
            is_returned,
            paid_status: finance.paid_status.clone(),
            statement: finance.statement.clone(),
            invoice_amount: finance.invoice_amount.clone(),
            invoice_breakdown: finance.breakdown.clone(),
            product_cost_total: format_money(product_cost, self.currency),
            packaging_total: format_money(packaging, self.currency),
            net_profit: format_money(net_profit, self.currency),
            net_profit_num: net_profit,
            net_received: finance.net_total,
            items_list,
        })
    }
}
