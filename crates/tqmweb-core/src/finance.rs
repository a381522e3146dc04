//! Finance resolution: settlement rows → net received and a labeled breakdown

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tqmweb_market::{FinanceQuery, FinanceRow, MarketRef};

use crate::error::CoreResult;
use crate::models::{BreakdownLine, FinanceSummary, PRODUCT_PRICE_LABEL, STATUS_NOT_PAID, STATUS_PAID};
use crate::money::{checked_sum, format_money, overflow, parse_lenient};

const FINANCE_PAGE_SIZE: u32 = 500;
const MAX_FINANCE_PAGES: u32 = 50;

/// Label for rows the API returns without a fee name
const UNLABELED_FEE: &str = "Other Fees";

/// Fetches and aggregates settlement rows for single orders
pub struct FinanceResolver {
    market: MarketRef,
    window_days: u32,
    currency: String,
}

impl FinanceResolver {
    pub fn new(market: MarketRef, window_days: u32, currency: &str) -> Self {
        Self {
            market,
            window_days,
            currency: currency.to_string(),
        }
    }

    /// Search window: the day before the order until `window_days` after it, capped at today
    pub fn window(&self, order_date: NaiveDate, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = order_date - Duration::days(1);
        let end = (order_date + Duration::days(i64::from(self.window_days))).min(today);
        (start, end.max(start))
    }

    /// All settlement rows for one order
    pub async fn fetch_rows(&self, order_id: &str, order_date: NaiveDate, today: NaiveDate) -> CoreResult<Vec<FinanceRow>> {
        let (start, end) = self.window(order_date, today);
        let mut rows = Vec::new();

        for page in 0..MAX_FINANCE_PAGES {
            let query = FinanceQuery {
                start,
                end,
                order_id: Some(order_id.to_string()),
                offset: page * FINANCE_PAGE_SIZE,
                limit: FINANCE_PAGE_SIZE,
            };
            let batch = self.market.finance_transactions(&query).await?;
            let done = (batch.len() as u32) < FINANCE_PAGE_SIZE;
            rows.extend(
                batch
                    .into_iter()
                    .filter(|r| r.order_no.trim().is_empty() || r.order_no.trim() == order_id),
            );
            if done {
                break;
            }
        }

        log::debug!("Order {}: {} finance rows between {} and {}", order_id, rows.len(), start, end);
        Ok(rows)
    }

    /// Fetch and summarize one order
    pub async fn resolve(
        &self,
        order_id: &str,
        order_date: NaiveDate,
        order_total: Decimal,
        today: NaiveDate,
    ) -> CoreResult<FinanceSummary> {
        let rows = self.fetch_rows(order_id, order_date, today).await?;
        summarize(&rows, order_total, &self.currency)
    }
}

/// Aggregate settlement rows by fee label
///
/// The buyer-paid price line always exists when there are rows; it falls back
/// to `order_total` when missing or non-positive.
pub fn summarize(rows: &[FinanceRow], order_total: Decimal, currency: &str) -> CoreResult<FinanceSummary> {
    if rows.is_empty() {
        return Ok(FinanceSummary::not_paid(currency));
    }

    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for row in rows {
        let label = match row.fee_name.trim() {
            "" => UNLABELED_FEE,
            name => name,
        };
        let total = totals.entry(label.to_string()).or_insert(Decimal::ZERO);
        *total = total.checked_add(parse_lenient(&row.amount)).ok_or_else(overflow)?;
    }

    let price_paid = totals.get(PRODUCT_PRICE_LABEL).copied();
    if price_paid.map_or(true, |p| p <= Decimal::ZERO) {
        totals.insert(PRODUCT_PRICE_LABEL.to_string(), order_total);
    }

    let mut statements: Vec<&str> = Vec::new();
    for row in rows {
        let statement = row.statement.trim();
        if !statement.is_empty() && !statements.contains(&statement) {
            statements.push(statement);
        }
    }

    let paid_status = if rows.iter().any(|r| r.is_paid()) { STATUS_PAID } else { STATUS_NOT_PAID };

    let mut breakdown: Vec<BreakdownLine> = totals
        .into_iter()
        .map(|(label, amount)| BreakdownLine {
            amount_fmt: format_money(amount, currency),
            label,
            amount,
        })
        .collect();
    breakdown.sort_by(|a, b| line_rank(a).cmp(&line_rank(b)).then_with(|| a.label.cmp(&b.label)));

    let net_total = checked_sum(breakdown.iter().map(|l| l.amount))?;

    Ok(FinanceSummary {
        net_total,
        invoice_amount: format_money(net_total, currency),
        statement: statements.join(", "),
        paid_status: paid_status.to_string(),
        breakdown,
    })
}

/// Product price first, then credits, then deductions
fn line_rank(line: &BreakdownLine) -> u8 {
    if line.label == PRODUCT_PRICE_LABEL {
        0
    } else if line.amount >= Decimal::ZERO {
        1
    } else {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Arc;
    use tqmweb_market::{FixtureMarketplace, FixtureOrder, RawOrder};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn row(fee: &str, amount: &str) -> FinanceRow {
        FinanceRow {
            fee_name: fee.to_string(),
            amount: amount.to_string(),
            ..Default::default()
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_shipping_fee_example() {
        let summary = summarize(&[row("Shipping Fee", "-50")], dec("1000"), "PKR").unwrap();

        let lines: Vec<(&str, &str)> = summary
            .breakdown
            .iter()
            .map(|l| (l.label.as_str(), l.amount_fmt.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![(PRODUCT_PRICE_LABEL, "PKR 1,000.00"), ("Shipping Fee", "PKR -50.00")]
        );
        assert_eq!(summary.invoice_amount, "PKR 950.00");
        assert_eq!(summary.net_total, dec("950"));
        assert_eq!(summary.paid_status, STATUS_NOT_PAID);
    }

    #[test]
    fn test_no_rows_is_not_paid_with_zero_invoice() {
        let summary = summarize(&[], dec("1000"), "PKR").unwrap();
        assert_eq!(summary.net_total, Decimal::ZERO);
        assert_eq!(summary.invoice_amount, "PKR 0.00");
        assert_eq!(summary.paid_status, STATUS_NOT_PAID);
        assert!(summary.breakdown.is_empty());
    }

    #[test]
    fn test_existing_price_line_is_kept() {
        let rows = [row(PRODUCT_PRICE_LABEL, "1200"), row("Commission", "-120")];
        let summary = summarize(&rows, dec("1000"), "PKR").unwrap();
        assert_eq!(summary.breakdown[0].amount, dec("1200"));
        assert_eq!(summary.net_total, dec("1080"));
    }

    #[test]
    fn test_non_positive_price_line_falls_back_to_order_total() {
        let rows = [row(PRODUCT_PRICE_LABEL, "0"), row("Commission", "-100")];
        let summary = summarize(&rows, dec("800"), "PKR").unwrap();
        assert_eq!(summary.breakdown[0].label, PRODUCT_PRICE_LABEL);
        assert_eq!(summary.breakdown[0].amount, dec("800"));
        assert_eq!(summary.net_total, dec("700"));
    }

    #[test]
    fn test_amounts_aggregate_by_label() {
        let rows = [row("Commission", "-40"), row("Commission", "-10.50"), row("", "-5")];
        let summary = summarize(&rows, dec("100"), "PKR").unwrap();
        let commission = summary.breakdown.iter().find(|l| l.label == "Commission").unwrap();
        assert_eq!(commission.amount, dec("-50.50"));
        assert!(summary.breakdown.iter().any(|l| l.label == UNLABELED_FEE));
    }

    #[test]
    fn test_breakdown_ordering() {
        let rows = [
            row("Shipping Fee", "-50"),
            row("Voucher Subsidy", "20"),
            row("Commission", "-80"),
            row("Adjustment", "5"),
        ];
        let summary = summarize(&rows, dec("1000"), "PKR").unwrap();
        let labels: Vec<&str> = summary.breakdown.iter().map(|l| l.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![PRODUCT_PRICE_LABEL, "Adjustment", "Voucher Subsidy", "Commission", "Shipping Fee"]
        );
    }

    #[test]
    fn test_paid_when_any_row_paid() {
        let mut paid = row("Commission", "-10");
        paid.paid_status = "paid".to_string();
        let unpaid = row("Shipping Fee", "-10");
        let summary = summarize(&[unpaid, paid], dec("100"), "PKR").unwrap();
        assert_eq!(summary.paid_status, STATUS_PAID);
        assert!(summary.is_paid());
    }

    #[test]
    fn test_statements_are_distinct() {
        let mut a = row("Commission", "-10");
        a.statement = "Week 2".to_string();
        let mut b = row("Shipping Fee", "-10");
        b.statement = "Week 2".to_string();
        let mut c = row("Adjustment", "1");
        c.statement = "Week 3".to_string();
        assert_eq!(summarize(&[a, b, c], dec("100"), "PKR").unwrap().statement, "Week 2, Week 3");
    }

    #[test]
    fn test_window_is_capped_at_today() {
        let market: MarketRef = Arc::new(FixtureMarketplace::default());
        let resolver = FinanceResolver::new(market, 90, "PKR");
        assert_eq!(
            resolver.window(date(2024, 1, 10), date(2024, 1, 20)),
            (date(2024, 1, 9), date(2024, 1, 20))
        );
        assert_eq!(
            resolver.window(date(2024, 1, 10), date(2025, 1, 1)),
            (date(2024, 1, 9), date(2024, 4, 9))
        );
    }

    #[tokio::test]
    async fn test_resolve_uses_only_matching_rows() {
        let mut own = row("Shipping Fee", "-50");
        own.order_no = "7".to_string();
        own.transaction_date = "2024-01-12".to_string();
        let mut foreign = row("Commission", "-999");
        foreign.order_no = "8".to_string();

        let order = FixtureOrder {
            order: RawOrder { order_id: "7".to_string(), ..Default::default() },
            transactions: vec![own, foreign],
            ..Default::default()
        };
        let market: MarketRef = Arc::new(FixtureMarketplace::from_orders(vec![order]));
        let resolver = FinanceResolver::new(market, 90, "PKR");

        let summary = resolver
            .resolve("7", date(2024, 1, 10), dec("1000"), date(2024, 6, 1))
            .await
            .unwrap();
        assert_eq!(summary.invoice_amount, "PKR 950.00");
        assert_eq!(summary.breakdown.len(), 2);
    }

    #[test]
    fn test_overflowing_fee_total_is_an_error() {
        let huge = "79228162514264337593543950335";
        let err = summarize(&[row("Commission", huge), row("Commission", huge)], dec("100"), "PKR").unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InternalError);
    }
}
