//! # Sales Reports
//!
//! Pure aggregation over committed transactions.
//!
//! ```text
//! [Transaction] ──┬──► per operator: total sold, number of sales
//!                 │        └── best seller / worst seller (by total)
//!                 └──► per item: quantity sold, returned, revenue
//!                          └── most sold / least sold (by net quantity)
//! ```
//!
//! Revenue uses the frozen line totals; returns reduce the net quantity
//! but never the recorded revenue.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::Transaction;

/// Sales attributed to one operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OperatorSales {
    pub user_id: String,
    pub total: Money,
    pub sales_count: u32,
}

/// Movement of one stock item across all sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemSales {
    pub item_id: String,
    pub name: String,
    #[ts(as = "String")]
    pub quantity_sold: Decimal,
    #[ts(as = "String")]
    pub quantity_returned: Decimal,
    pub revenue: Money,
}

impl ItemSales {
    pub fn net_quantity(&self) -> Decimal {
        self.quantity_sold - self.quantity_returned
    }
}

/// Aggregated view of a set of transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesReport {
    pub transaction_count: u32,
    pub gross_total: Money,
    /// Highest total first.
    pub by_operator: Vec<OperatorSales>,
    /// Highest net quantity first.
    pub by_item: Vec<ItemSales>,
}

impl SalesReport {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut operators: HashMap<&str, OperatorSales> = HashMap::new();
        let mut items: HashMap<&str, ItemSales> = HashMap::new();
        let mut gross_total = Money::zero();

        for tx in transactions {
            gross_total += tx.total;

            let entry = operators
                .entry(tx.user_id.as_str())
                .or_insert_with(|| OperatorSales {
                    user_id: tx.user_id.clone(),
                    total: Money::zero(),
                    sales_count: 0,
                });
            entry.total += tx.total;
            entry.sales_count += 1;

            for line in &tx.lines {
                let row = items.entry(line.item_id.as_str()).or_insert_with(|| ItemSales {
                    item_id: line.item_id.clone(),
                    name: line.name.clone(),
                    quantity_sold: Decimal::ZERO,
                    quantity_returned: Decimal::ZERO,
                    revenue: Money::zero(),
                });
                row.quantity_sold += line.quantity;
                row.quantity_returned += line.quantity_returned;
                row.revenue += line.line_total;
            }
        }

        let mut by_operator: Vec<_> = operators.into_values().collect();
        by_operator.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.user_id.cmp(&b.user_id)));

        let mut by_item: Vec<_> = items.into_values().collect();
        by_item.sort_by(|a, b| {
            b.net_quantity()
                .cmp(&a.net_quantity())
                .then_with(|| a.item_id.cmp(&b.item_id))
        });

        SalesReport {
            transaction_count: transactions.len() as u32,
            gross_total,
            by_operator,
            by_item,
        }
    }

    pub fn best_seller(&self) -> Option<&OperatorSales> {
        self.by_operator.first()
    }

    pub fn worst_seller(&self) -> Option<&OperatorSales> {
        self.by_operator.last()
    }

    pub fn most_sold(&self) -> Option<&ItemSales> {
        self.by_item.first()
    }

    pub fn least_sold(&self) -> Option<&ItemSales> {
        self.by_item.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Discount, TransactionLine, Unit};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn line(tx: &str, item: &str, qty: Decimal, returned: Decimal, total: i64) -> TransactionLine {
        TransactionLine {
            id: format!("{tx}-{item}"),
            transaction_id: tx.to_string(),
            item_id: item.to_string(),
            name: item.to_uppercase(),
            barcode: item.to_string(),
            unit: Unit::Item,
            unit_price: Money::from_cents(100),
            discount: Discount::NONE,
            apply_discount: false,
            includes_tax: false,
            quantity: qty,
            quantity_returned: returned,
            line_total: Money::from_cents(total),
        }
    }

    fn tx(id: &str, user: &str, total: i64, lines: Vec<TransactionLine>) -> Transaction {
        Transaction {
            id: id.to_string(),
            timestamp: Utc::now(),
            user_id: user.to_string(),
            lines,
            subtotal: Money::from_cents(total),
            tax: Money::zero(),
            total: Money::from_cents(total),
            payments: Vec::new(),
            notes: String::new(),
            images: Vec::new(),
        }
    }

    #[test]
    fn test_empty_report() {
        let report = SalesReport::from_transactions(&[]);
        assert_eq!(report.transaction_count, 0);
        assert!(report.best_seller().is_none());
        assert!(report.most_sold().is_none());
    }

    #[test]
    fn test_aggregates_by_operator_and_item() {
        let sales = vec![
            tx("t1", "vendedor", 500, vec![line("t1", "harina", dec!(5), dec!(0), 500)]),
            tx("t2", "admin", 300, vec![line("t2", "arroz", dec!(2.5), dec!(0), 300)]),
            tx("t3", "vendedor", 200, vec![line("t3", "harina", dec!(2), dec!(1), 200)]),
        ];

        let report = SalesReport::from_transactions(&sales);

        assert_eq!(report.transaction_count, 3);
        assert_eq!(report.gross_total.cents(), 1000);

        let best = report.best_seller().unwrap();
        assert_eq!(best.user_id, "vendedor");
        assert_eq!(best.total.cents(), 700);
        assert_eq!(best.sales_count, 2);
        assert_eq!(report.worst_seller().unwrap().user_id, "admin");

        let top = report.most_sold().unwrap();
        assert_eq!(top.item_id, "harina");
        assert_eq!(top.net_quantity(), dec!(6));
        assert_eq!(top.revenue.cents(), 700);
        assert_eq!(report.least_sold().unwrap().item_id, "arroz");
    }
}
