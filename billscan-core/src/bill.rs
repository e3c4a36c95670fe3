//! The structured record produced by one analysis run

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::charge::{Charge, ChargeType, LineItem, TableType};
use crate::money::round_cents;
use crate::phone::PhoneLine;

/// Placeholder for header fields the bill text does not reveal.
pub const UNKNOWN: &str = "Unknown";

/// Billing period as printed, plus the parsed dates when they parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingPeriod {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl BillingPeriod {
    pub fn unknown() -> Self {
        Self {
            text: UNKNOWN.to_string(),
            start: None,
            end: None,
        }
    }

    pub fn is_known(&self) -> bool {
        self.text != UNKNOWN
    }

    /// Number of days covered, inclusive of both ends.
    pub fn days(&self) -> Option<i64> {
        match (self.start, self.end) {
            (Some(s), Some(e)) if e >= s => Some((e - s).num_days() + 1),
            _ => None,
        }
    }
}

impl Default for BillingPeriod {
    fn default() -> Self {
        Self::unknown()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValidationStatus {
    #[serde(rename = "match")]
    Match,
    #[serde(rename = "mismatch")]
    Mismatch,
}

/// A table's declared total row checked against the sum of its item rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableValidation {
    pub table_type: TableType,
    /// Description of the total row that was checked
    pub description: String,
    pub declared_total: f64,
    pub calculated_total: f64,
    /// declared minus calculated
    pub difference: f64,
    pub status: ValidationStatus,
}

impl TableValidation {
    pub fn is_match(&self) -> bool {
        self.status == ValidationStatus::Match
    }
}

/// Sums over the final charge partition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subtotals {
    pub line_items: f64,
    pub other_charges: f64,
    pub by_type: BTreeMap<ChargeType, f64>,
    pub computed_total: f64,
}

impl Subtotals {
    pub fn from_partition(line_items: &[LineItem], other_charges: &[Charge]) -> Self {
        let mut by_type: BTreeMap<ChargeType, f64> = BTreeMap::new();
        let all = line_items
            .iter()
            .map(|li| &li.charge)
            .chain(other_charges.iter());
        for c in all {
            let slot = by_type.entry(c.charge_type).or_insert(0.0);
            *slot = round_cents(*slot + c.amount);
        }

        let line_sum = round_cents(line_items.iter().map(|li| li.charge.amount).sum());
        let other_sum = round_cents(other_charges.iter().map(|c| c.amount).sum());

        Self {
            line_items: line_sum,
            other_charges: other_sum,
            by_type,
            computed_total: round_cents(line_sum + other_sum),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BillAnalysisResult {
    pub account_number: String,
    pub billing_period: BillingPeriod,
    pub total_amount_due: f64,
    pub line_items: Vec<LineItem>,
    pub other_charges: Vec<Charge>,
    pub phone_lines: Vec<PhoneLine>,
    pub subtotals: Subtotals,
    pub table_validations: Vec<TableValidation>,
}

impl BillAnalysisResult {
    /// Every deduplicated charge: line items first, then general charges.
    pub fn all_charges(&self) -> impl Iterator<Item = &Charge> {
        self.line_items
            .iter()
            .map(|li| &li.charge)
            .chain(self.other_charges.iter())
    }

    pub fn charge_count(&self) -> usize {
        self.line_items.len() + self.other_charges.len()
    }

    pub fn mismatched_tables(&self) -> impl Iterator<Item = &TableValidation> {
        self.table_validations.iter().filter(|v| !v.is_match())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charge::{ChargeCandidate, SourcePass};

    fn charge(desc: &str, amount: f64, t: ChargeType) -> Charge {
        let mut c = ChargeCandidate::new(desc, amount, "general", SourcePass::RawText);
        c.charge_type = t;
        c
    }

    #[test]
    fn test_billing_period_days() {
        let p = BillingPeriod {
            text: "Jan 12 - Feb 11, 2025".to_string(),
            start: NaiveDate::from_ymd_opt(2025, 1, 12),
            end: NaiveDate::from_ymd_opt(2025, 2, 11),
        };
        assert_eq!(p.days(), Some(31));
        assert!(p.is_known());
        assert!(!BillingPeriod::unknown().is_known());
        assert_eq!(BillingPeriod::unknown().days(), None);
    }

    #[test]
    fn test_subtotals_from_partition() {
        let items = vec![
            LineItem::new(charge("Line Access", 20.0, ChargeType::LineAccess)),
            LineItem::new(charge("Device Payment", 45.0, ChargeType::DevicePayment)),
        ];
        let others = vec![
            charge("Regulatory Charge", 0.19, ChargeType::Surcharge),
            charge("Admin Fee", 3.30, ChargeType::Surcharge),
        ];
        let s = Subtotals::from_partition(&items, &others);
        assert_eq!(s.line_items, 65.0);
        assert_eq!(s.other_charges, 3.49);
        assert_eq!(s.computed_total, 68.49);
        assert_eq!(s.by_type[&ChargeType::Surcharge], 3.49);
        assert!(!s.by_type.contains_key(&ChargeType::Plan));
    }
}
