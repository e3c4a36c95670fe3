//! Table subtotal reconciliation: declared total rows versus the sum of
//! the item rows in the same table category. Diagnostic only.

use billscan_core::{
    ChargeCandidate, SourcePass, TableType, TableValidation, ValidationStatus, round_cents,
    sum_cents,
};
use indexmap::IndexMap;
use tracing::warn;

/// Table-pass candidates of one table type, split into item and total rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableGroup<'a> {
    pub items: Vec<&'a ChargeCandidate>,
    pub totals: Vec<&'a ChargeCandidate>,
}

impl TableGroup<'_> {
    pub fn calculated_total(&self) -> f64 {
        sum_cents(self.items.iter().map(|c| c.amount))
    }
}

/// Group table-pass candidates by table type, in first-seen order.
pub fn group_by_table(candidates: &[ChargeCandidate]) -> IndexMap<TableType, TableGroup<'_>> {
    let mut groups: IndexMap<TableType, TableGroup<'_>> = IndexMap::new();
    for c in candidates {
        if c.source_pass != SourcePass::Table {
            continue;
        }
        let Some(table_type) = c.table_type else {
            continue;
        };
        let group = groups.entry(table_type).or_default();
        if c.is_total_row() {
            group.totals.push(c);
        } else {
            group.items.push(c);
        }
    }
    groups
}

/// Compare every declared total against its group's item sum.
pub fn reconcile(candidates: &[ChargeCandidate], tolerance: f64) -> Vec<TableValidation> {
    let mut out = Vec::new();

    for (table_type, group) in group_by_table(candidates) {
        let calculated = group.calculated_total();
        for total in &group.totals {
            let difference = round_cents(total.amount - calculated);
            let status = if difference.abs() <= tolerance + f64::EPSILON {
                ValidationStatus::Match
            } else {
                warn!(
                    table = table_type.as_str(),
                    row = %total.description,
                    declared = total.amount,
                    calculated,
                    "table total does not add up"
                );
                ValidationStatus::Mismatch
            };

            out.push(TableValidation {
                table_type,
                description: total.description.clone(),
                declared_total: total.amount,
                calculated_total: calculated,
                difference,
                status,
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(desc: &str, amount: f64, t: TableType, total: bool) -> ChargeCandidate {
        ChargeCandidate::new(desc, amount, t.as_str(), SourcePass::Table).with_table(t, total)
    }

    #[test]
    fn test_matching_subtotal() {
        let rows = vec![
            row("Plan Fee", 40.0, TableType::PlanCharges, false),
            row("Subtotal", 40.0, TableType::PlanCharges, true),
        ];
        let v = reconcile(&rows, 0.01);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].status, ValidationStatus::Match);
        assert_eq!(v[0].difference, 0.0);
        assert_eq!(v[0].calculated_total, 40.0);
    }

    #[test]
    fn test_mismatch_and_tolerance_edge() {
        let rows = vec![
            row("Regulatory Charge", 0.19, TableType::TaxesFees, false),
            row("911 Fee", 1.50, TableType::TaxesFees, false),
            row("Total Taxes", 1.70, TableType::TaxesFees, true),
            row("Total Taxes (rounded)", 1.72, TableType::TaxesFees, true),
        ];
        let v = reconcile(&rows, 0.01);
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].calculated_total, 1.69);
        assert_eq!(v[0].difference, 0.01);
        assert!(v[0].is_match());
        assert_eq!(v[1].difference, 0.03);
        assert_eq!(v[1].status, ValidationStatus::Mismatch);
    }

    #[test]
    fn test_groups_are_per_table_type() {
        let rows = vec![
            row("Plan Fee", 40.0, TableType::PlanCharges, false),
            row("Line Access", 20.0, TableType::LineCharges, false),
            row("Subtotal", 20.0, TableType::LineCharges, true),
            ChargeCandidate::new("Text pass", 5.0, "general", SourcePass::RawText),
        ];
        let groups = group_by_table(&rows);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&TableType::PlanCharges].items.len(), 1);
        assert!(groups[&TableType::PlanCharges].totals.is_empty());

        let v = reconcile(&rows, 0.01);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].table_type, TableType::LineCharges);
        assert!(v[0].is_match());
    }

    #[test]
    fn test_status_follows_tolerance() {
        let cases = [
            (10.00, vec![5.0, 5.0]),
            (10.05, vec![5.0, 5.0]),
            (9.99, vec![5.0, 5.0]),
        ];
        for (declared, calc_rows) in cases {
            let mut rows: Vec<_> = calc_rows
                .iter()
                .map(|a| row("Item", *a, TableType::Other, false))
                .collect();
            rows.push(row("Total", declared, TableType::Other, true));
            let v = reconcile(&rows, 0.01);
            let gap = (v[0].calculated_total - v[0].declared_total).abs();
            let expected = gap <= 0.01 + f64::EPSILON;
            assert_eq!(v[0].is_match(), expected);
        }
    }
}
