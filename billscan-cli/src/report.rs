//! Printing and export of analysis results.

use anyhow::{Context, Result};
use billscan_core::{BillAnalysisResult, Charge, ChargeCandidate};
use billscan_ingest::Table;
use std::fs::File;
use std::io::Write;
use std::path::Path;

fn money(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}

fn charge_row(c: &Charge) -> String {
    format!(
        "  {:<48} {:>10}  [{}] {}",
        c.description,
        money(c.amount),
        c.charge_type.as_str(),
        c.category
    )
}

pub fn print_text(result: &BillAnalysisResult) {
    println!("Account:        {}", result.account_number);
    match result.billing_period.days() {
        Some(days) => println!("Billing period: {} ({} days)", result.billing_period.text, days),
        None => println!("Billing period: {}", result.billing_period.text),
    }
    println!("Amount due:     {}", money(result.total_amount_due));

    println!("\nPhone lines ({})", result.phone_lines.len());
    for line in &result.phone_lines {
        let declared = if line.declared_total.is_some() {
            format!(" (printed; computed {})", money(line.computed_total()))
        } else {
            String::new()
        };
        println!(
            "  {} | {} | {} | {}{}",
            line.phone_number,
            line.device_name,
            line.plan_name,
            money(line.monthly_total),
            declared
        );
    }

    println!("\nLine items ({})", result.line_items.len());
    for li in &result.line_items {
        let phone = li.phone_number.as_deref().unwrap_or("-");
        println!("{}  {}", charge_row(&li.charge), phone);
    }

    println!("\nOther charges ({})", result.other_charges.len());
    for c in &result.other_charges {
        println!("{}", charge_row(c));
    }

    println!("\nSubtotals");
    for (t, amount) in &result.subtotals.by_type {
        println!("  {:<16} {:>10}", t.as_str(), money(*amount));
    }
    println!("  {:<16} {:>10}", "computed", money(result.subtotals.computed_total));

    if !result.table_validations.is_empty() {
        println!("\nTable checks ({})", table_check_summary(result));
        for v in &result.table_validations {
            println!(
                "  {:<12} {:<28} declared {:>10} calculated {:>10} diff {:>8} {}",
                v.table_type.as_str(),
                v.description,
                money(v.declared_total),
                money(v.calculated_total),
                money(v.difference),
                if v.is_match() { "ok" } else { "MISMATCH" }
            );
        }
    }
}

fn table_check_summary(result: &BillAnalysisResult) -> String {
    match result.mismatched_tables().count() {
        0 => format!("all {} match", result.table_validations.len()),
        n => format!("{} of {} mismatched", n, result.table_validations.len()),
    }
}

pub fn print_json(result: &BillAnalysisResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

pub fn print_tables(tables: &[Table]) {
    if tables.is_empty() {
        println!("No money tables found.");
        return;
    }
    for (i, t) in tables.iter().enumerate() {
        println!("Table {} [{}] {}", i + 1, t.table_type.as_str(), t.headers.join(" | "));
        for row in &t.rows {
            println!("  {}", row.join(" | "));
        }
    }
}

pub fn print_candidates(candidates: &[ChargeCandidate]) {
    for c in candidates {
        println!("{}", charge_row(c));
    }
    println!("\n{} candidates", candidates.len());
}

const CSV_HEADER: [&str; 8] = [
    "phone_number",
    "description",
    "amount",
    "type",
    "category",
    "source_pass",
    "line_item",
    "device_charge",
];

/// One CSV record per charge, line items first.
pub fn write_csv<W: Write>(result: &BillAnalysisResult, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADER)?;

    let rows = result
        .line_items
        .iter()
        .map(|li| (li.phone_number.as_deref().unwrap_or(""), &li.charge, true))
        .chain(result.other_charges.iter().map(|c| ("", c, false)));

    for (phone, c, line_item) in rows {
        writer.write_record([
            phone.to_string(),
            c.description.clone(),
            format!("{:.2}", c.amount),
            c.charge_type.as_str().to_string(),
            c.category.clone(),
            c.source_pass.as_str().to_string(),
            line_item.to_string(),
            c.is_device_charge.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn export_csv(result: &BillAnalysisResult, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_csv(result, file).with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use billscan_analysis::analyze_bill;
    use billscan_ingest::Document;

    #[test]
    fn test_money_format() {
        assert_eq!(money(80.0), "$80.00");
        assert_eq!(money(-10.0), "-$10.00");
    }

    #[test]
    fn test_csv_rows_line_items_first() {
        let doc = Document::from_plain_text(
            "Unlimited Plus Plan - $80.00\nApple iPhone 15 (251-747-0017) $35.00\n",
        );
        let result = analyze_bill(&doc);

        let mut buf = Vec::new();
        write_csv(&result, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("phone_number,description,amount"));
        assert_eq!(
            lines[1],
            "2517470017,Apple iPhone 15 (251-747-0017),35.00,other,general,rawText,true,true"
        );
        assert_eq!(lines[2], ",Unlimited Plus Plan -,80.00,plan,general,rawText,false,false");
    }

    #[test]
    fn test_table_check_summary_counts_mismatches() {
        let markdown = "| Tax or Fee | Amount |\n|---|---|\n| Regulatory | $0.21 |\n\
                        | 911 | $2.50 |\n| Total Taxes & Fees | $2.50 |\n";
        let doc = Document::new("", markdown);
        let result = analyze_bill(&doc);
        assert_eq!(result.mismatched_tables().count(), 1);
        assert_eq!(table_check_summary(&result), "1 of 1 mismatched");
    }
}
