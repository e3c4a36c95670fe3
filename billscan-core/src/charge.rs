//! Charge types shared by every stage of the bill pipeline

use serde::{Deserialize, Serialize};

/// Final classification of a charge. Assigned by the ordered rule catalog;
/// anything no rule recognises is `Other`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChargeType {
    #[serde(rename = "lineAccess")]
    LineAccess,
    #[serde(rename = "devicePayment")]
    DevicePayment,
    #[serde(rename = "surcharge")]
    Surcharge,
    #[serde(rename = "promotion")]
    Promotion,
    #[serde(rename = "plan")]
    Plan,
    #[serde(rename = "usage")]
    Usage,
    #[serde(rename = "other")]
    Other,
}

impl ChargeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeType::LineAccess => "lineAccess",
            ChargeType::DevicePayment => "devicePayment",
            ChargeType::Surcharge => "surcharge",
            ChargeType::Promotion => "promotion",
            ChargeType::Plan => "plan",
            ChargeType::Usage => "usage",
            ChargeType::Other => "other",
        }
    }

    /// Line access and device installments always belong to a phone line.
    pub fn is_line_bound(&self) -> bool {
        matches!(self, ChargeType::LineAccess | ChargeType::DevicePayment)
    }
}

/// Which extraction pass produced a candidate.
///
/// The derive order is the merge order used by deduplication.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourcePass {
    #[serde(rename = "rawText")]
    RawText,
    #[serde(rename = "markdownText")]
    MarkdownText,
    #[serde(rename = "table")]
    Table,
}

impl SourcePass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourcePass::RawText => "rawText",
            SourcePass::MarkdownText => "markdownText",
            SourcePass::Table => "table",
        }
    }
}

/// Category of a parsed table, decided from its header names.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TableType {
    #[serde(rename = "lineCharges")]
    LineCharges,
    #[serde(rename = "planCharges")]
    PlanCharges,
    #[serde(rename = "taxesFees")]
    TaxesFees,
    #[serde(rename = "usage")]
    Usage,
    #[serde(rename = "summary")]
    Summary,
    #[serde(rename = "other")]
    Other,
}

impl TableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableType::LineCharges => "lineCharges",
            TableType::PlanCharges => "planCharges",
            TableType::TaxesFees => "taxesFees",
            TableType::Usage => "usage",
            TableType::Summary => "summary",
            TableType::Other => "other",
        }
    }
}

/// A single monetary line pulled out of the bill by one extraction pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChargeCandidate {
    pub description: String,
    /// Dollars, rounded to cents
    pub amount: f64,
    #[serde(rename = "type")]
    pub charge_type: ChargeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    /// Section name (text passes) or table type (table pass)
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    pub is_device_charge: bool,
    pub source_pass: SourcePass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_type: Option<TableType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_total: Option<bool>,
    /// The full line or joined row the candidate came from
    #[serde(skip)]
    pub source_text: String,
    /// Byte offset of the source line inside the text the pass scanned
    #[serde(skip)]
    pub offset: Option<usize>,
}

impl ChargeCandidate {
    /// Create an unclassified candidate. Classification fills in the type
    /// and the derived flags afterwards.
    pub fn new(
        description: impl Into<String>,
        amount: f64,
        category: impl Into<String>,
        source_pass: SourcePass,
    ) -> Self {
        Self {
            description: description.into(),
            amount: crate::money::round_cents(amount),
            charge_type: ChargeType::Other,
            line_number: None,
            category: category.into(),
            percentage: None,
            is_device_charge: false,
            source_pass,
            table_type: None,
            has_total: None,
            source_text: String::new(),
            offset: None,
        }
    }

    pub fn with_source(mut self, text: impl Into<String>, offset: Option<usize>) -> Self {
        self.source_text = text.into();
        self.offset = offset;
        self
    }

    pub fn with_table(mut self, table_type: TableType, has_total: bool) -> Self {
        self.table_type = Some(table_type);
        self.has_total = Some(has_total);
        self
    }

    /// True for table summary rows ("Subtotal", "Total ...")
    pub fn is_total_row(&self) -> bool {
        self.has_total.unwrap_or(false)
    }
}

/// A candidate that survived deduplication. The description is its identity.
pub type Charge = ChargeCandidate;

/// A charge attributed to one phone line or device rather than the account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(flatten)]
    pub charge: Charge,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub is_line_item: bool,
}

impl LineItem {
    pub fn new(charge: Charge) -> Self {
        Self {
            charge,
            phone_number: None,
            is_line_item: true,
        }
    }

    pub fn description(&self) -> &str {
        &self.charge.description
    }

    pub fn amount(&self) -> f64 {
        self.charge.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_rounds_amount() {
        let c = ChargeCandidate::new("Plan Fee", 40.004, "plan", SourcePass::RawText);
        assert_eq!(c.amount, 40.0);
        assert_eq!(c.charge_type, ChargeType::Other);
        assert!(!c.is_total_row());
    }

    #[test]
    fn test_table_candidate_total_flag() {
        let c = ChargeCandidate::new("Subtotal", 40.0, "planCharges", SourcePass::Table)
            .with_table(TableType::PlanCharges, true);
        assert!(c.is_total_row());
        assert_eq!(c.table_type, Some(TableType::PlanCharges));
    }

    #[test]
    fn test_charge_serializes_camel_case() {
        let c = ChargeCandidate::new("Unlimited Plus Plan -", 80.0, "plan", SourcePass::RawText)
            .with_source("Unlimited Plus Plan - $80.00", Some(0));
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["type"], "other");
        assert_eq!(json["sourcePass"], "rawText");
        assert_eq!(json["isDeviceCharge"], false);
        assert!(json.get("sourceText").is_none());
        assert!(json.get("lineNumber").is_none());
    }

    #[test]
    fn test_line_item_flattens_charge() {
        let c = ChargeCandidate::new("Line Access", 20.0, "service", SourcePass::RawText);
        let mut item = LineItem::new(c);
        item.phone_number = Some("2517470017".to_string());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["description"], "Line Access");
        assert_eq!(json["phoneNumber"], "2517470017");
        assert_eq!(json["isLineItem"], true);
    }

    #[test]
    fn test_line_bound_types() {
        assert!(ChargeType::LineAccess.is_line_bound());
        assert!(ChargeType::DevicePayment.is_line_bound());
        assert!(!ChargeType::Surcharge.is_line_bound());
    }
}
