//! Ordered rule catalogs for price extraction and charge classification.
//!
//! Both catalogs are first-match-wins tables scanned linearly. Order
//! matters: a line is tried against `PRICE_PATTERNS` top to bottom and a
//! description against `CHARGE_TYPE_RULES` top to bottom.

use billscan_core::ChargeType;
use regex::Regex;
use std::sync::LazyLock;

/// A price-extraction rule: which capture groups hold the description and
/// the amount.
#[derive(Debug)]
pub struct PricePattern {
    pub name: &'static str,
    pub matcher: Regex,
    pub description_group: usize,
    pub amount_group: usize,
}

impl PricePattern {
    fn new(
        name: &'static str,
        pattern: &str,
        description_group: usize,
        amount_group: usize,
    ) -> Self {
        Self {
            name,
            matcher: Regex::new(pattern).expect("valid price pattern"),
            description_group,
            amount_group,
        }
    }

    /// Raw `(description, amount_text)` if the rule matches `line`.
    pub fn captures<'t>(&self, line: &'t str) -> Option<(&'t str, &'t str)> {
        let caps = self.matcher.captures(line)?;
        let desc = caps.get(self.description_group)?.as_str();
        let amount = caps.get(self.amount_group)?.as_str();
        Some((desc, amount))
    }
}

/// "$X.XX" with an optional sign on either side of the dollar mark.
const DOLLAR_AMOUNT: &str = r"-?\$\s?-?\d[\d,]*\.\d{2}";
/// Bare "X.XX".
const PLAIN_AMOUNT: &str = r"-?\d[\d,]*\.\d{2}";

pub static PRICE_PATTERNS: LazyLock<Vec<PricePattern>> = LazyLock::new(|| {
    vec![
        // Unlimited Plus Plan - $80.00
        PricePattern::new("standard", &format!(r"^(.+?)\s*({DOLLAR_AMOUNT})"), 1, 2),
        // $80.00 Unlimited Plus Plan
        PricePattern::new("reversed", &format!(r"^\s*({DOLLAR_AMOUNT})\s+(.+)$"), 2, 1),
        // Unlimited Plus Plan 80.00 dollars
        PricePattern::new("dollars", &format!(r"(?i)^(.+?)\s+({PLAIN_AMOUNT})\s*dollars\b"), 1, 2),
        // Unlimited Plus Plan: 80.00  /  Unlimited Plus Plan | 80.00
        PricePattern::new("separator", &format!(r"^(.+?)\s*[:|\t]\s*({PLAIN_AMOUNT})\s*$"), 1, 2),
    ]
});

/// Summary phrases that never name a billable charge.
pub const SUMMARY_STOP_LIST: &[&str] = &[
    "total",
    "account-wide",
    "one-time charges",
    "this month",
    "remaining",
    "total due",
    "unpaid balance",
    "the total amount due",
];

/// Case-insensitive substring match against the summary stop-list.
pub fn is_summary_description(description: &str) -> bool {
    let d = description.to_lowercase();
    SUMMARY_STOP_LIST.iter().any(|s| d.contains(s))
}

/// A charge-type rule: the type assigned when `matcher` hits the description.
#[derive(Debug)]
pub struct ChargeTypeRule {
    pub charge_type: ChargeType,
    pub matcher: Regex,
}

pub static CHARGE_TYPE_RULES: LazyLock<Vec<ChargeTypeRule>> = LazyLock::new(|| {
    [
        (
            ChargeType::LineAccess,
            r"(?i)line\s+access|access\s+(?:fee|charge)|\bline\s+(?:fee|charge)|smartphone\s+line|connected\s+device",
        ),
        (
            ChargeType::DevicePayment,
            r"(?i)device\s+payment|installment|\bagreement\b|payment\s+\d+\s+of\s+\d+|equipment\s+(?:charge|payment)",
        ),
        (
            ChargeType::Surcharge,
            r"(?i)surcharge|regulatory|\bfees?\b|\btax(?:es)?\b|\b911\b|recovery|universal\s+service",
        ),
        (
            ChargeType::Promotion,
            r"(?i)promo|discount|\bcredits?\b|savings|rebate|trade-?in",
        ),
        (
            ChargeType::Plan,
            r"(?i)\bplan\b|unlimited|\bshare\b|welcome|\bbundle\b|monthly\s+service",
        ),
        (
            ChargeType::Usage,
            r"(?i)usage|\bminutes\b|\bdata\b|roaming|international|messag|overage|long\s+distance|\bcalls?\b",
        ),
    ]
    .into_iter()
    .map(|(charge_type, p)| ChargeTypeRule {
        charge_type,
        matcher: Regex::new(p).expect("valid charge type rule"),
    })
    .collect()
});

/// Classify a description. First matching rule wins; default `Other`.
pub fn classify_description(description: &str) -> ChargeType {
    CHARGE_TYPE_RULES
        .iter()
        .find(|r| r.matcher.is_match(description))
        .map(|r| r.charge_type)
        .unwrap_or(ChargeType::Other)
}
