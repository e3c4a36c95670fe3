//! Phone numbers and the per-line aggregate built around them.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::charge::Charge;
use crate::money::round_cents;

/// 3-3-4 digit groups separated by `-`, `.` or spaces, with an optional
/// parenthesised area code.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\(\d{3}\)\s?|\b\d{3}[-.\s]?)\d{3}[-.\s]\d{4}\b").expect("valid phone regex")
});

pub const UNKNOWN_LINE: &str = "Unknown";
pub const UNKNOWN_DEVICE: &str = "Unknown Device";
pub const UNKNOWN_PLAN: &str = "Unknown Plan";

/// A phone number found in text, with its byte span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneMatch {
    pub number: String,
    pub start: usize,
    pub end: usize,
}

/// Strip separators down to the 10-digit key. A leading US country code
/// is dropped; anything that is not 10 digits afterwards is rejected.
pub fn canonicalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let digits = match digits.len() {
        11 if digits.starts_with('1') => digits[1..].to_string(),
        10 => digits,
        _ => return None,
    };
    Some(digits)
}

/// Every phone number in `text`, in order of appearance.
pub fn find_phone_numbers(text: &str) -> Vec<PhoneMatch> {
    PHONE_RE
        .find_iter(text)
        .filter_map(|m| {
            canonicalize_phone(m.as_str()).map(|number| PhoneMatch {
                number,
                start: m.start(),
                end: m.end(),
            })
        })
        .collect()
}

/// The first phone number in `text`, canonicalized.
pub fn first_phone_number(text: &str) -> Option<String> {
    find_phone_numbers(text).into_iter().next().map(|m| m.number)
}

/// All charges billed to one phone number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhoneLine {
    /// Canonical 10-digit number, or `UNKNOWN_LINE` for the catch-all line
    pub phone_number: String,
    pub device_name: String,
    pub plan_name: String,
    pub monthly_total: f64,
    pub charges: Vec<Charge>,
    /// Set when a total printed on the bill replaced the computed sum
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_total: Option<f64>,
}

impl PhoneLine {
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            device_name: UNKNOWN_DEVICE.to_string(),
            plan_name: UNKNOWN_PLAN.to_string(),
            monthly_total: 0.0,
            charges: Vec::new(),
            declared_total: None,
        }
    }

    /// Add a charge and keep the running total in cents.
    pub fn push_charge(&mut self, charge: Charge) {
        self.monthly_total = round_cents(self.monthly_total + charge.amount);
        self.charges.push(charge);
    }

    /// Fill in the device name unless one is already known.
    pub fn set_device_if_unknown(&mut self, device: &str) {
        if self.device_name == UNKNOWN_DEVICE && !device.is_empty() {
            self.device_name = device.to_string();
        }
    }

    /// Fill in the plan name unless one is already known.
    pub fn set_plan_if_unknown(&mut self, plan: &str) {
        if self.plan_name == UNKNOWN_PLAN && !plan.is_empty() {
            self.plan_name = plan.to_string();
        }
    }

    /// Replace the computed total with the one printed on the bill.
    pub fn apply_declared_total(&mut self, total: f64) {
        let total = round_cents(total);
        self.declared_total = Some(total);
        self.monthly_total = total;
    }

    /// Sum of the assigned charges, ignoring any declared override.
    pub fn computed_total(&self) -> f64 {
        round_cents(self.charges.iter().map(|c| c.amount).sum())
    }
}
