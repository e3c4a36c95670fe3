//! Correction of known extraction mistakes, then final typing of each
//! candidate and its derived flags.

use billscan_core::{ChargeCandidate, parse_amount};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::patterns::classify_description;

/// Group 2 catches the next digit group of a dotted or dashed number.
static LINE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:line|phone|device)\s*#?\s*(\d+)\b([-.]\d)?")
        .expect("valid line number regex")
});

static PERCENTAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("valid percentage regex"));

/// Payment N of M ($X remaining) - Agreement Y: $Z
static INSTALLMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^.*?Payment\s+\d+\s+of\s+\d+\s*",
        r"\(\s*\$(?P<remaining>[\d,]+\.\d{2})\s+remaining\s*\)\s*-?\s*",
        r"Agreement\s+(?P<agreement>[\w-]+)\s*:?\s*\$(?P<amount>[\d,]+\.\d{2})"
    ))
    .expect("valid installment regex")
});

const DEVICE_KEYWORDS: &[&str] = &["iphone", "ipad", "watch", "device", "phone"];

/// Tidy a raw captured description: whitespace and markdown decoration go,
/// trailing colons go, everything else (including a trailing dash) stays.
pub fn clean_description(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '|' || c == '*' || c == '#' || c.is_whitespace())
        .trim_end_matches(':')
        .trim()
        .to_string()
}

/// Line/phone/device number printed in a description ("Line 2", "Device #3").
/// A phone number after the keyword ("Phone 251-747-0017") is not one.
pub fn line_number(description: &str) -> Option<u32> {
    let caps = LINE_NUMBER_RE.captures(description)?;
    if caps.get(2).is_some() {
        return None;
    }
    caps.get(1)?.as_str().parse().ok()
}

/// Percentage printed in a description ("Promo 25% off").
pub fn percentage(description: &str) -> Option<f64> {
    PERCENTAGE_RE
        .captures(description)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn is_device_charge(description: &str) -> bool {
    let d = description.to_lowercase();
    DEVICE_KEYWORDS.iter().any(|k| d.contains(k))
}

/// Recover the monthly installment when the generic pattern grabbed the
/// remaining-balance figure from a device payment line.
///
/// Returns true when the candidate was changed.
pub fn correct_installment(candidate: &mut ChargeCandidate, config: &AnalysisConfig) -> bool {
    let text = if candidate.source_text.is_empty() {
        candidate.description.as_str()
    } else {
        candidate.source_text.as_str()
    };

    if !(text.contains("Payment") && text.contains("remaining")) {
        return false;
    }
    if candidate.amount <= config.installment_correction_threshold {
        return false;
    }

    let Some(caps) = INSTALLMENT_RE.captures(text) else {
        return false;
    };
    let Some(amount) = parse_amount(&caps["amount"]) else {
        return false;
    };

    debug!(
        from = candidate.amount,
        to = amount,
        remaining = &caps["remaining"],
        agreement = &caps["agreement"],
        "corrected installment amount"
    );
    candidate.amount = amount;
    true
}

/// Assign the final type and derived flags from the description.
pub fn classify(candidate: &mut ChargeCandidate) {
    candidate.charge_type = classify_description(&candidate.description);
    candidate.line_number = line_number(&candidate.description);
    candidate.percentage = percentage(&candidate.description);
    candidate.is_device_charge = is_device_charge(&candidate.description);
}

/// Correct then classify a whole pass worth of candidates.
pub fn classify_all(
    mut candidates: Vec<ChargeCandidate>,
    config: &AnalysisConfig,
) -> Vec<ChargeCandidate> {
    for c in candidates.iter_mut() {
        correct_installment(c, config);
        classify(c);
    }
    candidates
}
