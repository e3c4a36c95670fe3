//! Grouping charges under the phone line they are billed to.
//!
//! Association runs in a fixed ladder:
//! 1. devices and phone numbers sharing a blank-line-delimited block
//! 2. remaining devices matched to the nearest phone number in a window
//! 3. charges attached by a phone number in their description, else by the
//!    nearest preceding phone number in the plain text
//! 4. bill-printed per-line totals override the computed sums
//!
//! When all of that yields no line at all, the fallbacks at the end apply.

use billscan_core::{
    Charge, ChargeType, LineItem, PhoneLine, PhoneMatch, SourcePass, UNKNOWN_LINE,
    canonicalize_phone, find_phone_numbers, first_phone_number, parse_amount,
};
use billscan_ingest::{lines_with_offsets, text_blocks};
use indexmap::IndexMap;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

use crate::classify::is_device_charge;
use crate::config::AnalysisConfig;
use crate::patterns::classify_description;

static DEVICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\b(?:(?:Apple|Samsung|Google)[ \t]+)?(?:iPhone|iPad|Watch|Galaxy|Pixel|Arlo)",
        r"(?:[ \t]+(?:\d{1,3}[A-Za-z]?|Pro|Max|Plus|Mini|mini|Ultra|SE|Series|Air|Fold\d?|Flip\d?|FE|XL|Tab|GPS|Cellular|LTE|5G|S\d{1,2}|A\d{1,2}|Z|Go|Essential)\b)*"
    ))
    .expect("valid device regex")
});

static PLAN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\b(?:(?:Unlimited|Share|Welcome|Plus)\b",
        r"(?:[ \t]+(?:Unlimited|Share|Welcome|Plus|Everything|Premium|Ultimate|Starter|Extra|Elite|Data|Plan)\b)*",
        r"|[A-Z][A-Za-z]+[ \t]+Plan\b)"
    ))
    .expect("valid plan regex")
});

/// Phone number shape embedded in the declared-total patterns.
const PHONE: &str = r"\(?(?:\(\d{3}\)\s?|\d{3}[-.\s]?)\d{3}[-.\s]\d{4}\)?";

/// "Jane Smith (251) 747-0017 $127.45": an owner name, the number, one amount.
static OWNER_TOTAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?:(?P<owner>[A-Z][A-Za-z'.]*(?:[ \t]+[A-Z][A-Za-z'.]*){{0,3}})\s*[-:,]?\s*)?(?P<phone>{PHONE})\s*[-:,]?\s*(?P<amount>-?\$\s?[\d,]+\.\d{{2}})\s*$"
    ))
    .expect("valid owner total regex")
});

/// "Line total for 251-747-0017: $127.45" / "251-747-0017 Total $127.45"
static LINE_TOTAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:\btotal\b[^$\n]*?(?P<p1>{PHONE})|(?P<p2>{PHONE})[^$\n]*?\btotal\b)[^$\n]*?(?P<amount>-?\$\s?[\d,]+\.\d{{2}})"
    ))
    .expect("valid line total regex")
});

/// A device name found in the plain text, with a guessed plan.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceMention {
    pub name: String,
    pub plan: Option<String>,
    pub start: usize,
    pub end: usize,
}

fn floor_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Character gap between two spans; zero when they overlap.
fn gap(a: (usize, usize), b: (usize, usize)) -> usize {
    if b.0 >= a.1 {
        b.0 - a.1
    } else if a.0 >= b.1 {
        a.0 - b.1
    } else {
        0
    }
}

/// Nearest plan keyword around a device mention, skipping the device name
/// itself ("iPhone 15 Plus" is not a plan).
fn guess_plan(text: &str, start: usize, end: usize, config: &AnalysisConfig) -> Option<String> {
    let lo = floor_boundary(text, start.saturating_sub(config.plan_scan_before));
    let hi = floor_boundary(text, end.saturating_add(config.plan_scan_after));
    let window = &text[lo..hi];

    PLAN_RE
        .find_iter(window)
        .map(|m| (lo + m.start(), lo + m.end(), m.as_str()))
        .filter(|(s, e, _)| *e <= start || *s >= end)
        .min_by_key(|(s, e, _)| gap((*s, *e), (start, end)))
        .map(|(_, _, p)| p.to_string())
}

/// Every device mention in `text`, in order.
pub fn find_devices(text: &str, config: &AnalysisConfig) -> Vec<DeviceMention> {
    DEVICE_RE
        .find_iter(text)
        .map(|m| DeviceMention {
            name: m.as_str().trim().to_string(),
            plan: guess_plan(text, m.start(), m.end(), config),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// Nearest phone number to a span, within `window` characters. `phones`
/// must be sorted by offset, which `find_phone_numbers` guarantees.
pub fn nearest_phone<'p>(
    phones: &'p [PhoneMatch],
    start: usize,
    end: usize,
    window: usize,
) -> Option<&'p PhoneMatch> {
    let split = phones.partition_point(|p| p.start < start);
    let before = split.checked_sub(1).and_then(|i| phones.get(i));
    let after = phones.get(split);

    [before, after]
        .into_iter()
        .flatten()
        .map(|p| (gap((p.start, p.end), (start, end)), p))
        .filter(|(d, _)| *d <= window)
        .min_by_key(|(d, _)| *d)
        .map(|(_, p)| p)
}

/// Nearest phone number that starts before `offset`, within `window`.
fn preceding_phone<'p>(
    phones: &'p [PhoneMatch],
    offset: usize,
    window: usize,
) -> Option<&'p PhoneMatch> {
    let split = phones.partition_point(|p| p.start < offset);
    let p = phones.get(split.checked_sub(1)?)?;
    (offset.saturating_sub(p.end) <= window).then_some(p)
}

/// `(canonical number, amount)` when `line` is a per-line total printed on
/// the bill rather than a charge.
fn declared_total(line: &str) -> Option<(String, f64)> {
    let caps = OWNER_TOTAL_RE
        .captures(line)
        .or_else(|| LINE_TOTAL_RE.captures(line))?;
    if let Some(owner) = caps.name("owner") {
        let owner = owner.as_str();
        if classify_description(owner) != ChargeType::Other
            || is_device_charge(owner)
            || DEVICE_RE.is_match(owner)
        {
            return None;
        }
    }
    let phone = caps
        .name("phone")
        .or_else(|| caps.name("p1"))
        .or_else(|| caps.name("p2"))
        .and_then(|m| canonicalize_phone(m.as_str()))?;
    let amount = caps.name("amount").and_then(|m| parse_amount(m.as_str()))?;
    Some((phone, amount))
}

/// Whether `line` states a phone line's total. Such lines feed the
/// declared-total override and must not also be counted as charges.
pub fn is_declared_total_line(line: &str) -> bool {
    declared_total(line).is_some()
}

/// Per-line totals printed on the bill, keyed by canonical number.
pub fn declared_totals(text: &str) -> HashMap<String, f64> {
    let mut out = HashMap::new();
    for (_, line) in lines_with_offsets(text) {
        if let Some((phone, amount)) = declared_total(line) {
            out.entry(phone).or_insert(amount);
        }
    }
    out
}

fn upsert_device(lines: &mut IndexMap<String, PhoneLine>, phone: &str, device: &DeviceMention) {
    let line = lines
        .entry(phone.to_string())
        .or_insert_with(|| PhoneLine::new(phone));
    line.set_device_if_unknown(&device.name);
    if let Some(plan) = &device.plan {
        line.set_plan_if_unknown(plan);
    }
}

fn assign_charge(lines: &mut IndexMap<String, PhoneLine>, phone: &str, charge: &Charge) {
    let line = lines
        .entry(phone.to_string())
        .or_insert_with(|| PhoneLine::new(phone));
    if charge.is_device_charge {
        if let Some(m) = DEVICE_RE.find(&charge.description) {
            line.set_device_if_unknown(m.as_str().trim());
        }
    }
    if let Some(m) = PLAN_RE.find(&charge.description) {
        line.set_plan_if_unknown(m.as_str());
    }
    line.push_charge(charge.clone());
}

/// Phone number a charge belongs to: one printed in its description, else
/// the nearest preceding number in the plain text (raw-text pass only).
fn charge_phone(charge: &Charge, phones: &[PhoneMatch], config: &AnalysisConfig) -> Option<String> {
    if let Some(p) = first_phone_number(&charge.description) {
        return Some(p);
    }
    if charge.source_pass != SourcePass::RawText {
        return None;
    }
    let offset = charge.offset?;
    preceding_phone(phones, offset, config.proximity_window).map(|p| p.number.clone())
}

/// Outcome of association: the phone lines, and the line items with their
/// phone number filled in where one was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Association {
    pub phone_lines: Vec<PhoneLine>,
    pub line_items: Vec<LineItem>,
}

pub fn associate_phone_lines(
    plain_text: &str,
    mut line_items: Vec<LineItem>,
    other_charges: &[Charge],
    config: &AnalysisConfig,
) -> Association {
    let phones = find_phone_numbers(plain_text);
    let devices = find_devices(plain_text, config);
    let mut lines: IndexMap<String, PhoneLine> = IndexMap::new();
    let mut matched = vec![false; devices.len()];

    // Devices and numbers sharing a block
    for block in text_blocks(plain_text) {
        let (lo, hi) = (block.start, block.end());
        let block_phones: Vec<PhoneMatch> = phones
            .iter()
            .filter(|p| p.start >= lo && p.end <= hi)
            .cloned()
            .collect();
        if block_phones.is_empty() {
            continue;
        }
        for (i, d) in devices.iter().enumerate() {
            if d.start < lo || d.end > hi {
                continue;
            }
            if let Some(p) = nearest_phone(&block_phones, d.start, d.end, usize::MAX) {
                upsert_device(&mut lines, &p.number, d);
                matched[i] = true;
            }
        }
    }

    // Windowed nearest neighbour for the rest
    for (i, d) in devices.iter().enumerate() {
        if matched[i] {
            continue;
        }
        match nearest_phone(&phones, d.start, d.end, config.proximity_window) {
            Some(p) => {
                upsert_device(&mut lines, &p.number, d);
                matched[i] = true;
            }
            None => debug!(device = %d.name, "no phone number near device"),
        }
    }

    // Charges
    for item in line_items.iter_mut() {
        if let Some(phone) = charge_phone(&item.charge, &phones, config) {
            assign_charge(&mut lines, &phone, &item.charge);
            item.phone_number = Some(phone);
        }
    }
    for charge in other_charges {
        if let Some(phone) = charge_phone(charge, &phones, config) {
            assign_charge(&mut lines, &phone, charge);
        }
    }

    if !lines.is_empty() {
        let declared = declared_totals(plain_text);
        for (phone, line) in lines.iter_mut() {
            if let Some(total) = declared.get(phone) {
                debug!(
                    phone = %phone,
                    computed = line.monthly_total,
                    declared = total,
                    "declared line total applied"
                );
                line.apply_declared_total(*total);
            }
        }
        return Association {
            phone_lines: lines.into_values().collect(),
            line_items,
        };
    }

    let phone_lines = fallback_lines(&devices, &phones, &line_items);
    Association { phone_lines, line_items }
}

/// Used only when nothing could be associated: devices paired with numbers
/// in order of appearance and zero totals, else one catch-all line holding
/// every line item.
fn fallback_lines(
    devices: &[DeviceMention],
    phones: &[PhoneMatch],
    line_items: &[LineItem],
) -> Vec<PhoneLine> {
    if !devices.is_empty() && !phones.is_empty() {
        let mut lines: IndexMap<String, PhoneLine> = IndexMap::new();
        for (d, p) in devices.iter().zip(phones) {
            upsert_device(&mut lines, &p.number, d);
        }
        debug!(lines = lines.len(), "paired devices with numbers by order");
        return lines.into_values().collect();
    }

    if line_items.is_empty() {
        return Vec::new();
    }

    let mut line = PhoneLine::new(UNKNOWN_LINE);
    if let Some(d) = devices.first() {
        line.set_device_if_unknown(&d.name);
        if let Some(plan) = &d.plan {
            line.set_plan_if_unknown(plan);
        }
    }
    for item in line_items {
        line.push_charge(item.charge.clone());
    }
    debug!(charges = line.charges.len(), "all line items on the unknown line");
    vec![line]
}

#[cfg(test)]
mod tests {
    use super::*;
    use billscan_core::ChargeCandidate;

    fn charge(desc: &str, amount: f64) -> Charge {
        let mut c = ChargeCandidate::new(desc, amount, "general", SourcePass::Table);
        c.is_device_charge = is_device_charge(desc);
        c
    }

    #[test]
    fn test_find_devices_and_plan() {
        let text = "Apple iPhone 15 Pro (251-747-0017)\nUnlimited Plus Plan - $80.00";
        let devices = find_devices(text, &AnalysisConfig::default());
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Apple iPhone 15 Pro");
        assert_eq!(devices[0].plan.as_deref(), Some("Unlimited Plus Plan"));
    }

    #[test]
    fn test_device_name_is_not_a_plan() {
        let text = "Apple iPhone 15 Plus";
        let devices = find_devices(text, &AnalysisConfig::default());
        assert_eq!(devices[0].name, "Apple iPhone 15 Plus");
        assert_eq!(devices[0].plan, None);
    }

    #[test]
    fn test_nearest_phone_window() {
        let text = format!("Galaxy S24 {}251-747-0017", " ".repeat(50));
        let phones = find_phone_numbers(&text);
        assert!(nearest_phone(&phones, 0, 10, 200).is_some());
        assert!(nearest_phone(&phones, 0, 10, 20).is_none());
    }

    #[test]
    fn test_block_association() {
        let text = "Jane Smith\nApple iPhone 15\n251-747-0017\n\nJohn Smith\nGoogle Pixel 8\n251-747-0018\n";
        let assoc = associate_phone_lines(text, Vec::new(), &[], &AnalysisConfig::default());
        let lines = &assoc.phone_lines;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].phone_number, "2517470017");
        assert_eq!(lines[0].device_name, "Apple iPhone 15");
        assert_eq!(lines[1].phone_number, "2517470018");
        assert_eq!(lines[1].device_name, "Google Pixel 8");
        assert_eq!(lines[1].monthly_total, 0.0);
    }

    #[test]
    fn test_charges_with_numbers_share_one_line() {
        let items = vec![LineItem::new(charge("Apple iPhone 15 (251-747-0017)", 35.0))];
        let others = vec![charge("Plan - Unlimited Plus (251-747-0017)", 80.0)];
        let assoc = associate_phone_lines("", items, &others, &AnalysisConfig::default());

        assert_eq!(assoc.phone_lines.len(), 1);
        let line = &assoc.phone_lines[0];
        assert_eq!(line.phone_number, "2517470017");
        assert_eq!(line.monthly_total, 115.0);
        assert_eq!(line.charges.len(), 2);
        assert_eq!(line.device_name, "Apple iPhone 15");
        assert_eq!(line.plan_name, "Unlimited Plus");
        assert_eq!(assoc.line_items[0].phone_number.as_deref(), Some("2517470017"));
    }

    #[test]
    fn test_raw_charges_follow_preceding_number() {
        let text = "Jane Smith 251-747-0017\nLine Access $20.00\n";
        let mut access = ChargeCandidate::new("Line Access", 20.0, "general", SourcePass::RawText)
            .with_source("Line Access $20.00", Some(24));
        access.charge_type = billscan_core::ChargeType::LineAccess;

        let items = vec![LineItem::new(access)];
        let assoc = associate_phone_lines(text, items, &[], &AnalysisConfig::default());
        assert_eq!(assoc.phone_lines.len(), 1);
        assert_eq!(assoc.phone_lines[0].monthly_total, 20.0);
        assert_eq!(assoc.line_items[0].phone_number.as_deref(), Some("2517470017"));
    }

    #[test]
    fn test_declared_total_overrides() {
        let text = "Jane Smith (251) 747-0017 $110.00\n";
        let items = vec![
            LineItem::new(charge("Apple iPhone 15 (251-747-0017)", 35.0)),
            LineItem::new(charge("Unlimited Plus line (251-747-0017)", 80.0)),
        ];
        let assoc = associate_phone_lines(text, items, &[], &AnalysisConfig::default());
        let line = &assoc.phone_lines[0];
        assert_eq!(line.monthly_total, 110.0);
        assert_eq!(line.declared_total, Some(110.0));
        assert_eq!(line.computed_total(), 115.0);
    }

    #[test]
    fn test_declared_total_shapes() {
        let text = "Jane Smith (251-747-0017) $85.00\nLine total for 251.747.0018: $40.00\nApple iPhone 15 (251-747-0019) $35.00\nSmartphone (251-747-0020) $20.00\n";
        let totals = declared_totals(text);
        assert_eq!(totals.get("2517470017"), Some(&85.0));
        assert_eq!(totals.get("2517470018"), Some(&40.0));
        assert_eq!(totals.get("2517470019"), None);
        assert_eq!(totals.get("2517470020"), None);
    }

    #[test]
    fn test_declared_total_line_detection() {
        assert!(is_declared_total_line("Jane Smith (251) 747-0017 $95.00"));
        assert!(is_declared_total_line("251-747-0018 Total $40.00"));
        assert!(!is_declared_total_line("Pixel Protection - 251-747-0018 $7.00"));
        assert!(!is_declared_total_line("Line Access (251-747-0017) $20.00"));
        assert!(!is_declared_total_line("Plan - Unlimited Plus (251-747-0017) $80.00"));
    }

    #[test]
    fn test_fallback_pairs_far_devices_in_order() {
        let filler = "x".repeat(400);
        let text = format!("Apple iPhone 15\n\n{filler}\n\n251-747-0017\n");
        let assoc = associate_phone_lines(&text, Vec::new(), &[], &AnalysisConfig::default());
        assert_eq!(assoc.phone_lines.len(), 1);
        assert_eq!(assoc.phone_lines[0].phone_number, "2517470017");
        assert_eq!(assoc.phone_lines[0].monthly_total, 0.0);
        assert!(assoc.phone_lines[0].charges.is_empty());
    }

    #[test]
    fn test_fallback_unknown_line() {
        let items = vec![
            LineItem::new(charge("Line Access", 20.0)),
            LineItem::new(charge("Device Protection", 7.0)),
        ];
        let assoc =
            associate_phone_lines("no numbers here", items, &[], &AnalysisConfig::default());
        assert_eq!(assoc.phone_lines.len(), 1);
        let line = &assoc.phone_lines[0];
        assert_eq!(line.phone_number, UNKNOWN_LINE);
        assert_eq!(line.monthly_total, 27.0);
        assert_eq!(line.charges.len(), 2);
    }

    #[test]
    fn test_nothing_to_associate() {
        let assoc = associate_phone_lines("", Vec::new(), &[], &AnalysisConfig::default());
        assert!(assoc.phone_lines.is_empty());
    }
}
