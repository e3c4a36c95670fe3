//! Bill header fields: account number, billing period and amount due.
//! Each falls back to a sentinel when the text does not reveal it.

use billscan_core::{BillingPeriod, UNKNOWN, parse_amount};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static ACCOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\baccount\s*(?:number|no\.?|#)?\s*[:#]?\s*(\d[\d-]{4,}\d)")
        .expect("valid account regex")
});

const MONTH_DAY: &str = r"[A-Za-z]{3,9}\.?\s+\d{1,2}";
const RANGE_SEP: &str = r"\s*(?:-|–|to|through|thru)\s*";

/// "Jan 12 - Feb 11, 2025" / "January 12, 2025 to February 11, 2025"
static NAMED_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?P<start>{MONTH_DAY})(?:,?\s+(?P<y1>\d{{4}}))?{RANGE_SEP}(?P<end>{MONTH_DAY}),?\s+(?P<y2>\d{{4}})"
    ))
    .expect("valid named range regex")
});

/// "01/12/2025 - 02/11/2025"
static NUMERIC_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?P<start>\d{{1,2}}/\d{{1,2}}/\d{{2,4}}){RANGE_SEP}(?P<end>\d{{1,2}}/\d{{1,2}}/\d{{2,4}})"
    ))
    .expect("valid numeric range regex")
});

static PERIOD_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:billing|bill|service|statement)\s+(?:period|cycle|dates?)\b")
        .expect("valid period label regex")
});

static AMOUNT_DUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:total\s+amount\s+due|total\s+due|amount\s+due|balance\s+due|total\s+balance)\b",
        r"[^$\d\n]{0,40}\$?\s?(\d[\d,]*\.\d{2})"
    ))
    .expect("valid amount due regex")
});

fn month_number(name: &str) -> Option<u32> {
    let m = match name.get(..3)?.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(m)
}

/// "Jan 12" → (1, 12)
fn parse_month_day(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split_whitespace();
    let month = month_number(parts.next()?.trim_end_matches('.'))?;
    let day: u32 = parts.next()?.parse().ok()?;
    Some((month, day))
}

/// "01/12/2025" or "1/12/25"
fn parse_numeric_date(s: &str) -> Option<NaiveDate> {
    let mut it = s.split('/');
    let m: u32 = it.next()?.parse().ok()?;
    let d: u32 = it.next()?.parse().ok()?;
    let y: i32 = it.next()?.parse().ok()?;
    let y = if y < 100 { 2000 + y } else { y };
    NaiveDate::from_ymd_opt(y, m, d)
}

fn named_range(text: &str) -> Option<BillingPeriod> {
    NAMED_RANGE_RE.captures_iter(text).find_map(|caps| {
        let (m1, d1) = parse_month_day(&caps["start"])?;
        let (m2, d2) = parse_month_day(&caps["end"])?;
        let y2: i32 = caps["y2"].parse().ok()?;
        // A range without a start year crosses New Year when the months wrap
        let y1: i32 = match caps.name("y1") {
            Some(y) => y.as_str().parse().ok()?,
            None if m1 > m2 => y2 - 1,
            None => y2,
        };

        Some(BillingPeriod {
            text: caps[0].trim().to_string(),
            start: NaiveDate::from_ymd_opt(y1, m1, d1),
            end: NaiveDate::from_ymd_opt(y2, m2, d2),
        })
    })
}

fn numeric_range(text: &str) -> Option<BillingPeriod> {
    let caps = NUMERIC_RANGE_RE.captures(text)?;
    Some(BillingPeriod {
        text: caps[0].trim().to_string(),
        start: parse_numeric_date(&caps["start"]),
        end: parse_numeric_date(&caps["end"]),
    })
}

fn any_range(text: &str) -> Option<BillingPeriod> {
    named_range(text).or_else(|| numeric_range(text))
}

pub fn account_number(texts: &[&str]) -> String {
    texts
        .iter()
        .find_map(|t| ACCOUNT_RE.captures(t).map(|c| c[1].to_string()))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// A labelled period ("Billing period: ...") is preferred over the first
/// date range found anywhere.
pub fn billing_period(texts: &[&str]) -> BillingPeriod {
    for t in texts {
        for m in PERIOD_LABEL_RE.find_iter(t) {
            let rest = &t[m.end()..];
            let line = rest.lines().next().unwrap_or("");
            if let Some(p) = any_range(line) {
                return p;
            }
        }
    }
    texts
        .iter()
        .find_map(|t| any_range(t))
        .unwrap_or_else(BillingPeriod::unknown)
}

pub fn total_amount_due(texts: &[&str]) -> f64 {
    texts
        .iter()
        .find_map(|t| AMOUNT_DUE_RE.captures(t).and_then(|c| parse_amount(&c[1])))
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_number() {
        assert_eq!(account_number(&["Account number: 987654321-00001"]), "987654321-00001");
        assert_eq!(account_number(&["Acct", "Account # 4412345"]), "4412345");
        assert_eq!(account_number(&["no header"]), UNKNOWN);
    }

    #[test]
    fn test_named_billing_period_wraps_year() {
        let p = billing_period(&["Billing period: Dec 12 - Jan 11, 2025\n"]);
        assert_eq!(p.text, "Dec 12 - Jan 11, 2025");
        assert_eq!(p.start, NaiveDate::from_ymd_opt(2024, 12, 12));
        assert_eq!(p.end, NaiveDate::from_ymd_opt(2025, 1, 11));
        assert_eq!(p.days(), Some(31));
    }

    #[test]
    fn test_full_named_period() {
        let p = billing_period(&["Statement period January 12, 2025 to February 11, 2025"]);
        assert_eq!(p.start, NaiveDate::from_ymd_opt(2025, 1, 12));
        assert_eq!(p.end, NaiveDate::from_ymd_opt(2025, 2, 11));
    }

    #[test]
    fn test_numeric_period_and_unknown() {
        let p = billing_period(&["", "Service 01/12/25 - 02/11/25"]);
        assert_eq!(p.start, NaiveDate::from_ymd_opt(2025, 1, 12));
        assert_eq!(p.end, NaiveDate::from_ymd_opt(2025, 2, 11));
        assert!(!billing_period(&["nothing"]).is_known());
    }

    #[test]
    fn test_total_amount_due() {
        assert_eq!(total_amount_due(&["Total Amount Due: $1,127.47"]), 1127.47);
        assert_eq!(total_amount_due(&["", "| Amount Due | $99.10 |"]), 99.10);
        assert_eq!(total_amount_due(&["Plan $80.00"]), 0.0);
    }
}
