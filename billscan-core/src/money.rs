//! Dollar amount helpers. Amounts are kept as `f64` dollars rounded to cents.

/// Round to two decimal places.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Parse a printed amount such as `$1,234.56`, `-$10.00`, `$-10.00`,
/// `$ -10.00`, `($10.00)` or `45.00`. Returns `None` when no number is present.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let first_digit = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
    let negative = s[..first_digit].contains('-') || (s.starts_with('(') && s.ends_with(')'));

    let digits: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() || !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let value: f64 = digits.parse().ok()?;
    Some(round_cents(if negative { -value } else { value }))
}

/// Sum amounts and round the result to cents.
pub fn sum_cents<I: IntoIterator<Item = f64>>(amounts: I) -> f64 {
    round_cents(amounts.into_iter().sum())
}
