/// Floor for the NER denominator. Anything below it is treated as a
/// zero-sized lease and every tier resolves to 0.
pub const EPSILON: f64 = 1e-9;

/// Clamps a value into the non-negative finite domain the engine expects.
/// NaN, infinities and negatives all become 0.
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Keeps the sign but replaces an overflowed or NaN intermediate with 0.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// `numerator / divisor`, or 0 when the divisor is not a positive area.
pub fn safe_ratio(numerator: f64, divisor: f64) -> f64 {
    if divisor > 0.0 {
        numerator / divisor
    } else {
        0.0
    }
}

/// Parses user-facing number text into a non-negative value.
///
/// Accepts both `.` and `,` as the decimal separator. When both appear, the
/// right-most one is the decimal separator and the other is a thousands
/// separator. When only one kind appears more than once it is a thousands
/// separator. Spaces, apostrophes and underscores are dropped. Anything
/// unparseable yields 0.
pub fn parse_decimal(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '\'' | '_' | '\u{a0}'))
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');
    let decimal_sep = match (last_dot, last_comma) {
        (Some(d), Some(c)) => Some(if d > c { '.' } else { ',' }),
        (Some(_), None) if cleaned.matches('.').count() == 1 => Some('.'),
        (None, Some(_)) if cleaned.matches(',').count() == 1 => Some(','),
        _ => None,
    };

    let mut normalized = String::with_capacity(cleaned.len());
    for c in cleaned.chars() {
        match c {
            '.' | ',' if Some(c) == decimal_sep => normalized.push('.'),
            '.' | ',' => {}
            other => normalized.push(other),
        }
    }

    normalized.parse::<f64>().map(non_negative).unwrap_or(0.0)
}
