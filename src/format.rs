/// Most fractional digits ever shown on the display.
pub const MAX_FRACTION_DIGITS: usize = 8;

/// Formats a value for the display: at most [`MAX_FRACTION_DIGITS`] fractional
/// digits, no trailing zeros, no exponent and no grouping.
///
/// Anything that rounds to zero is shown as `0`, never `-0`.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        let s = if value.is_sign_positive() { "Infinity" } else { "-Infinity" };
        return s.to_string();
    }

    let formatted = format!("{:.*}", MAX_FRACTION_DIGITS, value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');

    match trimmed {
        "-0" => "0".to_string(),
        s => s.to_string(),
    }
}
