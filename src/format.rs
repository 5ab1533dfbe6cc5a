//! Human-readable number rendering for KPI and chart text.

/// Group the digits of an unsigned integer with commas (`1234567` -> `1,234,567`).
pub fn format_u128_with_commas(value: u128) -> String {
    let raw = value.to_string();
    let mut grouped_reversed = String::with_capacity(raw.len() + (raw.len() / 3));
    for (idx, ch) in raw.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            grouped_reversed.push(',');
        }
        grouped_reversed.push(ch);
    }
    grouped_reversed.chars().rev().collect()
}

/// Render a number with thousands separators and at most two decimals.
///
/// Integral values have no fractional part (`12,500`); others keep up to two
/// decimals without trailing zeros (`1,234.5`). Non-finite input renders as `0`.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = (value * 100.0).round() / 100.0;
    let magnitude = rounded.abs();
    let integer = magnitude.trunc();
    let cents = ((magnitude - integer) * 100.0).round() as u32;
    let sign = if rounded < 0.0 { "-" } else { "" };
    let grouped = format_u128_with_commas(integer as u128);
    match cents {
        0 => format!("{sign}{grouped}"),
        c if c % 10 == 0 => format!("{sign}{grouped}.{}", c / 10),
        c => format!("{sign}{grouped}.{c:02}"),
    }
}

/// Render a 0..1 share as a percentage with one decimal (`0.125` -> `12.5%`).
pub fn format_share(share: f64) -> String {
    format!("{:.1}%", share * 100.0)
}
