//! Display formatting for predicted and submitted phone attributes.

use rust_decimal::prelude::*;

/// Inserts `,` between groups of three digits in a plain integer string.
fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `1299.5` -> `$1,299.50`
pub fn format_price(price: f64) -> String {
    let Some(mut amount) = Decimal::from_f64_retain(price) else {
        return format!("${}", price);
    };
    amount = amount.round_dp(2);
    amount.rescale(2);

    let sign = if amount.is_sign_negative() { "-" } else { "" };
    let text = amount.abs().to_string();
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    format!("{}${}.{}", sign, group_thousands(whole), cents)
}

/// `8.0` -> `8 GB`, `1.5` -> `1.5 GB`
pub fn format_ram(gigabytes: f64) -> String {
    if gigabytes.fract() == 0.0 {
        format!("{} GB", gigabytes as i64)
    } else {
        format!("{:.1} GB", gigabytes)
    }
}

/// `4000.0` -> `4,000 mAh`
pub fn format_battery(milliamp_hours: f64) -> String {
    let rounded = milliamp_hours.round().max(0.0) as u64;
    format!("{} mAh", group_thousands(&rounded.to_string()))
}

/// `6.1` -> `6.1"`
pub fn format_screen(inches: f64) -> String {
    format!("{:.1}\"", inches)
}

/// `174.0` -> `174 g`
pub fn format_weight(grams: f64) -> String {
    format!("{} g", grams.round() as i64)
}
