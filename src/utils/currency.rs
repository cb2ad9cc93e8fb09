//! Currency utility functions for Moroccan dirham amounts.
//!
//! All monetary values in the database are stored in centimes
//! (1 MAD = 100 centimes).
use crate::utils::locale::Locale;

pub const CURRENCY_CODE: &str = "MAD";

/// Platform commission on an amount, rounded down to the centime.
pub fn platform_fee(amount: i64, percent: i64) -> i64 {
    amount * percent / 100
}

fn group_digits(digits: &str, separator: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push_str(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// Format centimes for display in the user's locale.
pub fn format_amount(centimes: i64, locale: Locale) -> String {
    let sign = if centimes < 0 { "-" } else { "" };
    let abs = centimes.unsigned_abs();
    let whole = (abs / 100).to_string();
    let fraction = abs % 100;

    let (thousands, decimal, suffix) = match locale {
        Locale::En => (",", ".", CURRENCY_CODE),
        Locale::Fr => ("\u{202f}", ",", CURRENCY_CODE),
        Locale::De => (".", ",", CURRENCY_CODE),
        Locale::Ar => (",", ".", "د.م."),
    };

    format!(
        "{}{}{}{:02} {}",
        sign,
        group_digits(&whole, thousands),
        decimal,
        fraction,
        suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_per_locale() {
        assert_eq!(format_amount(123450, Locale::En), "1,234.50 MAD");
        assert_eq!(format_amount(123450, Locale::Fr), "1\u{202f}234,50 MAD");
        assert_eq!(format_amount(123450, Locale::De), "1.234,50 MAD");
        assert_eq!(format_amount(123450, Locale::Ar), "1,234.50 د.م.");
    }

    #[test]
    fn test_format_amount_edges() {
        assert_eq!(format_amount(0, Locale::En), "0.00 MAD");
        assert_eq!(format_amount(5, Locale::En), "0.05 MAD");
        assert_eq!(format_amount(-250, Locale::En), "-2.50 MAD");
        assert_eq!(format_amount(100_000_000, Locale::De), "1.000.000,00 MAD");
    }

    #[test]
    fn test_platform_fee_rounds_down() {
        assert_eq!(platform_fee(10_000, 10), 1_000);
        assert_eq!(platform_fee(999, 10), 99);
        assert_eq!(platform_fee(0, 10), 0);
    }
}
