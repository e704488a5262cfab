//! Display formats for amounts and booking references.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{InvoiceError, Result};

/// Amount formatting: two decimals, `.` between thousands, `,` before
/// the cents, then a currency suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceFormat {
    pub suffix: String,
}

impl Default for PriceFormat {
    fn default() -> Self {
        PriceFormat {
            suffix: " €".to_string(),
        }
    }
}

impl PriceFormat {
    pub fn format(&self, amount: Decimal) -> String {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let plain = format!("{:.2}", rounded.abs());
        let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut out = String::with_capacity(plain.len() + self.suffix.len() + 4);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            out.push('-');
        }
        out.push_str(&group_thousands(int_part, '.'));
        out.push(',');
        out.push_str(frac_part);
        out.push_str(&self.suffix);
        out
    }
}

fn group_thousands(digits: &str, sep: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

/// `1234.5` -> `1.234,50 €`.
pub fn format_price(amount: Decimal) -> String {
    PriceFormat::default().format(amount)
}

/// Booking reference layout: `<prefix>-<first three digits>-<rest>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingFormat {
    pub prefix: String,
}

impl Default for BookingFormat {
    fn default() -> Self {
        BookingFormat {
            prefix: "EX".to_string(),
        }
    }
}

/// Shortest booking number the platform issues.
pub const MIN_BOOKING_DIGITS: usize = 7;

impl BookingFormat {
    pub fn format(&self, number: u64) -> Result<String> {
        let digits = number.to_string();
        if digits.len() < MIN_BOOKING_DIGITS {
            return Err(InvoiceError::format(
                "booking number",
                digits,
                "expected at least 7 digits",
            ));
        }
        let (head, tail) = digits.split_at(3);
        Ok(format!("{}-{}-{}", self.prefix, head, tail))
    }
}

pub fn format_booking_number(number: u64) -> Result<String> {
    BookingFormat::default().format(number)
}
