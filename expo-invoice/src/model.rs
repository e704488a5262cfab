use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{InvoiceError, Result};
use crate::format::format_booking_number;
use crate::grouping::BillingRules;
use crate::record::Record;
use crate::schema;

/// Billing address of a recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub name: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

impl Address {
    fn from_record(record: &Record) -> Result<Self> {
        Ok(Address {
            name: text(record, schema::RECIPIENT_NAME)?,
            street: text(record, schema::RECIPIENT_STREET)?,
            postal_code: text(record, schema::RECIPIENT_POSTAL_CODE)?,
            city: text(record, schema::RECIPIENT_CITY)?,
        })
    }

    /// Printed lines: name, street, then postal code and city together.
    pub fn lines(&self) -> [String; 3] {
        [
            self.name.clone(),
            self.street.clone(),
            format!("{} {}", self.postal_code, self.city).trim().to_string(),
        ]
    }
}

/// One booked activity.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    /// Data row the item came from.
    pub row: usize,
    pub recipient: String,
    pub address: Address,
    pub activity: String,
    pub responsible: String,
    pub customer_name: String,
    pub booking_number: u64,
    pub datetime: String,
    pub price: Decimal,
    pub payment_method: Option<String>,
    pub title_holder: Option<String>,
    pub purchase_order: Option<String>,
}

impl LineItem {
    pub fn from_record(record: &Record) -> Result<Self> {
        let row = record.row();
        let booking_number = parse_booking_number(record.require(schema::BOOKING_NUMBER)?)
            .map_err(|e| e.at_row(row))?;
        format_booking_number(booking_number).map_err(|e| e.at_row(row))?;
        let price = parse_price(record.require(schema::PRICE)?).map_err(|e| e.at_row(row))?;

        Ok(LineItem {
            row,
            recipient: text(record, schema::RECIPIENT_NAME)?,
            address: Address::from_record(record)?,
            activity: text(record, schema::ACTIVITY)?,
            responsible: text(record, schema::BOOKER)?,
            customer_name: text(record, schema::CUSTOMER_NAME)?,
            booking_number,
            datetime: text(record, schema::END_DATETIME)?,
            price,
            payment_method: record
                .has_column(schema::PAYMENT_METHOD)
                .then(|| record.get(schema::PAYMENT_METHOD).unwrap_or_default().trim().to_string()),
            title_holder: optional(record, schema::TITLE_HOLDER),
            purchase_order: optional(record, schema::PURCHASE_ORDER),
        })
    }

    /// Without a payment-method column every item is billed. With one,
    /// an empty or missing value is not billable.
    pub fn is_billable(&self, accepted: &str) -> bool {
        match &self.payment_method {
            None => true,
            Some(method) => method == accepted.trim(),
        }
    }
}

/// All items billed to one recipient, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipientGroup {
    pub recipient: String,
    /// Taken from the group's first item.
    pub address: Address,
    pub items: Vec<LineItem>,
    /// Sum of billable prices.
    pub total: Decimal,
}

impl RecipientGroup {
    pub(crate) fn new(first: LineItem) -> Self {
        RecipientGroup {
            recipient: first.recipient.clone(),
            address: first.address.clone(),
            items: vec![first],
            total: Decimal::ZERO,
        }
    }

    pub fn billable_items<'a>(&'a self, rules: &'a BillingRules) -> impl Iterator<Item = &'a LineItem> + 'a {
        self.items
            .iter()
            .filter(move |item| item.is_billable(&rules.accepted_payment_method))
    }

    pub fn has_billable_items(&self, rules: &BillingRules) -> bool {
        self.billable_items(rules).next().is_some()
    }
}

fn text(record: &Record, field: &str) -> Result<String> {
    Ok(record.require(field)?.trim().to_string())
}

fn optional(record: &Record, field: &str) -> Option<String> {
    record
        .get(field)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Accepts `12.50`, `12,50`, `12.50 €`, `1,234.50` and `1.234,50`. A
/// lone comma is the decimal separator.
pub fn parse_price(raw: &str) -> Result<Decimal> {
    let invalid = || InvoiceError::format("price", raw, "not a decimal number");
    let cleaned = raw.trim().trim_end_matches('€').trim();
    let normalized = normalize_separators(cleaned).ok_or_else(invalid)?;
    let price = Decimal::from_str(&normalized).map_err(|_| invalid())?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(InvoiceError::format("price", raw, "negative amount"));
    }
    Ok(price)
}

/// Rewrite an amount with a `.` decimal point and no grouping. When both
/// separators appear the last one is the decimal point, and the other
/// must split the integer part into groups of three digits.
fn normalize_separators(cleaned: &str) -> Option<String> {
    let (decimal, grouping) = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(period), Some(comma)) if comma > period => (',', '.'),
        (Some(_), Some(_)) => ('.', ','),
        (None, Some(_)) => return Some(cleaned.replacen(',', ".", 1)),
        _ => return Some(cleaned.to_string()),
    };
    let (int_part, frac) = cleaned.rsplit_once(decimal)?;
    let mut groups = int_part.split(grouping);
    let lead = groups.next()?.trim_start_matches(|c| c == '+' || c == '-');
    let grouped = groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()));
    if lead.is_empty() || lead.len() > 3 || !grouped {
        return None;
    }
    Some(format!("{}.{}", int_part.replace(grouping, ""), frac))
}

/// Accepts an unsigned integer, or a spreadsheet float such as
/// `1234567.0` whose fraction is zero.
pub fn parse_booking_number(raw: &str) -> Result<u64> {
    let trimmed = raw.trim();
    let digits = match trimmed.split_once('.') {
        Some((int, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => int,
        _ => trimmed,
    };
    digits
        .parse::<u64>()
        .map_err(|_| InvoiceError::format("booking number", raw, "not an unsigned integer"))
}
