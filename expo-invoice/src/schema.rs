//! Column names of the booking export.
//!
//! The ticketing platform puts a line break between the entity and the
//! attribute in every header, and the break is part of the name.

pub const RECIPIENT_NAME: &str = "Customer\nInvoice address name";
pub const RECIPIENT_STREET: &str = "Customer\nInvoice address street";
pub const RECIPIENT_POSTAL_CODE: &str = "Customer\nInvoice address postal code";
pub const RECIPIENT_CITY: &str = "Customer\nInvoice address city";
pub const ACTIVITY: &str = "Offer\nName";
pub const BOOKER: &str = "Booker\nFull name";
pub const CUSTOMER_NAME: &str = "Customer\nName";
pub const BOOKING_NUMBER: &str = "Booking\nNumber";
pub const START_DATETIME: &str = "Offer\nStart date & time";
pub const END_DATETIME: &str = "Offer\nEnd date & time";
pub const PRICE: &str = "Reservation\nPrice";

// Only present in the extended export.
pub const PAYMENT_METHOD: &str = "Booking\nPayment method";
pub const TITLE_HOLDER: &str = "Ticket\nTitle holder name";
pub const PURCHASE_ORDER: &str = "Booking\nPurchase order number";

/// Canonical form of a header cell: CRLF folded to LF, byte-order mark
/// and surrounding whitespace removed, and whitespace around the inner
/// line break trimmed.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .replace("\r\n", "\n")
        .split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_normalize_to_constants() {
        assert_eq!(normalize_header("\u{feff}Offer\r\nName"), ACTIVITY);
        assert_eq!(normalize_header(" Reservation \n Price "), PRICE);
        assert_eq!(normalize_header(BOOKING_NUMBER), BOOKING_NUMBER);
    }
}
