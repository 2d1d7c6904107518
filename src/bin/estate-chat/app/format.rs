//! Plain-text rendering shared by the TUI and the one-shot mode.

use chrono::{DateTime, Local, Utc};
use estate_chat::listing::Bedroom;
use estate_chat::PropertyListing;

const CURRENCY: &str = "AED";

/// Whole-dirham price with thousands separators, e.g. `AED 1,200,000`.
pub fn format_price(price: f64) -> String {
    let rounded = price.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{CURRENCY} {sign}{grouped}")
}

pub fn format_bedrooms(bedrooms: &[Bedroom]) -> Option<String> {
    if bedrooms.is_empty() {
        return None;
    }
    let joined = bedrooms
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!("{joined} Bedrooms"))
}

pub fn local_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Lines of a listing card. Absent details are skipped.
pub fn listing_card(listing: &PropertyListing) -> Vec<String> {
    let mut lines = vec![listing.name().unwrap_or("Unnamed property").to_string()];
    if let Some(location) = listing.location_name() {
        lines.push(format!("  Location: {location}"));
    }
    if let Some(developer) = listing.developer_name() {
        lines.push(format!("  Developer: {developer}"));
    }
    if let Some(year) = listing.delivery_year() {
        lines.push(format!("  Delivery: {year}"));
    }
    if let Some(price) = listing.price_from() {
        lines.push(format!("  Starting from {}", format_price(price)));
    }
    if let Some(bedrooms) = format_bedrooms(listing.bedrooms()) {
        lines.push(format!("  {bedrooms}"));
    }
    if let Some(url) = listing.image_url() {
        lines.push(format!("  Image: {url}"));
    }
    lines
}

/// Wraps `text` to `width` columns; blank input still yields one line.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let wrapped: Vec<String> = textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(|line| line.into_owned())
        .collect();
    if wrapped.is_empty() {
        vec![String::new()]
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(1_200_000.0, "AED 1,200,000")]
    #[case(950.0, "AED 950")]
    #[case(1000.0, "AED 1,000")]
    #[case(2_499_999.6, "AED 2,500,000")]
    fn prices_are_grouped(#[case] price: f64, #[case] expected: &str) {
        assert_eq!(format_price(price), expected);
    }

    #[test]
    fn full_card_lists_every_detail() {
        let listing: PropertyListing = serde_json::from_value(json!({
            "name": "Marina Heights",
            "location": {"full_name": "Dubai Marina, Dubai"},
            "developer": {"name": "Emaar"},
            "delivery_date": "2026-12-31",
            "price": {"from": 1200000},
            "bedrooms": [1, 2]
        }))
        .unwrap();
        assert_eq!(
            listing_card(&listing),
            vec![
                "Marina Heights",
                "  Location: Dubai Marina, Dubai",
                "  Developer: Emaar",
                "  Delivery: 2026",
                "  Starting from AED 1,200,000",
                "  1, 2 Bedrooms",
            ]
        );
    }

    #[test]
    fn sparse_card_skips_missing_details() {
        let listing: PropertyListing =
            serde_json::from_value(json!({"price": {"from": 0}, "bedrooms": []})).unwrap();
        assert_eq!(listing_card(&listing), vec!["Unnamed property"]);
    }

    #[test]
    fn wrap_keeps_blank_messages_visible() {
        assert_eq!(wrap_text("", 10), vec![String::new()]);
        assert_eq!(wrap_text("two bedroom flat", 8), vec!["two", "bedroom", "flat"]);
    }
}
