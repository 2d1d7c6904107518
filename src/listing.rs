//! Property listings returned alongside assistant answers.
//!
//! Listings are passed through from the backend untouched. Every field is
//! optional and unknown keys are kept in `extra`, so a listing serializes
//! back to what the backend sent. The helpers below only check for presence.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A property record attached to an assistant message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyListing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub developer: Option<Developer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<Vec<Bedroom>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ListingImage>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Developer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Price range in AED.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bedroom entry: usually a count, sometimes a label such as `"Studio"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bedroom {
    Count(u32),
    Label(String),
    Other(Value),
}

impl fmt::Display for Bedroom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bedroom::Count(n) => write!(f, "{n}"),
            Bedroom::Label(label) => write!(f, "{label}"),
            Bedroom::Other(value) => write!(f, "{value}"),
        }
    }
}

impl PropertyListing {
    pub fn name(&self) -> Option<&str> {
        non_empty(self.name.as_deref())
    }

    pub fn location_name(&self) -> Option<&str> {
        non_empty(self.location.as_ref()?.full_name.as_deref())
    }

    pub fn developer_name(&self) -> Option<&str> {
        non_empty(self.developer.as_ref()?.name.as_deref())
    }

    /// URL of the first image's medium rendition.
    pub fn image_url(&self) -> Option<&str> {
        let first = self.images.as_ref()?.first()?;
        non_empty(first.medium.as_deref())
    }

    /// Starting price; a zero price counts as absent.
    pub fn price_from(&self) -> Option<f64> {
        self.price
            .as_ref()?
            .from
            .filter(|price| *price != 0.0 && price.is_finite())
    }

    pub fn bedrooms(&self) -> &[Bedroom] {
        self.bedrooms.as_deref().unwrap_or_default()
    }

    /// Year component of `delivery_date`.
    ///
    /// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` timestamps,
    /// plain `YYYY-MM-DD` dates and bare years.
    pub fn delivery_year(&self) -> Option<i32> {
        let raw = self.delivery_date.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.year());
        }
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(ts.year());
        }
        if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(date.year());
        }
        if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
            return raw.parse().ok();
        }
        None
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> PropertyListing {
        serde_json::from_value(json!({
            "name": "Marina Heights",
            "location": {"full_name": "Dubai Marina, Dubai", "id": 42},
            "developer": {"name": "Emaar"},
            "delivery_date": "2026-12-31T00:00:00Z",
            "price": {"from": 1200000, "to": 3400000, "currency": "AED"},
            "bedrooms": [1, 2, "Studio"],
            "images": [{"medium": "https://cdn.example/m.jpg", "small": "s.jpg"}],
            "handover": "Q4"
        }))
        .unwrap()
    }

    #[test]
    fn helpers_read_nested_fields() {
        let listing = sample();
        assert_eq!(listing.name(), Some("Marina Heights"));
        assert_eq!(listing.location_name(), Some("Dubai Marina, Dubai"));
        assert_eq!(listing.developer_name(), Some("Emaar"));
        assert_eq!(listing.image_url(), Some("https://cdn.example/m.jpg"));
        assert_eq!(listing.price_from(), Some(1_200_000.0));
        assert_eq!(listing.delivery_year(), Some(2026));
        let beds: Vec<String> = listing.bedrooms().iter().map(|b| b.to_string()).collect();
        assert_eq!(beds, vec!["1", "2", "Studio"]);
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let listing = sample();
        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["handover"], "Q4");
        assert_eq!(value["location"]["id"], 42);
        assert_eq!(value["price"]["currency"], "AED");
        assert_eq!(value["images"][0]["small"], "s.jpg");
    }

    #[test]
    fn sparse_listing_has_no_details() {
        let listing: PropertyListing =
            serde_json::from_value(json!({"name": "Marina Heights", "price": {"from": 0}}))
                .unwrap();
        assert_eq!(listing.location_name(), None);
        assert_eq!(listing.developer_name(), None);
        assert_eq!(listing.image_url(), None);
        assert_eq!(listing.price_from(), None);
        assert_eq!(listing.delivery_year(), None);
        assert!(listing.bedrooms().is_empty());
    }

    #[test]
    fn delivery_year_accepts_several_formats() {
        for (raw, year) in [
            ("2027-03-01", Some(2027)),
            ("2028-06-30T12:00:00", Some(2028)),
            ("2029", Some(2029)),
            ("soon", None),
        ] {
            let listing = PropertyListing {
                delivery_date: Some(raw.to_string()),
                ..Default::default()
            };
            assert_eq!(listing.delivery_year(), year, "input {raw}");
        }
    }
}
