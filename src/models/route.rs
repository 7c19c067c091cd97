//! Popular routes shown next to the tariff table
//!
//! Rows of the `routes` tab. Only read, never written by this service.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::fields::FieldSource;

const SPIRITUAL: [&str; 10] = [
    "Tirupati",
    "Tiruvannamalai",
    "Velankanni",
    "Rameswaram",
    "Kanchipuram",
    "Madurai",
    "Palani",
    "Chidambaram",
    "Kumbakonam",
    "Thanjavur",
];
const HILLS: [&str; 7] = ["Ooty", "Kodaikanal", "Yercaud", "Munnar", "Yelagiri", "Valparai", "Coorg"];
const LEISURE: [&str; 6] = ["Pondicherry", "Mahabalipuram", "Goa", "Mysore", "Kanyakumari", "Hogenakkal"];

/// Category derived from the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteCategory {
    Spiritual,
    Hills,
    Leisure,
    /// Everything else; the site labels these as B2B / intercity
    Intercity,
}

impl RouteCategory {
    pub fn for_destination(destination: &str) -> Self {
        let has = |places: &[&str]| places.iter().any(|p| destination.contains(p));
        if has(&SPIRITUAL) {
            RouteCategory::Spiritual
        } else if has(&HILLS) {
            RouteCategory::Hills
        } else if has(&LEISURE) {
            RouteCategory::Leisure
        } else {
            RouteCategory::Intercity
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            RouteCategory::Spiritual => "Spiritual",
            RouteCategory::Hills => "Hill Station",
            RouteCategory::Leisure => "Leisure",
            RouteCategory::Intercity => "Intercity",
        }
    }
}

/// Fixed one-way price per vehicle tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierPrices {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sedan: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub innova: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crysta: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tempo: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRecord {
    pub origin: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<Decimal>,
    pub slug: String,
    pub prices: TierPrices,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub category: RouteCategory,
    pub category_display: String,
}

/// Lower-kebab slug, `Chennai to Bangalore` style routes become `chennai-to-bangalore`
pub fn slugify(value: &str) -> String {
    value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn price(row: &HashMap<String, String>, aliases: &[&str]) -> Option<Decimal> {
    row.lookup(aliases).and_then(|raw| {
        let cleaned: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
        cleaned.parse().ok()
    })
}

impl RouteRecord {
    /// Parse a row of the `routes` tab. Rows without origin or destination are rejected.
    pub fn from_row(row: &HashMap<String, String>) -> Option<Self> {
        let origin = row.lookup(&["Origin", "From"])?;
        let destination = row.lookup(&["Destination", "To"])?;
        let slug = row
            .lookup(&["Route_Slug", "Slug"])
            .map(|s| slugify(&s))
            .unwrap_or_else(|| slugify(&format!("{}-to-{}", origin, destination)));
        let category = RouteCategory::for_destination(&destination);
        let image_url = row
            .lookup(&["Image_URL", "Image"])
            .filter(|url| url.starts_with("http"));

        Some(Self {
            distance_km: price(row, &["Distance", "Distance_Km"]),
            prices: TierPrices {
                sedan: price(row, &["Price_Sedan"]),
                innova: price(row, &["Price_Innova"]),
                crysta: price(row, &["Price_Crysta"]),
                tempo: price(row, &["Price_Tempo"]),
            },
            slug,
            image_url,
            category,
            category_display: category.display().to_string(),
            origin,
            destination,
        })
    }

    pub fn from_rows(rows: &[HashMap<String, String>]) -> Vec<Self> {
        rows.iter().filter_map(Self::from_row).collect()
    }
}
