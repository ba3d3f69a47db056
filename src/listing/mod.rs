//! The dataset row and the gate that produces it
//!
//! A [`Listing`] only exists once every required field has been found and
//! checked by the [`Validator`]; partial candidates are rejected.

mod validator;

pub use validator::{Rejection, Validator};

use serde::{Deserialize, Serialize};

/// Column order of the dataset file
pub const COLUMNS: [&str; 9] = [
    "Price_market",
    "Age",
    "Mileage",
    "Brand",
    "Model",
    "Power_kW",
    "Transmission",
    "url",
    "title",
];

/// One accepted used-car listing
///
/// Field order matches [`COLUMNS`]; the CSV writer relies on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Asking price in euros
    #[serde(rename = "Price_market")]
    pub price: u64,

    /// Years since the model year
    #[serde(rename = "Age")]
    pub age_years: u32,

    #[serde(rename = "Mileage")]
    pub mileage_km: u64,

    #[serde(rename = "Brand")]
    pub brand: String,

    #[serde(rename = "Model")]
    pub model: String,

    #[serde(rename = "Power_kW")]
    pub power_kw: u64,

    #[serde(rename = "Transmission")]
    pub transmission: String,

    /// Item page URL, the dedup key
    #[serde(rename = "url")]
    pub source_url: String,

    #[serde(rename = "title", default)]
    pub title: String,
}
