use crate::extract::{FieldKey, FieldValues};
use crate::listing::Listing;
use chrono::Datelike;
use thiserror::Error;

/// Why a candidate record was not accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no price on page")]
    MissingPrice,

    #[error("price {price} below floor {floor}")]
    PriceBelowFloor { price: u64, floor: u64 },

    #[error("missing {0}")]
    MissingField(FieldKey),

    #[error("model year {year} is after {current}")]
    FutureModelYear { year: u64, current: i32 },

    #[error("power is zero")]
    ZeroPower,
}

/// Enforces required fields and derives the listing age
#[derive(Debug, Clone)]
pub struct Validator {
    min_price: u64,
    current_year: i32,
}

impl Validator {
    pub fn new(min_price: u64, current_year: i32) -> Self {
        Self {
            min_price,
            current_year,
        }
    }

    /// Validator that computes ages against the local calendar year
    pub fn for_today(min_price: u64) -> Self {
        Self::new(min_price, chrono::Local::now().year())
    }

    /// Rechecks a listing that was built elsewhere, such as a snapshot row
    ///
    /// Applies the price floor and requires non-empty brand, model and
    /// transmission and a non-zero power.
    pub fn check(&self, listing: &Listing) -> Result<(), Rejection> {
        if listing.price < self.min_price {
            return Err(Rejection::PriceBelowFloor {
                price: listing.price,
                floor: self.min_price,
            });
        }

        for (key, value) in [
            (FieldKey::Brand, &listing.brand),
            (FieldKey::Model, &listing.model),
            (FieldKey::Transmission, &listing.transmission),
        ] {
            if value.trim().is_empty() {
                return Err(Rejection::MissingField(key));
            }
        }

        if listing.power_kw == 0 {
            return Err(Rejection::ZeroPower);
        }
        Ok(())
    }

    /// Builds a [`Listing`] or reports the first missing requirement
    ///
    /// The model falls back to the trim field when the page has no model
    /// label.
    pub fn validate(
        &self,
        fields: &FieldValues,
        price: Option<u64>,
        title: &str,
        url: &str,
    ) -> Result<Listing, Rejection> {
        let price = price.ok_or(Rejection::MissingPrice)?;
        if price < self.min_price {
            return Err(Rejection::PriceBelowFloor {
                price,
                floor: self.min_price,
            });
        }

        let brand = fields
            .text(FieldKey::Brand)
            .ok_or(Rejection::MissingField(FieldKey::Brand))?;
        let model = fields
            .text(FieldKey::Model)
            .or_else(|| fields.text(FieldKey::Trim))
            .ok_or(Rejection::MissingField(FieldKey::Model))?;

        let year = fields
            .number(FieldKey::Year)
            .ok_or(Rejection::MissingField(FieldKey::Year))?;
        let mileage_km = fields
            .number(FieldKey::MileageKm)
            .ok_or(Rejection::MissingField(FieldKey::MileageKm))?;
        let power_kw = fields
            .number(FieldKey::PowerKw)
            .ok_or(Rejection::MissingField(FieldKey::PowerKw))?;

        let transmission = fields
            .text(FieldKey::Transmission)
            .ok_or(Rejection::MissingField(FieldKey::Transmission))?;

        let model_year = i64::try_from(year).unwrap_or(i64::MAX);
        let age_years = u32::try_from(i64::from(self.current_year) - model_year)
            .map_err(|_| Rejection::FutureModelYear {
                year,
                current: self.current_year,
            })?;

        if power_kw == 0 {
            return Err(Rejection::ZeroPower);
        }

        Ok(Listing {
            price,
            age_years,
            mileage_km,
            brand: brand.to_string(),
            model: model.to_string(),
            power_kw,
            transmission: transmission.to_string(),
            source_url: url.to_string(),
            title: title.to_string(),
        })
    }
}
