//! Prediction requests over a price model
//!
//! A [`PredictionService`] owns its model from construction on and never
//! mutates it. Requests are JSON objects, optionally wrapped in a `data` or
//! `input_data` envelope, carrying one record, a list of records, or a map
//! of columns.

use crate::config::EstimatorConfig;
use crate::estimate::{estimate, Query};
use crate::listing::Listing;
use crate::storage::{CsvSnapshot, SnapshotStore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use thiserror::Error;

/// Why a request could not be answered
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
}

/// One row of model input
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeatureRow {
    #[serde(rename = "Age")]
    pub age: f64,

    #[serde(rename = "Mileage")]
    pub mileage: f64,

    #[serde(rename = "Brand")]
    pub brand: String,

    #[serde(rename = "Model")]
    pub model: String,

    #[serde(rename = "Power_kW")]
    pub power_kw: f64,

    #[serde(rename = "Transmission", default)]
    pub transmission: Option<String>,
}

/// Column-oriented request body
#[derive(Debug, Clone, Deserialize)]
struct ColumnMap {
    #[serde(rename = "Age")]
    age: Vec<f64>,

    #[serde(rename = "Mileage")]
    mileage: Vec<f64>,

    #[serde(rename = "Brand")]
    brand: Vec<String>,

    #[serde(rename = "Model")]
    model: Vec<String>,

    #[serde(rename = "Power_kW")]
    power_kw: Vec<f64>,

    #[serde(rename = "Transmission", default)]
    transmission: Option<Vec<Option<String>>>,
}

impl ColumnMap {
    fn into_rows(self) -> Result<Vec<FeatureRow>, ErrorKind> {
        let n = self.age.len();
        let lengths = [
            self.mileage.len(),
            self.brand.len(),
            self.model.len(),
            self.power_kw.len(),
            self.transmission.as_ref().map_or(n, Vec::len),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(ErrorKind::SchemaMismatch(
                "columns have different lengths".to_string(),
            ));
        }

        let mut transmission = self.transmission.unwrap_or_else(|| vec![None; n]).into_iter();
        let rows = self
            .age
            .into_iter()
            .zip(self.mileage)
            .zip(self.brand)
            .zip(self.model)
            .zip(self.power_kw)
            .map(|((((age, mileage), brand), model), power_kw)| FeatureRow {
                age,
                mileage,
                brand,
                model,
                power_kw,
                transmission: transmission.next().flatten(),
            })
            .collect();
        Ok(rows)
    }
}

/// Accepted request shapes
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Record(FeatureRow),
    RecordList(Vec<FeatureRow>),
    ColumnMap(Vec<FeatureRow>),
}

impl Payload {
    /// Parses a request body
    pub fn parse(raw: &str) -> Result<Self, ErrorKind> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ErrorKind::MalformedPayload(e.to_string()))?;
        Self::from_value(value)
    }

    /// Classifies a JSON value, unwrapping a `data` / `input_data` envelope
    pub fn from_value(value: Value) -> Result<Self, ErrorKind> {
        let Value::Object(mut object) = value else {
            return Err(ErrorKind::MalformedPayload(
                "request body must be a JSON object".to_string(),
            ));
        };

        let content = match object.remove("data").or_else(|| object.remove("input_data")) {
            Some(inner) => inner,
            None => Value::Object(object),
        };

        match content {
            Value::Array(items) => {
                let rows = serde_json::from_value(Value::Array(items))
                    .map_err(|e| ErrorKind::SchemaMismatch(e.to_string()))?;
                Ok(Payload::RecordList(rows))
            }
            Value::Object(fields) if is_column_map(&fields) => {
                let columns: ColumnMap = serde_json::from_value(Value::Object(fields))
                    .map_err(|e| ErrorKind::SchemaMismatch(e.to_string()))?;
                Ok(Payload::ColumnMap(columns.into_rows()?))
            }
            Value::Object(fields) => {
                let row = serde_json::from_value(Value::Object(fields))
                    .map_err(|e| ErrorKind::SchemaMismatch(e.to_string()))?;
                Ok(Payload::Record(row))
            }
            _ => Err(ErrorKind::MalformedPayload(
                "expected a record, a list of records or a column map".to_string(),
            )),
        }
    }

    /// Flattens any shape into rows
    pub fn into_rows(self) -> Vec<FeatureRow> {
        match self {
            Payload::Record(row) => vec![row],
            Payload::RecordList(rows) | Payload::ColumnMap(rows) => rows,
        }
    }
}

fn is_column_map(fields: &Map<String, Value>) -> bool {
    !fields.is_empty() && fields.values().all(Value::is_array)
}

/// Answer to a prediction request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predictions {
    pub predictions: Vec<f64>,
    pub n_rows: usize,
}

/// Anything that prices feature rows
pub trait PriceModel: Send + Sync {
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, ErrorKind>;
}

/// [`PriceModel`] backed by the nearest-neighbour estimator
pub struct NeighborModel {
    records: Vec<Listing>,
    config: EstimatorConfig,
}

impl NeighborModel {
    pub fn new(records: Vec<Listing>, config: EstimatorConfig) -> Result<Self, ErrorKind> {
        if records.is_empty() {
            return Err(ErrorKind::ModelUnavailable("dataset is empty".to_string()));
        }
        Ok(Self { records, config })
    }

    /// Loads the model's dataset from a CSV snapshot
    pub fn from_dataset(path: &Path, config: EstimatorConfig) -> Result<Self, ErrorKind> {
        if !path.exists() {
            return Err(ErrorKind::ModelUnavailable(format!(
                "dataset {} does not exist",
                path.display()
            )));
        }
        let state = CsvSnapshot::new(path)
            .load()
            .map_err(|e| ErrorKind::ModelUnavailable(e.to_string()))?;
        Self::new(state.records().to_vec(), config)
    }
}

impl PriceModel for NeighborModel {
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, ErrorKind> {
        rows.iter()
            .map(|row| {
                let query = Query {
                    brand: row.brand.clone(),
                    model: row.model.clone(),
                    transmission: row.transmission.clone(),
                    age_years: row.age,
                    mileage_km: row.mileage,
                    power_kw: row.power_kw,
                };
                estimate(&self.records, &query, &self.config)
                    .map(|e| e.price)
                    .ok_or_else(|| ErrorKind::ModelUnavailable("no estimate".to_string()))
            })
            .collect()
    }
}

/// Request handler over an owned model
pub struct PredictionService {
    model: Option<Box<dyn PriceModel>>,
}

impl PredictionService {
    pub fn new(model: Box<dyn PriceModel>) -> Self {
        Self { model: Some(model) }
    }

    /// A service whose every request fails with `ModelUnavailable`
    pub fn unavailable() -> Self {
        Self { model: None }
    }

    pub fn handle(&self, raw: &str) -> Result<Predictions, ErrorKind> {
        let rows = Payload::parse(raw)?.into_rows();
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ErrorKind::ModelUnavailable("no model loaded".to_string()))?;

        let predictions = model.predict(&rows)?;
        tracing::debug!("Predicted {} rows", predictions.len());

        Ok(Predictions {
            n_rows: predictions.len(),
            predictions,
        })
    }
}
