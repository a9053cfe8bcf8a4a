//! Form-to-feature transformation for the prediction service.

mod form;
mod pipeline;
mod sanitize;
mod statistics;
pub mod tables;

pub use form::RawFormInput;
pub use pipeline::{
    remap_region, remap_seasonal_aggregates, remap_season, transform, FeatureTransformer,
};
pub use sanitize::sanitize;
pub use statistics::{
    derive_statistics, monthly_values, ANNUAL, AVG_MONTHLY_RAINFALL, LAG_ANNUAL,
    ROLLING_3_MONTH_AVG,
};
pub use tables::{RainfallProfile, RegionGroup};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Loosely-typed flat record, keyed by column name.
pub type Record = serde_json::Map<String, Value>;

pub const YEAR: &str = "YEAR";
pub const RAIN_TODAY: &str = "RainToday";

/// Flat record sent to the prediction service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Record);

impl FeatureVector {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Numeric value of a field; absent or non-numeric fields read as 0.
    pub fn number(&self, key: &str) -> f64 {
        sanitize::as_number(self.0.get(key))
    }

    pub fn as_record(&self) -> &Record {
        &self.0
    }

    pub fn into_record(self) -> Record {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Subdivision whose indicator is set, if any.
    pub fn active_region(&self) -> Option<&'static str> {
        tables::SUBDIVISIONS
            .iter()
            .find(|name| self.number(&tables::region_column(name)) == 1.0)
            .copied()
    }

    /// Season whose indicator is set, if any.
    pub fn active_season(&self) -> Option<&'static str> {
        tables::SEASONS
            .iter()
            .find(|s| self.number(s) == 1.0)
            .copied()
    }
}

impl From<Record> for FeatureVector {
    fn from(record: Record) -> Self {
        Self(record)
    }
}

impl From<FeatureVector> for Value {
    fn from(fv: FeatureVector) -> Self {
        Value::Object(fv.0)
    }
}
