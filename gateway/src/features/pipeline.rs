//! Transformation pipeline: raw record → sanitize → remap → derived stats → feature vector.

use super::form::RawFormInput;
use super::sanitize::{as_number, finite_number, sanitize};
use super::statistics::derive_statistics;
use super::tables::{
    match_season, match_subdivision, month_index, region_column, season_for_month,
    window_for_month, AGGREGATE_WINDOWS, MONTHS, SEASONS, SUBDIVISIONS, SUBDIVISION_PREFIX,
};
use super::{FeatureVector, Record, RAIN_TODAY, YEAR};
use crate::config::{AggregateEncoding, TransformConfig};
use serde_json::Value;
use tracing::{debug, warn};

/// Plain region-name field accepted on input.
const SUBDIVISION_FIELD: &str = "SUBDIVISION";
const SEASON_FIELD: &str = "season";
const MONTH_FIELD: &str = "month";

/// Form-style field names and the column each one fills.
const FORM_FIELDS: [(&str, &str); 3] = [
    ("year", YEAR),
    ("rainToday", RAIN_TODAY),
    ("subdivision", SUBDIVISION_FIELD),
];
const MONTHLY_RAINFALL_FIELD: &str = "monthlyRainfall";

#[derive(Debug, Clone, Default)]
pub struct FeatureTransformer {
    config: TransformConfig,
}

impl FeatureTransformer {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Turn any JSON value into a complete feature vector. Never fails; a
    /// non-object input is treated as an empty record.
    pub fn transform(&self, raw: &Value) -> FeatureVector {
        let record = match sanitize(raw) {
            Value::Object(map) => map,
            other => {
                warn!(kind = json_kind(&other), "input is not an object; using empty record");
                Record::new()
            }
        };

        let record = lift_form_fields(record);
        let record = self.encode_aggregates(record);
        let record = remap_season(record);
        let record = remap_region(record);
        let record = derive_statistics(record);
        FeatureVector::from(finalize(record))
    }

    pub fn transform_form(&self, form: &RawFormInput) -> FeatureVector {
        self.transform(&Value::Object(form.to_record()))
    }

    fn encode_aggregates(&self, record: Record) -> Record {
        let already_encoded = AGGREGATE_WINDOWS
            .iter()
            .any(|w| record.contains_key(w.key));
        match (self.config.aggregate_encoding, already_encoded) {
            (AggregateEncoding::WindowSelector, false) => {
                let month = record.get(MONTH_FIELD).and_then(Value::as_str).map(str::to_string);
                match month.as_deref().and_then(window_for_month) {
                    Some(window) => select_aggregate_window(record, window.key),
                    None => {
                        debug!("no selected month; falling back to summed aggregates");
                        remap_seasonal_aggregates(record)
                    }
                }
            }
            _ => remap_seasonal_aggregates(record),
        }
    }
}

/// Transform with the default configuration (summed aggregates).
pub fn transform(raw: &Value) -> FeatureVector {
    FeatureTransformer::default().transform(raw)
}

/// Ensure the four hyphenated aggregate columns exist.
///
/// A hyphenated column already present wins, then its underscore alias, then
/// the sum of the constituent months. Aliases never survive.
pub fn remap_seasonal_aggregates(mut record: Record) -> Record {
    for window in AGGREGATE_WINDOWS {
        let alias = record.remove(window.alias);
        if record.contains_key(window.key) {
            continue;
        }
        let value = match alias {
            Some(v) => v,
            None => {
                let sum: f64 = window.months.iter().map(|m| as_number(record.get(*m))).sum();
                finite_number(sum)
            }
        };
        record.insert(window.key.to_string(), value);
    }
    record
}

/// One-hot aggregate encoding: the window named `active` is 1, the rest 0.
fn select_aggregate_window(mut record: Record, active: &str) -> Record {
    for window in AGGREGATE_WINDOWS {
        record.remove(window.alias);
        let flag = i64::from(window.key == active);
        record.insert(window.key.to_string(), Value::from(flag));
    }
    record
}

/// One-hot season columns from a `season` code, existing indicators, or the selected month.
pub fn remap_season(mut record: Record) -> Record {
    let requested = record.remove(SEASON_FIELD);
    let from_code = requested.as_ref().and_then(Value::as_str).and_then(match_season);
    let season = from_code
        .or_else(|| {
            SEASONS
                .iter()
                .find(|s| as_number(record.get(**s)) != 0.0)
                .copied()
        })
        .or_else(|| {
            record
                .get(MONTH_FIELD)
                .and_then(Value::as_str)
                .and_then(season_for_month)
        });

    if season.is_none() {
        warn!(season = ?requested, "season unresolved; all season indicators left at 0");
    }
    for s in SEASONS {
        record.insert(s.to_string(), Value::from(i64::from(Some(s) == season)));
    }
    record
}

/// One-hot region columns over the 36 canonical subdivisions.
///
/// Unmatched names are logged and produce an all-zero encoding.
pub fn remap_region(mut record: Record) -> Record {
    let named = record
        .get(SUBDIVISION_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string);
    let selected = named
        .as_deref()
        .and_then(match_subdivision)
        .or_else(|| encoded_region(&record));

    if selected.is_none() {
        warn!(
            subdivision = named.as_deref().unwrap_or(""),
            "no matching subdivision; region indicators left at 0"
        );
    }

    let stale: Vec<String> = record
        .keys()
        .filter(|k| *k == SUBDIVISION_FIELD || k.starts_with(SUBDIVISION_PREFIX))
        .cloned()
        .collect();
    for key in stale {
        record.remove(&key);
    }
    for name in SUBDIVISIONS {
        let flag = i64::from(Some(name) == selected);
        record.insert(region_column(name), Value::from(flag));
    }
    record
}

/// Region already one-hot encoded in either spelling.
fn encoded_region(record: &Record) -> Option<&'static str> {
    let canonical = SUBDIVISIONS
        .iter()
        .find(|name| as_number(record.get(&region_column(name))) != 0.0)
        .copied();
    canonical.or_else(|| {
        record
            .iter()
            .filter(|(_, v)| as_number(Some(v)) != 0.0)
            .filter_map(|(k, _)| k.strip_prefix(SUBDIVISION_PREFIX))
            .find_map(match_subdivision)
    })
}

/// Move form-style fields (`year`, `rainToday`, `monthlyRainfall`, ...) onto model columns.
fn lift_form_fields(mut record: Record) -> Record {
    for (from, to) in FORM_FIELDS {
        if let Some(v) = record.remove(from) {
            record.entry(to).or_insert(v);
        }
    }
    if let Some(monthly) = record.remove(MONTHLY_RAINFALL_FIELD) {
        if let Value::Object(map) = monthly {
            for (month, amount) in map {
                if let Some(i) = month_index(&month) {
                    record.entry(MONTHS[i]).or_insert(amount);
                }
            }
        }
    }
    record
}

/// Fill month defaults, binarize `RainToday`, emit month selectors, drop consumed fields.
fn finalize(mut record: Record) -> Record {
    for month in MONTHS {
        let value = as_number(record.get(month));
        record.insert(month.to_string(), finite_number(value));
    }

    let year = as_number(record.get(YEAR));
    record.insert(YEAR.to_string(), Value::from(year as i64));

    let rain = rain_flag(record.get(RAIN_TODAY));
    record.insert(RAIN_TODAY.to_string(), Value::from(i64::from(rain)));

    if let Some(selected) = record
        .remove(MONTH_FIELD)
        .as_ref()
        .and_then(Value::as_str)
        .and_then(month_index)
    {
        for (i, month) in MONTHS.iter().enumerate() {
            record.insert(format!("{month}_selected"), Value::from(i64::from(i == selected)));
        }
    }

    for value in record.values_mut() {
        if value.is_null() {
            *value = Value::from(0);
        }
    }
    record
}

/// Boolean-ish rain flag: `yes`, `true`, `y` or any non-zero number.
fn rain_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "yes" | "y" | "true")
        }
        other => as_number(other) != 0.0,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
