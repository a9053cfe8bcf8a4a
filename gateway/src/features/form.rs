//! User-facing prediction form, as posted by the front end.

use super::sanitize::{as_number, finite_number, sanitize};
use super::tables::{season_for_month, RainfallProfile, MONTHS};
use super::{Record, RAIN_TODAY, YEAR};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Plausible year range accepted by the form.
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFormInput {
    /// Numeric strings are accepted; blank, null or zero means the current year
    #[serde(default = "current_year", deserialize_with = "lenient_year")]
    pub year: i32,
    /// Month code (`JAN`..`DEC`); blank or null means the current month
    #[serde(default = "current_month", deserialize_with = "lenient_month")]
    pub month: String,
    /// Season code (`SPRING`, `SUMMER`, `MONSOON`, `AUTUMN`, `WINTER`)
    #[serde(default, deserialize_with = "lenient_text")]
    pub season: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub subdivision: String,
    /// `"yes"` / `"no"`, a boolean, or 0/1
    #[serde(default)]
    pub rain_today: Value,
    /// Month code → rainfall in millimetres. Missing markers and junk read as 0.
    #[serde(
        default,
        deserialize_with = "lenient_amounts",
        skip_serializing_if = "Option::is_none"
    )]
    pub monthly_rainfall: Option<BTreeMap<String, f64>>,
}

fn current_year() -> i32 {
    Utc::now().year()
}

fn current_month() -> String {
    MONTHS[Utc::now().month0() as usize].to_string()
}

fn lenient_year<'de, D: Deserializer<'de>>(d: D) -> Result<i32, D::Error> {
    let year = as_number(Some(&sanitize(&Value::deserialize(d)?))).round();
    if year == 0.0 || year < f64::from(i32::MIN) || year > f64::from(i32::MAX) {
        return Ok(current_year());
    }
    Ok(year as i32)
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

fn lenient_month<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let month = lenient_text(d)?;
    if month.trim().is_empty() {
        return Ok(current_month());
    }
    Ok(month)
}

fn lenient_amounts<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<BTreeMap<String, f64>>, D::Error> {
    let Value::Object(map) = Value::deserialize(d)? else {
        return Ok(None);
    };
    Ok(Some(
        map.into_iter()
            .map(|(month, amount)| (month, as_number(Some(&sanitize(&amount)))))
            .collect(),
    ))
}

impl RawFormInput {
    /// Form pre-filled for a subdivision: current year and month, the month's
    /// season, and the subdivision's typical monthly rainfall.
    pub fn template(subdivision: &str) -> Self {
        let month = current_month();
        let season = season_for_month(&month).unwrap_or("MONSOON").to_string();
        let defaults = RainfallProfile::for_subdivision(subdivision).monthly_defaults();
        let monthly = MONTHS
            .iter()
            .zip(defaults)
            .map(|(m, v)| (m.to_string(), v))
            .collect();
        Self {
            year: current_year(),
            month,
            season,
            subdivision: subdivision.to_string(),
            rain_today: Value::from("yes"),
            monthly_rainfall: Some(monthly),
        }
    }

    /// Sum of the supplied monthly figures, skipping non-finite values.
    pub fn annual_rainfall(&self) -> f64 {
        self.monthly_rainfall
            .as_ref()
            .map(|m| m.values().filter(|v| v.is_finite()).sum())
            .unwrap_or(0.0)
    }

    /// Flatten into the loose record consumed by the transformer.
    pub fn to_record(&self) -> Record {
        if !YEAR_RANGE.contains(&self.year) {
            warn!(year = self.year, "year outside plausible range");
        }

        let mut record = Record::new();
        record.insert(YEAR.to_string(), Value::from(self.year));
        record.insert(RAIN_TODAY.to_string(), self.rain_today.clone());
        record.insert("ANNUAL".to_string(), finite_number(self.annual_rainfall()));
        record.insert("month".to_string(), Value::from(self.month.clone()));
        record.insert("season".to_string(), Value::from(self.season.clone()));
        record.insert("SUBDIVISION".to_string(), Value::from(self.subdivision.clone()));

        if let Some(monthly) = &self.monthly_rainfall {
            for (month, amount) in monthly {
                record.insert(month.trim().to_uppercase(), finite_number(*amount));
            }
        }
        record
    }
}
