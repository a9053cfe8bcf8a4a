//! Reads the prediction service's response into a rain verdict with a confidence band.

use crate::config::PredictionConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Probabilities far from 50% in either direction are more confident.
    pub fn from_percent(percent: i64, config: &PredictionConfig) -> Self {
        let far = |bound: i64| percent > bound || percent < 100 - bound;
        if far(config.high_confidence_pct) {
            Confidence::High
        } else if far(config.medium_confidence_pct) {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionSummary {
    pub will_rain: bool,
    /// Probability of rain tomorrow (0.0–1.0)
    pub probability: f64,
    pub percent: i64,
    pub confidence: Confidence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_rainfall: Option<f64>,
}

pub struct PredictionInterpreter {
    config: PredictionConfig,
}

impl PredictionInterpreter {
    pub fn new(config: PredictionConfig) -> Self {
        Self { config }
    }

    /// `None` when the response carries no numeric `prediction` (or `probability`) field.
    ///
    /// `annual_fallback` is used when the service reports no non-zero
    /// `regional_info.calculated_annual_rainfall`.
    pub fn summarize(&self, response: &Value, annual_fallback: Option<f64>) -> Option<PredictionSummary> {
        let probability = response
            .get("prediction")
            .or_else(|| response.get("probability"))
            .and_then(Value::as_f64)
            .filter(|p| p.is_finite())?;
        let percent = (probability * 100.0).round() as i64;
        let annual_rainfall = response
            .pointer("/regional_info/calculated_annual_rainfall")
            .and_then(Value::as_f64)
            .filter(|v| *v != 0.0)
            .or(annual_fallback);

        Some(PredictionSummary {
            will_rain: probability > self.config.rain_threshold,
            probability,
            percent,
            confidence: Confidence::from_percent(percent, &self.config),
            annual_rainfall,
        })
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }
}
