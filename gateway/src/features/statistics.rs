//! Derived rainfall statistics over the twelve monthly fields.

use super::sanitize::{as_number, finite_number};
use super::tables::MONTHS;
use super::Record;

pub const AVG_MONTHLY_RAINFALL: &str = "AvgMonthlyRainfall";
pub const ROLLING_3_MONTH_AVG: &str = "Rolling3MonthAvg";
pub const LAG_ANNUAL: &str = "Lag_Annual";
pub const ANNUAL: &str = "ANNUAL";

/// Monthly values JAN..DEC; absent or non-numeric months read as 0.
pub fn monthly_values(record: &Record) -> [f64; 12] {
    let mut out = [0.0; 12];
    for (slot, month) in out.iter_mut().zip(MONTHS) {
        *slot = as_number(record.get(month));
    }
    out
}

/// Mean of the wettest month and the two months before it (wrapping DEC -> JAN).
///
/// Ties resolve to the earliest month.
pub fn rolling_peak_average(months: &[f64; 12]) -> f64 {
    let mut peak = 0;
    for (i, v) in months.iter().enumerate() {
        if *v > months[peak] {
            peak = i;
        }
    }
    let window = [peak, (peak + 11) % 12, (peak + 10) % 12];
    window.iter().map(|i| months[*i]).sum::<f64>() / 3.0
}

/// Add `AvgMonthlyRainfall`, `Rolling3MonthAvg` and `Lag_Annual`.
pub fn derive_statistics(mut record: Record) -> Record {
    let months = monthly_values(&record);
    let avg = months.iter().sum::<f64>() / 12.0;
    let rolling = rolling_peak_average(&months);
    let lag = match record.get(ANNUAL) {
        Some(v) => as_number(Some(v)),
        None => 0.0,
    };

    record.insert(AVG_MONTHLY_RAINFALL.to_string(), finite_number(avg));
    record.insert(ROLLING_3_MONTH_AVG.to_string(), finite_number(rolling));
    record.insert(LAG_ANNUAL.to_string(), finite_number(lag));
    record
}
