//! Fixed lookup tables: subdivisions, months, seasons, aggregate windows, region groups.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Prefix of every one-hot region column.
pub const SUBDIVISION_PREFIX: &str = "SUBDIVISION_";

/// The 36 meteorological subdivisions, in model column order.
pub const SUBDIVISIONS: [&str; 36] = [
    "ANDAMAN & NICOBAR ISLANDS",
    "ARUNACHAL PRADESH",
    "ASSAM & MEGHALAYA",
    "BIHAR",
    "CHHATTISGARH",
    "COASTAL ANDHRA PRADESH",
    "COASTAL KARNATAKA",
    "EAST MADHYA PRADESH",
    "EAST RAJASTHAN",
    "EAST UTTAR PRADESH",
    "GANGETIC WEST BENGAL",
    "GUJARAT REGION",
    "HARYANA DELHI & CHANDIGARH",
    "HIMACHAL PRADESH",
    "JAMMU & KASHMIR",
    "JHARKHAND",
    "KERALA",
    "KONKAN & GOA",
    "LAKSHADWEEP",
    "MADHYA MAHARASHTRA",
    "MATATHWADA",
    "NAGA MANI MIZO TRIPURA",
    "NORTH INTERIOR KARNATAKA",
    "ORISSA",
    "PUNJAB",
    "RAYALSEEMA",
    "SAURASHTRA & KUTCH",
    "SOUTH INTERIOR KARNATAKA",
    "SUB HIMALAYAN WEST BENGAL & SIKKIM",
    "TAMIL NADU",
    "TELANGANA",
    "UTTARAKHAND",
    "VIDARBHA",
    "WEST MADHYA PRADESH",
    "WEST RAJASTHAN",
    "WEST UTTAR PRADESH",
];

/// Month codes in chronological order.
pub const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Season indicator columns.
pub const SEASONS: [&str; 5] = ["SPRING", "SUMMER", "MONSOON", "AUTUMN", "WINTER"];

/// A seasonal aggregate column and the months it sums.
#[derive(Debug, Clone, Copy)]
pub struct AggregateWindow {
    /// Column name sent to the model
    pub key: &'static str,
    /// Underscore spelling used by datasets and older payloads
    pub alias: &'static str,
    pub months: &'static [&'static str],
}

pub const AGGREGATE_WINDOWS: [AggregateWindow; 4] = [
    AggregateWindow {
        key: "Jan-Feb",
        alias: "Jan_Feb",
        months: &["JAN", "FEB"],
    },
    AggregateWindow {
        key: "Mar-May",
        alias: "Mar_May",
        months: &["MAR", "APR", "MAY"],
    },
    AggregateWindow {
        key: "Jun-Sep",
        alias: "Jun_Sep",
        months: &["JUN", "JUL", "AUG", "SEP"],
    },
    AggregateWindow {
        key: "Oct-Dec",
        alias: "Oct_Dec",
        months: &["OCT", "NOV", "DEC"],
    },
];

/// Column name for a canonical subdivision, e.g. `SUBDIVISION_KONKAN & GOA`.
pub fn region_column(name: &str) -> String {
    format!("{SUBDIVISION_PREFIX}{name}")
}

/// Underscore spelling of a subdivision (`KONKAN & GOA` -> `KONKAN_GOA`).
pub fn underscore_name(name: &str) -> String {
    name.split(|c: char| c == ' ' || c == '&')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn underscore_lookup() -> &'static HashMap<String, &'static str> {
    static LOOKUP: OnceLock<HashMap<String, &'static str>> = OnceLock::new();
    LOOKUP.get_or_init(|| {
        SUBDIVISIONS
            .iter()
            .map(|name| (underscore_name(name), *name))
            .collect()
    })
}

/// Resolve a user-supplied region name against the fixed list.
///
/// Tries an exact (case-insensitive, trimmed) match, then the underscore
/// spelling, then the first canonical name containing the input.
pub fn match_subdivision(raw: &str) -> Option<&'static str> {
    let wanted = raw.trim().to_uppercase();
    if wanted.is_empty() {
        return None;
    }
    if let Some(name) = SUBDIVISIONS.iter().find(|name| **name == wanted) {
        return Some(*name);
    }
    if let Some(name) = underscore_lookup().get(&wanted) {
        return Some(*name);
    }
    let spaced = wanted.replace('_', " ");
    SUBDIVISIONS
        .iter()
        .find(|name| name.contains(wanted.as_str()) || name.contains(spaced.as_str()))
        .copied()
}

/// Index of a month code (case-insensitive) in chronological order.
pub fn month_index(code: &str) -> Option<usize> {
    let code = code.trim().to_uppercase();
    MONTHS.iter().position(|m| *m == code)
}

/// Canonical season code for a case-insensitive input.
pub fn match_season(raw: &str) -> Option<&'static str> {
    let code = raw.trim().to_uppercase();
    SEASONS.iter().find(|s| **s == code).copied()
}

/// Season implied by a month when none is supplied.
pub fn season_for_month(month: &str) -> Option<&'static str> {
    let season = match month_index(month)? {
        2..=4 => "SPRING",
        5..=8 => "MONSOON",
        9 | 10 => "AUTUMN",
        _ => "WINTER",
    };
    Some(season)
}

/// Aggregate window containing the given month.
pub fn window_for_month(month: &str) -> Option<AggregateWindow> {
    let code = MONTHS[month_index(month)?];
    AGGREGATE_WINDOWS
        .into_iter()
        .find(|w| w.months.contains(&code))
}

/// Geographic grouping of subdivisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionGroup {
    North,
    Central,
    East,
    Northeast,
    West,
    South,
    Islands,
}

impl RegionGroup {
    pub const ALL: [RegionGroup; 7] = [
        RegionGroup::North,
        RegionGroup::Central,
        RegionGroup::East,
        RegionGroup::Northeast,
        RegionGroup::West,
        RegionGroup::South,
        RegionGroup::Islands,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RegionGroup::North => "North India",
            RegionGroup::Central => "Central India",
            RegionGroup::East => "East India",
            RegionGroup::Northeast => "Northeast India",
            RegionGroup::West => "West India",
            RegionGroup::South => "South India",
            RegionGroup::Islands => "Island Territories",
        }
    }

    pub fn members(self) -> &'static [&'static str] {
        match self {
            RegionGroup::North => &[
                "JAMMU & KASHMIR",
                "HIMACHAL PRADESH",
                "UTTARAKHAND",
                "PUNJAB",
                "HARYANA DELHI & CHANDIGARH",
                "WEST UTTAR PRADESH",
                "EAST UTTAR PRADESH",
            ],
            RegionGroup::Central => &[
                "EAST MADHYA PRADESH",
                "WEST MADHYA PRADESH",
                "EAST RAJASTHAN",
                "WEST RAJASTHAN",
                "CHHATTISGARH",
                "VIDARBHA",
            ],
            RegionGroup::East => &[
                "BIHAR",
                "JHARKHAND",
                "GANGETIC WEST BENGAL",
                "SUB HIMALAYAN WEST BENGAL & SIKKIM",
                "ORISSA",
            ],
            RegionGroup::Northeast => &[
                "ARUNACHAL PRADESH",
                "ASSAM & MEGHALAYA",
                "NAGA MANI MIZO TRIPURA",
            ],
            RegionGroup::West => &[
                "GUJARAT REGION",
                "SAURASHTRA & KUTCH",
                "KONKAN & GOA",
                "MADHYA MAHARASHTRA",
                "MATATHWADA",
            ],
            RegionGroup::South => &[
                "COASTAL ANDHRA PRADESH",
                "TELANGANA",
                "RAYALSEEMA",
                "TAMIL NADU",
                "COASTAL KARNATAKA",
                "NORTH INTERIOR KARNATAKA",
                "SOUTH INTERIOR KARNATAKA",
                "KERALA",
            ],
            RegionGroup::Islands => &["ANDAMAN & NICOBAR ISLANDS", "LAKSHADWEEP"],
        }
    }

    /// Group of a canonical subdivision name.
    pub fn of(subdivision: &str) -> Option<RegionGroup> {
        RegionGroup::ALL
            .into_iter()
            .find(|g| g.members().iter().any(|m| *m == subdivision))
    }
}

/// All subdivisions in column order, plus their members keyed by group label.
pub fn region_listing() -> serde_json::Value {
    let groups: serde_json::Map<String, serde_json::Value> = RegionGroup::ALL
        .iter()
        .map(|g| (g.label().to_string(), serde_json::json!(g.members())))
        .collect();
    serde_json::json!({
        "subdivisions": SUBDIVISIONS.as_slice(),
        "groups": groups
    })
}

/// Typical rainfall regime, used to pre-fill monthly figures on a new form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RainfallProfile {
    High,
    Moderate,
    Low,
}

impl RainfallProfile {
    pub fn for_subdivision(subdivision: &str) -> Self {
        match subdivision {
            "KERALA" | "COASTAL KARNATAKA" | "KONKAN & GOA" | "ASSAM & MEGHALAYA" => {
                RainfallProfile::High
            }
            "TAMIL NADU" | "COASTAL ANDHRA PRADESH" | "GANGETIC WEST BENGAL" => {
                RainfallProfile::Moderate
            }
            _ => RainfallProfile::Low,
        }
    }

    /// Default monthly rainfall (mm), JAN..DEC.
    pub fn monthly_defaults(self) -> [f64; 12] {
        match self {
            RainfallProfile::High => [
                20.5, 25.3, 40.2, 110.5, 200.3, 650.8, 850.2, 750.5, 350.2, 250.5, 150.3, 50.2,
            ],
            RainfallProfile::Moderate => [
                15.2, 20.1, 25.3, 50.2, 100.5, 150.3, 200.5, 180.2, 150.5, 200.3, 180.5, 40.2,
            ],
            RainfallProfile::Low => [
                5.2, 8.1, 10.3, 15.2, 25.5, 50.3, 80.5, 70.2, 40.5, 20.3, 10.5, 5.2,
            ],
        }
    }
}
