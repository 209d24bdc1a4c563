use serde::{Deserialize, Serialize};

/// Provider-independent current conditions for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Display name of the provider that answered.
    pub source: String,
    /// Subject of the report: the requested zip or coordinate, or a provider-resolved city name.
    pub location: String,
    pub temperature_f: f64,
    /// Percent. Not clamped, so provider noise can push it slightly past 100.
    pub relative_humidity_pct: f64,
    /// Short condition summary, e.g. "light snow".
    pub notes: Option<String>,
}
